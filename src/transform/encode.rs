//! Base64 encoding for binary content
//!
//! Standard alphabet, `=` padded to a multiple of four characters.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::{Error, Result};

/// Encoded length of `len` raw bytes
pub fn encoded_len(len: usize) -> usize {
    len.div_ceil(3) * 4
}

/// Encode raw bytes as printable base64 text
pub fn encode(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    out.try_reserve_exact(encoded_len(data.len()))?;
    out.resize(encoded_len(data.len()), 0);

    let written = STANDARD
        .encode_slice(data, &mut out)
        .map_err(|e| Error::Internal(format!("base64 encode failed: {}", e)))?;
    out.truncate(written);

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_three_bytes() {
        assert_eq!(encode(&[0x01, 0x02, 0x03]).unwrap(), b"AQID");
    }

    #[test]
    fn test_padding() {
        assert_eq!(encode(&[0x01]).unwrap(), b"AQ==");
        assert_eq!(encode(&[0x01, 0x02]).unwrap(), b"AQI=");
        assert_eq!(encode(&[]).unwrap(), b"");
    }

    #[test]
    fn test_decodes_to_original() {
        let data: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        let encoded = encode(&data).unwrap();

        assert_eq!(encoded.len(), encoded_len(data.len()));
        assert_eq!(encoded.len() % 4, 0);
        assert!(encoded.iter().all(|b| b.is_ascii_graphic()));
        assert_eq!(STANDARD.decode(&encoded).unwrap(), data);
    }
}
