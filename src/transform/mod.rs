//! Content transformation
//!
//! Bytes read from a concrete file are rewritten before they reach the
//! caller. The rewrite is picked once per file from its real extension:
//! `.txt` content is censored, everything else is base64 encoded so the
//! caller only ever sees printable text.

mod encode;
mod filter;

pub use encode::{encode, encoded_len};
pub use filter::{collides_with_token, WordFilter};

use std::ffi::OsStr;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use crate::error::Result;

/// Literal substituted for every censored word
pub const REPLACEMENT_TOKEN: &str = "lawak";

/// Rewrite applied to a file's content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Censor filter words
    TextFilter,
    /// Base64 encode raw bytes
    BinaryEncode,
}

impl Transform {
    /// Choose the transform for a concrete path
    ///
    /// The extension is whatever follows the last dot of the file name,
    /// a leading dot included, so a file named `.txt` is text.
    pub fn for_path(path: &Path) -> Self {
        let name = path.file_name().map(OsStr::as_bytes).unwrap_or_default();
        match name.iter().rposition(|&b| b == b'.') {
            Some(dot) if name[dot + 1..].eq_ignore_ascii_case(b"txt") => Transform::TextFilter,
            _ => Transform::BinaryEncode,
        }
    }
}

/// Stateless content rewriter
#[derive(Debug, Clone, Default)]
pub struct ContentTransformer {
    filter: WordFilter,
}

impl ContentTransformer {
    pub fn new(filter: WordFilter) -> Self {
        Self { filter }
    }

    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(WordFilter::new(words))
    }

    /// Rewrite `raw` with the given transform
    pub fn apply(&self, transform: Transform, raw: &[u8]) -> Result<Vec<u8>> {
        match transform {
            Transform::TextFilter => self.filter.apply(raw),
            Transform::BinaryEncode => encode(raw),
        }
    }

    /// Rewrite `raw` according to the extension of `concrete_path`
    pub fn transform(&self, raw: &[u8], concrete_path: &Path) -> Result<Vec<u8>> {
        self.apply(Transform::for_path(concrete_path), raw)
    }
}
