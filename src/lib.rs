//! lawakfs - read-only FUSE overlay that disguises a directory
//!
//! File extensions are hidden, `.txt` content is censored, every other
//! file is served base64 encoded, one secret file only exists during a
//! configured hour window, and reads and access checks are audited.

pub mod audit;
pub mod clock;
pub mod config;
pub mod error;
pub mod fs;
pub mod transform;

pub use config::Config;
pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{AccessWindow, Config};
    pub use crate::error::{Error, Result};
    pub use crate::fs::{LawakFs, LawakFuse};
}
