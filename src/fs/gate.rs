//! Time-of-day gating of the secret file
//!
//! Outside its window the secret file reports `ENOENT` from every
//! path-addressed operation, so callers cannot tell it apart from a
//! missing file. Directory listings are not gated.

use std::ffi::OsString;
use std::path::Path;
use std::sync::Arc;

use super::resolver::strip_extension;
use crate::clock::{Clock, SystemClock};
use crate::config::AccessWindow;

/// Decides whether a virtual path is currently visible
pub struct AccessGate {
    /// Extension-less basename of the secret file; empty disables gating
    secret: OsString,
    window: AccessWindow,
    clock: Arc<dyn Clock>,
}

impl AccessGate {
    pub fn new(secret: impl Into<OsString>, window: AccessWindow) -> Self {
        Self::with_clock(secret, window, Arc::new(SystemClock))
    }

    pub fn with_clock(
        secret: impl Into<OsString>,
        window: AccessWindow,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            secret: secret.into(),
            window,
            clock,
        }
    }

    /// Does `virtual_path` name the secret file
    pub fn is_secret(&self, virtual_path: &Path) -> bool {
        if self.secret.is_empty() {
            return false;
        }
        virtual_path
            .file_name()
            .map_or(false, |name| strip_extension(name) == self.secret.as_os_str())
    }

    /// Is `virtual_path` hidden right now
    pub fn is_hidden(&self, virtual_path: &Path) -> bool {
        self.is_secret(virtual_path) && !self.window.contains(self.clock.hour())
    }
}
