//! Audit trail of read and access checks
//!
//! One human-readable line per event:
//! `[YYYY-MM-DD HH:MM:SS] [uid] [ACTION] /virtual/path`.
//! Appends are serialized so concurrent FUSE workers never interleave
//! partial lines. Logging is best-effort: a failure to open or append is
//! swallowed and never reaches the filesystem caller.

use parking_lot::Mutex;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::clock::{Clock, SystemClock};

/// Default audit log location
pub const DEFAULT_LOG_PATH: &str = "/var/log/lawakfs.log";

/// Audited operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    Access,
    Read,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Access => "ACCESS",
            AuditAction::Read => "READ",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append-only audit log
pub struct AuditLog {
    /// Log file, `None` when auditing is disabled
    path: Option<PathBuf>,
    clock: Arc<dyn Clock>,
    /// Held for the whole open-append-close sequence
    writer: Mutex<()>,
}

impl AuditLog {
    /// Audit log appending to `path`, timestamped with local time
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_clock(path, Arc::new(SystemClock))
    }

    pub fn with_clock(path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            path: Some(path.into()),
            clock,
            writer: Mutex::new(()),
        }
    }

    /// Audit log that drops every record
    pub fn disabled() -> Self {
        Self {
            path: None,
            clock: Arc::new(SystemClock),
            writer: Mutex::new(()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Format a single record line, newline included
    pub fn format_line(&self, action: AuditAction, virtual_path: &Path, caller: u32) -> String {
        format!(
            "[{}] [{}] [{}] {}\n",
            self.clock.now().format("%Y-%m-%d %H:%M:%S"),
            caller,
            action,
            virtual_path.display()
        )
    }

    /// Append one record. Errors are ignored.
    pub fn record(&self, action: AuditAction, virtual_path: &Path, caller: u32) {
        let Some(path) = self.path.as_deref() else {
            return;
        };

        let line = self.format_line(action, virtual_path, caller);

        let _guard = self.writer.lock();
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut file| file.write_all(line.as_bytes()));

        if let Err(e) = result {
            debug!("audit append to {:?} failed: {}", path, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn fixed_clock() -> Arc<dyn Clock> {
        let at = NaiveDate::from_ymd_opt(2024, 3, 7)
            .unwrap()
            .and_hms_opt(9, 5, 42)
            .unwrap();
        Arc::new(FixedClock(at))
    }

    #[test]
    fn test_line_format() {
        let log = AuditLog::with_clock("/unused", fixed_clock());
        let line = log.format_line(AuditAction::Read, Path::new("/notes"), 1000);
        assert_eq!(line, "[2024-03-07 09:05:42] [1000] [READ] /notes\n");
    }

    #[test]
    fn test_record_appends() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.log");
        let log = AuditLog::with_clock(&path, fixed_clock());

        log.record(AuditAction::Access, Path::new("/diary"), 0);
        log.record(AuditAction::Read, Path::new("/diary"), 0);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "[2024-03-07 09:05:42] [0] [ACCESS] /diary\n\
             [2024-03-07 09:05:42] [0] [READ] /diary\n"
        );
    }

    #[test]
    fn test_unwritable_log_is_ignored() {
        let dir = tempdir().unwrap();
        let log = AuditLog::new(dir.path().join("missing").join("audit.log"));
        // Must not panic or surface an error
        log.record(AuditAction::Read, Path::new("/notes"), 1);
    }

    #[test]
    fn test_disabled_log_records_nothing() {
        let log = AuditLog::disabled();
        assert!(log.path().is_none());
        log.record(AuditAction::Read, Path::new("/notes"), 1);
    }

    #[test]
    fn test_concurrent_records_do_not_interleave() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.log");
        let log = AuditLog::with_clock(&path, fixed_clock());
        let long_name = format!("/{}", "x".repeat(512));

        std::thread::scope(|s| {
            for uid in 0..8u32 {
                let log = &log;
                let name = long_name.clone();
                s.spawn(move || {
                    for _ in 0..50 {
                        log.record(AuditAction::Read, Path::new(&name), uid);
                    }
                });
            }
        });

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 8 * 50);
        for line in lines {
            assert!(line.starts_with("[2024-03-07 09:05:42] ["));
            assert!(line.ends_with(&format!("[READ] {}", long_name)));
        }
    }
}
