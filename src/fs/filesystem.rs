//! FUSE binding for the overlay
//!
//! Translates inode-addressed kernel requests into the path-addressed
//! verbs of [`LawakFs`].

use fuser::{
    consts::FOPEN_DIRECT_IO, Filesystem, ReplyAttr, ReplyData, ReplyDirectory, ReplyEmpty,
    ReplyEntry, ReplyOpen, Request,
};
use libc::{EINVAL, ENOENT, EROFS};
use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error};

use super::{
    inode::{FileAttributes, InodeTable},
    LawakFs,
};
use crate::error::{Error, Result};

/// Attribute and entry cache lifetime. Kept short so the secret file
/// disappears promptly when its window closes.
const TTL: Duration = Duration::from_secs(1);

/// `fuser::Filesystem` over a [`LawakFs`]
pub struct LawakFuse {
    fs: LawakFs,
    inodes: InodeTable,
}

impl LawakFuse {
    pub fn new(fs: LawakFs) -> Self {
        Self {
            fs,
            inodes: InodeTable::new(),
        }
    }

    pub fn inner(&self) -> &LawakFs {
        &self.fs
    }

    /// Attributes of `path` under inode `ino`
    fn attr(&self, ino: u64, path: &Path) -> Result<fuser::FileAttr> {
        let meta = self.fs.get_attributes(path)?;
        Ok(FileAttributes::from_metadata(&meta).to_fuser_attr(ino))
    }

    /// Resolve `lookup(parent, name)` to an inode and its attributes
    fn lookup_entry(&self, parent: u64, name: &OsStr) -> Result<fuser::FileAttr> {
        let path = self
            .inodes
            .child_path(parent, name)
            .ok_or_else(|| Error::NotFound(format!("inode {}", parent)))?;
        let meta = self.fs.get_attributes(&path)?;
        let ino = self.inodes.ino_for(&path);
        Ok(FileAttributes::from_metadata(&meta).to_fuser_attr(ino))
    }
}

impl Filesystem for LawakFuse {
    fn lookup(&mut self, _req: &Request, parent: u64, name: &OsStr, reply: ReplyEntry) {
        debug!("lookup(parent={}, name={:?})", parent, name);

        match self.lookup_entry(parent, name) {
            Ok(attr) => reply.entry(&TTL, &attr, 0),
            Err(e) => reply.error(e.errno()),
        }
    }

    fn getattr(&mut self, _req: &Request, ino: u64, reply: ReplyAttr) {
        debug!("getattr(ino={})", ino);

        let Some(path) = self.inodes.path(ino) else {
            reply.error(ENOENT);
            return;
        };

        match self.attr(ino, &path) {
            Ok(attr) => reply.attr(&TTL, &attr),
            Err(e) => reply.error(e.errno()),
        }
    }

    fn readdir(
        &mut self,
        _req: &Request,
        ino: u64,
        _fh: u64,
        offset: i64,
        mut reply: ReplyDirectory,
    ) {
        debug!("readdir(ino={}, offset={})", ino, offset);

        let Some(dir_path) = self.inodes.path(ino) else {
            reply.error(ENOENT);
            return;
        };

        let entries = match self.fs.list_directory(&dir_path) {
            Ok(entries) => entries,
            Err(e) => {
                reply.error(e.errno());
                return;
            }
        };

        let skip = usize::try_from(offset).unwrap_or(0);
        for (i, entry) in entries.iter().enumerate().skip(skip) {
            let child_ino = self.inodes.ino_for(&dir_path.join(&entry.name));
            let buffer_full = reply.add(
                child_ino,
                (i + 1) as i64,
                entry.kind.to_fuser_type(),
                &entry.name,
            );
            if buffer_full {
                break;
            }
        }

        reply.ok();
    }

    fn open(&mut self, _req: &Request, ino: u64, flags: i32, reply: ReplyOpen) {
        debug!("open(ino={}, flags={})", ino, flags);

        let accmode = flags & libc::O_ACCMODE;
        if accmode == libc::O_WRONLY || accmode == libc::O_RDWR {
            reply.error(EROFS);
            return;
        }

        let Some(path) = self.inodes.path(ino) else {
            reply.error(ENOENT);
            return;
        };

        // Direct I/O: the kernel must read to EOF of the transformed
        // stream instead of stopping at the raw st_size
        match self.fs.open(&path) {
            Ok(fh) => reply.opened(fh, FOPEN_DIRECT_IO),
            Err(e) => reply.error(e.errno()),
        }
    }

    fn read(
        &mut self,
        req: &Request,
        ino: u64,
        fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        debug!("read(ino={}, fh={}, offset={}, size={})", ino, fh, offset, size);

        let Ok(offset) = u64::try_from(offset) else {
            reply.error(EINVAL);
            return;
        };

        let Some(path) = self.inodes.path(ino) else {
            reply.error(ENOENT);
            return;
        };

        match self.fs.read(&path, Some(fh), offset, size, req.uid()) {
            Ok(data) => reply.data(&data),
            Err(e) => {
                if !matches!(e, Error::NotFound(_)) {
                    error!("Failed to read {:?}: {}", path, e);
                }
                reply.error(e.errno());
            }
        }
    }

    fn release(
        &mut self,
        _req: &Request,
        ino: u64,
        fh: u64,
        _flags: i32,
        _lock_owner: Option<u64>,
        _flush: bool,
        reply: ReplyEmpty,
    ) {
        debug!("release(ino={}, fh={})", ino, fh);
        self.fs.release(fh);
        reply.ok();
    }

    fn access(&mut self, req: &Request, ino: u64, mask: i32, reply: ReplyEmpty) {
        debug!("access(ino={}, mask={})", ino, mask);

        let Some(path) = self.inodes.path(ino) else {
            reply.error(ENOENT);
            return;
        };

        match self.fs.check_access(&path, mask, req.uid()) {
            Ok(()) => reply.ok(),
            Err(e) => reply.error(e.errno()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditLog;
    use crate::clock::FixedClock;
    use crate::config::{AccessWindow, Config};
    use crate::fs::inode::ROOT_INO;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn adapter_at(hour: u32, dir: &Path) -> LawakFuse {
        let config = Config {
            secret_basename: "diary".to_string(),
            access_window: AccessWindow::new(9, 17),
            source_root: dir.to_path_buf(),
            ..Config::default()
        };
        let fs = LawakFs::with_parts(config, Arc::new(FixedClock::at_hour(hour)), AuditLog::disabled())
            .unwrap();
        LawakFuse::new(fs)
    }

    #[test]
    fn test_lookup_assigns_stable_inodes() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"hello").unwrap();
        let adapter = adapter_at(12, dir.path());

        let attr = adapter.lookup_entry(ROOT_INO, OsStr::new("notes")).unwrap();
        assert_ne!(attr.ino, ROOT_INO);
        assert_eq!(attr.size, 5);
        assert_eq!(attr.kind, fuser::FileType::RegularFile);

        let again = adapter.lookup_entry(ROOT_INO, OsStr::new("notes")).unwrap();
        assert_eq!(again.ino, attr.ino);
        assert_eq!(adapter.inodes.path(attr.ino).unwrap(), Path::new("/notes"));
    }

    #[test]
    fn test_lookup_of_hidden_file_fails_with_enoent() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("diary.txt"), b"secret").unwrap();

        let err = adapter_at(20, dir.path())
            .lookup_entry(ROOT_INO, OsStr::new("diary"))
            .unwrap_err();
        assert_eq!(err.errno(), ENOENT);

        assert!(adapter_at(10, dir.path())
            .lookup_entry(ROOT_INO, OsStr::new("diary"))
            .is_ok());
    }

    #[test]
    fn test_lookup_under_unknown_parent() {
        let dir = tempdir().unwrap();
        let err = adapter_at(12, dir.path())
            .lookup_entry(99, OsStr::new("notes"))
            .unwrap_err();
        assert_eq!(err.errno(), ENOENT);
    }

    #[test]
    fn test_root_attr() {
        let dir = tempdir().unwrap();
        let adapter = adapter_at(12, dir.path());
        let attr = adapter.attr(ROOT_INO, Path::new("/")).unwrap();
        assert_eq!(attr.ino, ROOT_INO);
        assert_eq!(attr.kind, fuser::FileType::Directory);
        assert!(adapter.inner().list_directory(Path::new("/")).unwrap().is_empty());
    }
}
