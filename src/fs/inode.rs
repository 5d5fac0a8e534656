//! Inode management for the FUSE adapter
//!
//! The kernel addresses files by inode number while the overlay works on
//! virtual paths. Numbers are handed out on first sight of a path and are
//! never reused for the life of the mount.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs::{FileType, Metadata};
use std::os::unix::fs::{FileTypeExt, MetadataExt};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

/// Inode number of the mount root
pub const ROOT_INO: u64 = 1;

/// Kernel file-type classification of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    RegularFile,
    Directory,
    Symlink,
    BlockDevice,
    CharDevice,
    Fifo,
    Socket,
}

impl From<FileType> for EntryKind {
    fn from(ft: FileType) -> Self {
        if ft.is_dir() {
            EntryKind::Directory
        } else if ft.is_symlink() {
            EntryKind::Symlink
        } else if ft.is_block_device() {
            EntryKind::BlockDevice
        } else if ft.is_char_device() {
            EntryKind::CharDevice
        } else if ft.is_fifo() {
            EntryKind::Fifo
        } else if ft.is_socket() {
            EntryKind::Socket
        } else {
            EntryKind::RegularFile
        }
    }
}

impl EntryKind {
    pub fn to_fuser_type(&self) -> fuser::FileType {
        match self {
            EntryKind::RegularFile => fuser::FileType::RegularFile,
            EntryKind::Directory => fuser::FileType::Directory,
            EntryKind::Symlink => fuser::FileType::Symlink,
            EntryKind::BlockDevice => fuser::FileType::BlockDevice,
            EntryKind::CharDevice => fuser::FileType::CharDevice,
            EntryKind::Fifo => fuser::FileType::NamedPipe,
            EntryKind::Socket => fuser::FileType::Socket,
        }
    }
}

/// Pass-through attributes of a concrete file
#[derive(Debug, Clone)]
pub struct FileAttributes {
    pub kind: EntryKind,
    pub size: u64,
    pub blocks: u64,
    pub atime: SystemTime,
    pub mtime: SystemTime,
    pub ctime: SystemTime,
    pub crtime: SystemTime,
    pub perm: u16,
    pub nlink: u32,
    pub uid: u32,
    pub gid: u32,
    pub rdev: u32,
    pub blksize: u32,
}

impl FileAttributes {
    pub fn from_metadata(meta: &Metadata) -> Self {
        Self {
            kind: EntryKind::from(meta.file_type()),
            size: meta.len(),
            blocks: meta.blocks(),
            atime: meta.accessed().unwrap_or(SystemTime::UNIX_EPOCH),
            mtime: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            ctime: SystemTime::UNIX_EPOCH + Duration::from_secs(meta.ctime().max(0) as u64),
            crtime: meta.created().unwrap_or(SystemTime::UNIX_EPOCH),
            perm: (meta.mode() & 0o7777) as u16,
            nlink: meta.nlink() as u32,
            uid: meta.uid(),
            gid: meta.gid(),
            rdev: meta.rdev() as u32,
            blksize: meta.blksize() as u32,
        }
    }

    /// Convert to fuser FileAttr under the virtual inode number
    pub fn to_fuser_attr(&self, ino: u64) -> fuser::FileAttr {
        fuser::FileAttr {
            ino,
            size: self.size,
            blocks: self.blocks,
            atime: self.atime,
            mtime: self.mtime,
            ctime: self.ctime,
            crtime: self.crtime,
            kind: self.kind.to_fuser_type(),
            perm: self.perm,
            nlink: self.nlink,
            uid: self.uid,
            gid: self.gid,
            rdev: self.rdev,
            blksize: self.blksize,
            flags: 0,
        }
    }
}

/// Maps inode numbers to virtual paths and back
///
/// Only grows: `forget` is not handled, so every path seen by `lookup` or
/// `readdir` stays mapped until unmount. The namespace is the flat source
/// root, which bounds the table by the number of names it ever held.
pub struct InodeTable {
    /// Next virtual inode number
    next_ino: AtomicU64,
    /// Virtual ino -> virtual path
    paths: RwLock<HashMap<u64, PathBuf>>,
    /// Virtual path -> virtual ino
    inodes: RwLock<HashMap<PathBuf, u64>>,
}

impl InodeTable {
    pub fn new() -> Self {
        let table = Self {
            next_ino: AtomicU64::new(ROOT_INO + 1),
            paths: RwLock::new(HashMap::new()),
            inodes: RwLock::new(HashMap::new()),
        };

        table.paths.write().insert(ROOT_INO, PathBuf::from("/"));
        table.inodes.write().insert(PathBuf::from("/"), ROOT_INO);

        table
    }

    /// Virtual path of an inode
    pub fn path(&self, ino: u64) -> Option<PathBuf> {
        self.paths.read().get(&ino).cloned()
    }

    /// Inode of a virtual path, allocated if unseen
    pub fn ino_for(&self, path: &Path) -> u64 {
        if let Some(&ino) = self.inodes.read().get(path) {
            return ino;
        }

        let mut inodes = self.inodes.write();
        // Another thread may have inserted between the two locks
        if let Some(&ino) = inodes.get(path) {
            return ino;
        }

        let ino = self.next_ino.fetch_add(1, Ordering::SeqCst);
        inodes.insert(path.to_path_buf(), ino);
        self.paths.write().insert(ino, path.to_path_buf());
        ino
    }

    /// Virtual path of `name` inside the directory `parent`
    pub fn child_path(&self, parent: u64, name: &std::ffi::OsStr) -> Option<PathBuf> {
        Some(self.path(parent)?.join(name))
    }

    pub fn len(&self) -> usize {
        self.paths.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.read().is_empty()
    }
}

impl Default for InodeTable {
    fn default() -> Self {
        Self::new()
    }
}
