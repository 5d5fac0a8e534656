//! Virtual to concrete path resolution
//!
//! The visible namespace has no file extensions, so `/notes` has to be
//! mapped back to whatever real file it stands for under the source root.
//! Candidates are tried in order:
//!
//! 1. `root/notes` as is
//! 2. `root/notes.txt`
//! 3. the first direct entry of `root` whose stripped name is `notes`
//!
//! If nothing matches, the step 1 candidate is returned so the following
//! storage call fails with a plain `ENOENT`. When several real files strip
//! to the same name, the first one `read_dir` yields wins; that order is
//! filesystem-defined.

use crate::error::{Error, Result};
use std::ffi::{OsStr, OsString};
use std::fs::{self, Metadata};
use std::os::unix::ffi::OsStrExt;
use std::path::{Component, Path, PathBuf};

/// Strip the final extension of a single file name.
///
/// A leading dot does not start an extension, so `.bashrc` is kept whole.
pub fn strip_extension(name: &OsStr) -> &OsStr {
    let bytes = name.as_bytes();
    match bytes.iter().rposition(|&b| b == b'.') {
        Some(dot) if dot > 0 => OsStr::from_bytes(&bytes[..dot]),
        _ => name,
    }
}

/// Directory entry of the source root
#[derive(Debug, Clone)]
pub struct SourceEntry {
    pub name: OsString,
    pub file_type: fs::FileType,
}

/// Maps virtual paths onto the source root
#[derive(Debug, Clone)]
pub struct PathResolver {
    /// Root path of the source directory
    root: PathBuf,
}

impl PathResolver {
    /// Create a resolver over an existing directory
    pub fn new(root: PathBuf) -> Result<Self> {
        if !root.is_dir() {
            return Err(Error::PathNotFound(root.to_string_lossy().to_string()));
        }
        Ok(Self { root })
    }

    /// Get the root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Join a virtual path under the root without extension guessing
    pub fn direct(&self, virtual_path: &Path) -> PathBuf {
        let relative = virtual_path.strip_prefix("/").unwrap_or(virtual_path);
        self.root.join(relative)
    }

    /// Resolve a virtual path to the concrete file it denotes
    pub fn resolve(&self, virtual_path: &Path) -> PathBuf {
        let candidate = self.direct(virtual_path);
        if exists(&candidate) || virtual_path.file_name().is_none() {
            return candidate;
        }

        let mut with_txt = OsString::from(candidate.as_os_str());
        with_txt.push(".txt");
        let with_txt = PathBuf::from(with_txt);
        if exists(&with_txt) {
            return with_txt;
        }

        if let Some(name) = single_component(virtual_path) {
            if let Some(found) = self.scan_root(name) {
                return found;
            }
        }

        candidate
    }

    /// First root entry whose stripped name equals `name`
    fn scan_root(&self, name: &OsStr) -> Option<PathBuf> {
        let entries = fs::read_dir(&self.root).ok()?;
        entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name())
            .find(|entry_name| strip_extension(entry_name) == name)
            .map(|entry_name| self.root.join(entry_name))
    }

    /// Pass-through `lstat` of the resolved path
    pub fn metadata(&self, virtual_path: &Path) -> Result<Metadata> {
        fs::symlink_metadata(self.resolve(virtual_path)).map_err(Error::Io)
    }

    /// Direct entries of the source root, in enumeration order
    pub fn read_root(&self) -> Result<Vec<SourceEntry>> {
        let mut entries = Vec::new();

        for entry in fs::read_dir(&self.root).map_err(Error::Io)? {
            let entry = entry.map_err(Error::Io)?;
            let file_type = entry.file_type().map_err(Error::Io)?;
            entries.push(SourceEntry {
                name: entry.file_name(),
                file_type,
            });
        }

        Ok(entries)
    }

    /// Read an entire concrete file
    pub fn read_all(&self, concrete_path: &Path) -> Result<Vec<u8>> {
        use std::io::Read;

        let mut file = fs::File::open(concrete_path).map_err(Error::Io)?;
        let len = file.metadata().map_err(Error::Io)?.len() as usize;

        let mut buffer = Vec::new();
        buffer.try_reserve_exact(len)?;
        file.read_to_end(&mut buffer).map_err(Error::Io)?;

        Ok(buffer)
    }
}

fn exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// The only component of a one-level virtual path such as `/notes`
fn single_component(virtual_path: &Path) -> Option<&OsStr> {
    let mut names = virtual_path.components().filter_map(|c| match c {
        Component::Normal(name) => Some(name),
        _ => None,
    });
    let first = names.next()?;
    names.next().is_none().then_some(first)
}
