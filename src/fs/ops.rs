//! Path-addressed filesystem operations
//!
//! Every verb except directory listing asks the access gate first and
//! fails with `NotFound` for a hidden path before anything touches the
//! source directory. The type is `Sync`; any verbs may run concurrently.

use nix::unistd::AccessFlags;
use std::ffi::OsString;
use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use super::{
    gate::AccessGate,
    handle::{HandleTable, OpenFile},
    inode::EntryKind,
    resolver::{strip_extension, PathResolver},
};
use crate::audit::{AuditAction, AuditLog};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::transform::ContentTransformer;

/// Entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Name with one extension stripped
    pub name: OsString,
    pub kind: EntryKind,
}

/// The overlay's virtual filesystem verbs
pub struct LawakFs {
    resolver: PathResolver,
    gate: AccessGate,
    transformer: ContentTransformer,
    audit: AuditLog,
    handles: HandleTable,
}

impl LawakFs {
    /// Build the overlay from a loaded configuration
    pub fn new(config: Config) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: Config, clock: Arc<dyn Clock>) -> Result<Self> {
        let audit = AuditLog::with_clock(config.log_path.clone(), Arc::clone(&clock));
        Self::with_parts(config, clock, audit)
    }

    /// Build with an explicit clock and audit log
    pub fn with_parts(config: Config, clock: Arc<dyn Clock>, audit: AuditLog) -> Result<Self> {
        let resolver = PathResolver::new(config.source_root)?;
        let gate = AccessGate::with_clock(config.secret_basename, config.access_window, clock);

        Ok(Self {
            resolver,
            gate,
            transformer: ContentTransformer::from_words(&config.filter_words),
            audit,
            handles: HandleTable::new(),
        })
    }

    pub fn source_root(&self) -> &Path {
        self.resolver.root()
    }

    /// `NotFound` if `path` is gated
    fn ensure_visible(&self, path: &Path) -> Result<()> {
        if self.gate.is_hidden(path) {
            debug!("{:?} is hidden outside its access window", path);
            return Err(Error::NotFound(path.to_string_lossy().to_string()));
        }
        Ok(())
    }

    fn resolve_visible(&self, path: &Path) -> Result<PathBuf> {
        self.ensure_visible(path)?;
        Ok(self.resolver.resolve(path))
    }

    /// Pass-through `lstat` of the file behind `path`
    pub fn get_attributes(&self, path: &Path) -> Result<Metadata> {
        self.ensure_visible(path)?;
        self.resolver.metadata(path)
    }

    /// Entries of the source root with extensions stripped.
    ///
    /// The namespace is flat: whatever `path` is, the source root is
    /// listed. Not gated. Colliding names are listed once per real entry.
    pub fn list_directory(&self, path: &Path) -> Result<Vec<DirEntry>> {
        debug!("listing source root for {:?}", path);
        let entries = self
            .resolver
            .read_root()?
            .into_iter()
            .map(|entry| DirEntry {
                name: strip_extension(&entry.name).to_os_string(),
                kind: EntryKind::from(entry.file_type),
            })
            .collect();
        Ok(entries)
    }

    /// Probe the file behind `path` for reading and return a handle
    pub fn open(&self, path: &Path) -> Result<u64> {
        let concrete = self.resolve_visible(path)?;
        fs::File::open(&concrete).map_err(Error::Io)?;
        Ok(self.handles.open(path.to_path_buf(), concrete))
    }

    /// `access(2)` on the file behind `path`, audited on success
    pub fn check_access(&self, path: &Path, mask: i32, caller: u32) -> Result<()> {
        let concrete = self.resolve_visible(path)?;

        nix::unistd::access(&concrete, AccessFlags::from_bits_truncate(mask)).map_err(|errno| {
            match errno {
                nix::errno::Errno::EACCES => {
                    Error::PermissionDenied(path.to_string_lossy().to_string())
                }
                nix::errno::Errno::ENOENT => Error::NotFound(path.to_string_lossy().to_string()),
                other => Error::Io(other.into()),
            }
        })?;

        self.audit.record(AuditAction::Access, path, caller);
        Ok(())
    }

    /// Read up to `size` bytes of the transformed content at `offset`.
    ///
    /// With a live handle the transformed content is computed once and
    /// reused, so consecutive reads reassemble the same stream a single
    /// large read would return.
    pub fn read(
        &self,
        path: &Path,
        fh: Option<u64>,
        offset: u64,
        size: u32,
        caller: u32,
    ) -> Result<Vec<u8>> {
        if self.gate.is_hidden(path) {
            return Err(Error::NotFound(path.to_string_lossy().to_string()));
        }

        let content: Arc<[u8]> = match fh.and_then(|fh| self.handles.get(fh)) {
            Some(file) => file.content_or_load(|file| self.load(file))?,
            None => {
                let file = OpenFile::new(0, path.to_path_buf(), self.resolver.resolve(path));
                self.load(&file)?.into()
            }
        };

        let data = slice_at(&content, offset, size as usize).to_vec();
        self.audit.record(AuditAction::Read, path, caller);
        Ok(data)
    }

    /// Drop an open handle and its cached content
    pub fn release(&self, fh: u64) {
        self.handles.close(fh);
    }

    pub fn open_handles(&self) -> usize {
        self.handles.len()
    }

    fn load(&self, file: &OpenFile) -> Result<Vec<u8>> {
        let raw = self.resolver.read_all(&file.concrete_path)?;
        self.transformer.apply(file.transform, &raw)
    }
}

fn slice_at(content: &[u8], offset: u64, size: usize) -> &[u8] {
    let start = usize::try_from(offset).unwrap_or(usize::MAX).min(content.len());
    let end = start.saturating_add(size).min(content.len());
    &content[start..end]
}
