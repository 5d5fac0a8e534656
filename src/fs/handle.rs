//! Open file tracking
//!
//! Reads address the transformed stream, whose length differs from the
//! real file. Each open file therefore keeps the fully transformed content,
//! built on first read and dropped on release, and every read is a slice
//! of it.

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::Result;
use crate::transform::Transform;

/// State of one `open` call
pub struct OpenFile {
    /// File handle ID
    pub fh: u64,
    /// Path as seen by the caller
    pub virtual_path: PathBuf,
    /// Real file under the source root
    pub concrete_path: PathBuf,
    /// Rewrite applied to the content
    pub transform: Transform,
    /// Transformed content, populated on first read
    content: Mutex<Option<Arc<[u8]>>>,
}

impl OpenFile {
    pub fn new(fh: u64, virtual_path: PathBuf, concrete_path: PathBuf) -> Self {
        let transform = Transform::for_path(&concrete_path);
        Self {
            fh,
            virtual_path,
            concrete_path,
            transform,
            content: Mutex::new(None),
        }
    }

    /// Transformed content, running `load` only if nothing is cached yet
    pub fn content_or_load<F>(&self, load: F) -> Result<Arc<[u8]>>
    where
        F: FnOnce(&OpenFile) -> Result<Vec<u8>>,
    {
        let mut content = self.content.lock();
        if let Some(cached) = content.as_ref() {
            return Ok(Arc::clone(cached));
        }

        let loaded: Arc<[u8]> = load(self)?.into();
        *content = Some(Arc::clone(&loaded));
        Ok(loaded)
    }

    pub fn is_loaded(&self) -> bool {
        self.content.lock().is_some()
    }
}

/// Manages open file handles
pub struct HandleTable {
    next_fh: AtomicU64,
    handles: RwLock<HashMap<u64, Arc<OpenFile>>>,
}

impl HandleTable {
    pub fn new() -> Self {
        Self {
            next_fh: AtomicU64::new(1),
            handles: RwLock::new(HashMap::new()),
        }
    }

    /// Register an open file and return its handle
    pub fn open(&self, virtual_path: PathBuf, concrete_path: PathBuf) -> u64 {
        let fh = self.next_fh.fetch_add(1, Ordering::SeqCst);
        let file = OpenFile::new(fh, virtual_path, concrete_path);
        self.handles.write().insert(fh, Arc::new(file));
        fh
    }

    /// Get handle by ID
    pub fn get(&self, fh: u64) -> Option<Arc<OpenFile>> {
        self.handles.read().get(&fh).cloned()
    }

    /// Close handle and return it
    pub fn close(&self, fh: u64) -> Option<Arc<OpenFile>> {
        self.handles.write().remove(&fh)
    }

    /// Number of open handles
    pub fn len(&self) -> usize {
        self.handles.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.read().is_empty()
    }
}

impl Default for HandleTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_open_and_close() {
        let table = HandleTable::new();

        let fh1 = table.open("/notes".into(), "/src/notes.txt".into());
        let fh2 = table.open("/photo".into(), "/src/photo.png".into());
        assert_ne!(fh1, fh2);
        assert_eq!(table.len(), 2);

        let notes = table.get(fh1).unwrap();
        assert_eq!(notes.transform, Transform::TextFilter);
        assert_eq!(table.get(fh2).unwrap().transform, Transform::BinaryEncode);

        assert!(table.close(fh1).is_some());
        assert!(table.get(fh1).is_none());
        assert!(table.close(fh1).is_none());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_content_loaded_once() {
        let file = OpenFile::new(1, "/notes".into(), "/src/notes.txt".into());
        let loads = AtomicUsize::new(0);
        let load = |_: &OpenFile| {
            loads.fetch_add(1, Ordering::SeqCst);
            Ok(b"cached".to_vec())
        };

        assert!(!file.is_loaded());
        assert_eq!(&*file.content_or_load(load).unwrap(), b"cached");
        assert_eq!(&*file.content_or_load(load).unwrap(), b"cached");
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(file.is_loaded());
    }

    #[test]
    fn test_failed_load_is_not_cached() {
        let file = OpenFile::new(1, "/notes".into(), "/src/notes.txt".into());

        let err = file.content_or_load(|_| Err(crate::error::Error::OutOfMemory));
        assert!(err.is_err());
        assert!(!file.is_loaded());

        assert_eq!(&*file.content_or_load(|_| Ok(vec![1])).unwrap(), [1]);
    }
}
