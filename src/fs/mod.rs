//! Disguising overlay filesystem
//!
//! Presents the source directory with extensions stripped, content
//! rewritten and the secret file hidden outside its access window.

mod filesystem;
mod gate;
mod handle;
mod inode;
mod ops;
mod resolver;

pub use filesystem::LawakFuse;
pub use gate::AccessGate;
pub use handle::{HandleTable, OpenFile};
pub use inode::{EntryKind, FileAttributes, InodeTable, ROOT_INO};
pub use ops::{DirEntry, LawakFs};
pub use resolver::{strip_extension, PathResolver, SourceEntry};
