//! In-memory mirror of a repository subtree.
//!
//! [`DirectoryMirror`] owns a set of monitored directories and a map of
//! tracked file entries, kept current by routing change notifications to
//! directory registration or entry creation, update, and eviction.
//! [`FileBacked`] is the stock entry: cached raw content plus an index
//! derived from it through a [`ContentIndex`] hook.

mod directory;
mod entry;

pub use directory::{DirectoryMirror, EntryFactory};
pub use entry::{ContentIndex, FileBacked, KeyValueIndex, TreeEntry};
