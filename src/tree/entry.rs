//! File-tracking entries.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::monitor::{Classification, FileMonitor, MonitorEvent};
use crate::Result;

/// Contract for one tracked file.
///
/// Entries are exclusively owned by the [`super::DirectoryMirror`] that
/// created them and see every notification the engine routes their way.
pub trait TreeEntry: Send {
    /// React to a change notification for this entry's path.
    ///
    /// # Errors
    ///
    /// Returns an error if reacting to the event fails; the owning engine
    /// logs and absorbs it.
    fn handle_event(&mut self, event: &MonitorEvent) -> Result<()>;
}

/// Index derived from a file's raw content.
///
/// Rebuilt from scratch on every successful read, even when the content is
/// byte-identical to the previous read.
pub trait ContentIndex: Default + Send {
    /// Rebuild the index from new content.
    ///
    /// # Errors
    ///
    /// Returns an error if the content cannot be indexed.
    fn rebuild(&mut self, content: &str) -> Result<()>;
}

/// Trivial index for entries that only need cached content.
impl ContentIndex for () {
    fn rebuild(&mut self, _content: &str) -> Result<()> {
        Ok(())
    }
}

/// Stock entry: one file's cached content plus a derived index.
pub struct FileBacked<I: ContentIndex = ()> {
    path: PathBuf,
    monitor: Arc<dyn FileMonitor>,
    data: Option<String>,
    index: I,
}

impl<I: ContentIndex> FileBacked<I> {
    /// Create an entry for the file at `path`.
    ///
    /// Content stays absent until the first notification triggers a read.
    #[must_use]
    pub fn new(path: PathBuf, monitor: Arc<dyn FileMonitor>) -> Self {
        Self {
            path,
            monitor,
            data: None,
            index: I::default(),
        }
    }

    /// Absolute path of the tracked file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Monitor service reference, for entries that register nested watches.
    #[must_use]
    pub fn monitor(&self) -> &Arc<dyn FileMonitor> {
        &self.monitor
    }

    /// Cached raw content from the most recent successful read.
    #[must_use]
    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }

    /// The derived index.
    #[must_use]
    pub fn index(&self) -> &I {
        &self.index
    }
}

impl<I: ContentIndex> TreeEntry for FileBacked<I> {
    fn handle_event(&mut self, event: &MonitorEvent) -> Result<()> {
        match event.kind {
            Classification::Created | Classification::Exists | Classification::Changed => {
                self.data = Some(fs::read_to_string(&self.path)?);
                let content = self.data.as_deref().unwrap_or_default();
                self.index.rebuild(content)
            }
            Classification::EndExist | Classification::Deleted => Ok(()),
        }
    }
}

/// Index over `key = value` configuration lines.
///
/// Blank lines and `#` comments are skipped; lines without `=` are rejected
/// so a malformed fragment is caught at read time rather than at bind time.
#[derive(Debug, Default)]
pub struct KeyValueIndex {
    pairs: Vec<(String, String)>,
}

impl KeyValueIndex {
    /// Look up the value for a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find_map(|(k, v)| (k == key).then_some(v.as_str()))
    }

    /// Number of indexed pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether the index holds no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl ContentIndex for KeyValueIndex {
    fn rebuild(&mut self, content: &str) -> Result<()> {
        let mut pairs = Vec::new();
        for (lineno, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(crate::Error::execution(format!(
                    "malformed line {}: '{line}'",
                    lineno + 1
                )));
            };
            pairs.push((key.trim().to_string(), value.trim().to_string()));
        }
        self.pairs = pairs;
        Ok(())
    }
}
