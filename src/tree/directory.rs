//! Directory synchronization engine.

use std::collections::HashMap;
use std::path::{PathBuf, MAIN_SEPARATOR};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::debug::Debuggable;
use crate::monitor::{Classification, FileMonitor, HandleId, MonitorEvent};
use crate::tree::entry::TreeEntry;
use crate::{Error, Result};

/// Factory producing entries for newly seen files.
///
/// Supplied per plugin at engine construction; receives the file's absolute
/// path and a monitor-service reference, and may return anything satisfying
/// the [`TreeEntry`] contract.
pub type EntryFactory = Box<dyn Fn(PathBuf, Arc<dyn FileMonitor>) -> Box<dyn TreeEntry> + Send>;

/// In-memory mirror of a repository subtree.
///
/// Routes change notifications to directory registration, entry creation,
/// entry update, or subtree eviction. Dispatch is written for an unreliable
/// delivery channel: stale handles, duplicate registrations, and missing
/// entries are tolerated anomalies, absorbed without surfacing an error.
///
/// The engine is logically single-writer; all calls to
/// [`DirectoryMirror::handle_event`] must come from one delivery context.
pub struct DirectoryMirror {
    root: PathBuf,
    monitor: Arc<dyn FileMonitor>,
    handles: HashMap<HandleId, String>,
    entries: HashMap<String, Box<dyn TreeEntry>>,
    factory: EntryFactory,
    debug: AtomicBool,
}

impl std::fmt::Debug for DirectoryMirror {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryMirror")
            .field("root", &self.root)
            .field("handles", &self.handles)
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}

impl DirectoryMirror {
    /// Create a mirror rooted at `root` and register a monitor on it.
    ///
    /// # Errors
    ///
    /// Returns an `Init` error if the root is not a directory or its
    /// monitor cannot be registered; a plugin that cannot see its own
    /// subtree must not load.
    pub fn new(
        root: impl Into<PathBuf>,
        monitor: Arc<dyn FileMonitor>,
        factory: EntryFactory,
    ) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(Error::init(format!(
                "repository root '{}' is not a directory",
                root.display()
            )));
        }

        let mut mirror = Self {
            root,
            monitor,
            handles: HashMap::new(),
            entries: HashMap::new(),
            factory,
            debug: AtomicBool::new(false),
        };
        mirror
            .add_directory_monitor("")
            .map_err(|e| Error::init(format!("failed to monitor repository root: {e}")))?;
        Ok(mirror)
    }

    /// Root absolute path.
    #[must_use]
    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    /// Register a monitor for a relative directory path.
    ///
    /// A path that is already registered, or whose absolute target is not
    /// currently a directory, is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the monitor service rejects the registration.
    pub fn add_directory_monitor(&mut self, rel: &str) -> Result<()> {
        if self.handles.values().any(|registered| registered == rel) {
            return Ok(());
        }

        let abs = self.root.join(rel);
        if !abs.is_dir() {
            return Ok(());
        }

        let handle = self.monitor.add_monitor(&abs)?;
        self.handles.insert(handle, rel.to_string());
        Ok(())
    }

    /// Create an entry for `rel` via the factory and forward `event` to it
    /// immediately, so content is loaded on first sight instead of waiting
    /// for a later notification.
    pub fn add_entry(&mut self, rel: String, event: &MonitorEvent) {
        let abs = self.root.join(&rel);
        let entry = (self.factory)(abs, Arc::clone(&self.monitor));
        let entry = self.entries.entry(rel).or_insert(entry);
        if let Err(e) = entry.handle_event(event) {
            tracing::warn!(error = %e, "New entry rejected its initial event");
        }
    }

    /// Dispatch one change notification.
    ///
    /// Never panics and never returns an error; the delivery channel is
    /// allowed to hand us stale, duplicated, or reordered events.
    pub fn handle_event(&mut self, event: &MonitorEvent) {
        let Some(base) = self.handles.get(&event.handle).cloned() else {
            // Stale or foreign subscription; a notification for a handle we
            // never issued must not fault the engine.
            self.debug_log(
                &format!("dropping event for unknown handle {}", event.handle.raw()),
                false,
            );
            return;
        };

        if event.kind == Classification::EndExist {
            return;
        }

        let rel = join_rel(&base, &event.filename);

        match event.kind {
            Classification::Created | Classification::Exists | Classification::Changed
                if self.root.join(&rel).is_dir() =>
            {
                // Directories get monitors, never entries.
                if let Err(e) = self.add_directory_monitor(&rel) {
                    tracing::warn!(path = %rel, error = %e, "Failed to monitor new directory");
                }
            }
            Classification::Created | Classification::Exists => {
                if !self.entries.contains_key(&rel) {
                    self.add_entry(rel, event);
                }
            }
            Classification::Changed => {
                if let Some(entry) = self.entries.get_mut(&rel) {
                    if let Err(e) = entry.handle_event(event) {
                        tracing::warn!(path = %rel, error = %e, "Entry failed to handle change");
                    }
                } else {
                    // Self-heal a missed creation notification.
                    self.add_entry(rel, event);
                }
            }
            Classification::Deleted => self.remove_subtree(&rel),
            Classification::EndExist => {}
        }
    }

    /// Look up the entry tracked at a relative path.
    #[must_use]
    pub fn get(&self, rel: &str) -> Option<&dyn TreeEntry> {
        self.entries.get(rel).map(Box::as_ref)
    }

    /// Iterate over `(relative path, entry)` pairs, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &dyn TreeEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    /// Number of tracked entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Evict the entry at `rel` and every entry underneath it, and retire
    /// the monitors registered for the deleted path or anything below it.
    fn remove_subtree(&mut self, rel: &str) {
        let prefix = format!("{rel}{MAIN_SEPARATOR}");

        self.entries.remove(rel);
        self.entries.retain(|tracked, _| !tracked.starts_with(&prefix));

        let doomed: Vec<HandleId> = self
            .handles
            .iter()
            .filter(|(_, registered)| *registered == rel || registered.starts_with(&prefix))
            .map(|(handle, _)| *handle)
            .collect();
        for handle in doomed {
            self.handles.remove(&handle);
            if let Err(e) = self.monitor.remove_monitor(handle) {
                self.debug_log(&format!("failed to retire monitor for '{rel}': {e}"), false);
            }
        }
    }
}

impl Debuggable for DirectoryMirror {
    fn debug_flag(&self) -> &AtomicBool {
        &self.debug
    }

    fn component_name(&self) -> &str {
        "directory-mirror"
    }
}

/// Join a base relative directory and a filename into an entry key.
fn join_rel(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{base}{MAIN_SEPARATOR}{name}")
    }
}
