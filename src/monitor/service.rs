//! Monitor service trait and the notify-backed production implementation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use walkdir::WalkDir;

use super::events::{classify, Classification, HandleId, MonitorEvent};
use crate::error::MonitorError;
use crate::Result;

/// Directory-subscription service consumed by the tree engine.
///
/// One handle per monitored directory; implementations deliver
/// [`MonitorEvent`]s carrying that handle through whatever channel they
/// choose. Consumers must not assume ordered or exactly-once delivery.
pub trait FileMonitor: Send + Sync {
    /// Subscribe to changes under `path` (non-recursive).
    ///
    /// # Errors
    ///
    /// Returns an error if the subscription cannot be registered.
    fn add_monitor(&self, path: &Path) -> Result<HandleId>;

    /// Retire a subscription. Unknown handles are a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to drop the watch.
    fn remove_monitor(&self, handle: HandleId) -> Result<()>;
}

/// Shared watch table: directory path to subscription handle.
type WatchTable = Arc<Mutex<HashMap<PathBuf, HandleId>>>;

/// Production monitor backend built on `notify`.
///
/// Each monitored directory is watched non-recursively; raw backend events
/// are classified and translated into [`MonitorEvent`]s relative to their
/// monitored parent, then delivered over an unbounded channel obtained from
/// [`NotifyMonitor::events`]. Registering a directory synthesizes one
/// `Exists` event per existing direct child followed by an `EndExist`
/// marker, so a fresh subscription sees current content exactly like live
/// changes.
pub struct NotifyMonitor {
    watcher: Mutex<RecommendedWatcher>,
    watches: WatchTable,
    next_handle: AtomicU64,
    event_tx: Sender<MonitorEvent>,
    event_rx: Receiver<MonitorEvent>,
}

impl NotifyMonitor {
    /// Create the monitor service.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend watcher cannot be created.
    pub fn new() -> Result<Self> {
        let (event_tx, event_rx) = unbounded();
        let watches: WatchTable = Arc::new(Mutex::new(HashMap::new()));

        let tx = event_tx.clone();
        let table = Arc::clone(&watches);
        let watcher = notify::recommended_watcher(move |result: notify::Result<notify::Event>| {
            match result {
                Ok(event) => deliver(&table, &tx, &event),
                Err(e) => tracing::warn!(error = %e, "Monitor backend error"),
            }
        })
        .map_err(|e| MonitorError::Backend(e.to_string()))?;

        Ok(Self {
            watcher: Mutex::new(watcher),
            watches,
            next_handle: AtomicU64::new(1),
            event_tx,
            event_rx,
        })
    }

    /// Receiver side of the event channel.
    ///
    /// The delivery loop that drains this is the single call path feeding
    /// a directory engine.
    #[must_use]
    pub fn events(&self) -> Receiver<MonitorEvent> {
        self.event_rx.clone()
    }

    /// Synthesize `Exists` events for the direct children of a freshly
    /// monitored directory, then the scan-complete marker.
    fn scan_existing(&self, path: &Path, handle: HandleId) {
        for entry in WalkDir::new(path).min_depth(1).max_depth(1) {
            match entry {
                Ok(entry) => {
                    let name = entry.file_name().to_string_lossy().into_owned();
                    let event = MonitorEvent::new(handle, name, Classification::Exists);
                    let _ = self.event_tx.send(event);
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Error scanning directory");
                }
            }
        }
        let _ = self.event_tx.send(MonitorEvent::end_exist(handle));
    }
}

impl FileMonitor for NotifyMonitor {
    fn add_monitor(&self, path: &Path) -> Result<HandleId> {
        self.watcher
            .lock()
            .watch(path, RecursiveMode::NonRecursive)
            .map_err(|e| MonitorError::AddFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        let handle = HandleId(self.next_handle.fetch_add(1, Ordering::SeqCst));
        self.watches.lock().insert(path.to_path_buf(), handle);
        tracing::debug!(path = %path.display(), handle = handle.raw(), "Monitoring directory");

        self.scan_existing(path, handle);
        Ok(handle)
    }

    fn remove_monitor(&self, handle: HandleId) -> Result<()> {
        let path = {
            let mut watches = self.watches.lock();
            let Some(path) = watches
                .iter()
                .find_map(|(p, h)| (*h == handle).then(|| p.clone()))
            else {
                return Ok(());
            };
            watches.remove(&path);
            path
        };

        // The path may already be gone from disk; the backend reports that
        // as a failed unwatch, which is fine to swallow here.
        if let Err(e) = self.watcher.lock().unwatch(&path) {
            tracing::debug!(path = %path.display(), error = %e, "Unwatch after removal failed");
        }
        tracing::debug!(path = %path.display(), handle = handle.raw(), "Stopped monitoring directory");
        Ok(())
    }
}

/// Translate one raw backend event into per-subscription events.
fn deliver(
    watches: &WatchTable,
    tx: &Sender<MonitorEvent>,
    event: &notify::Event,
) {
    let Some(kind) = classify(&event.kind) else {
        return;
    };

    let table = watches.lock();
    for path in &event.paths {
        let Some(parent) = path.parent() else {
            continue;
        };
        let Some(handle) = table.get(parent) else {
            continue;
        };
        let Some(name) = path.file_name() else {
            continue;
        };
        let event = MonitorEvent::new(*handle, name.to_string_lossy().into_owned(), kind);
        let _ = tx.send(event);
    }
}
