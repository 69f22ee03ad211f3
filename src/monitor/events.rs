//! Change-notification event types.

use notify::event::EventKind;

/// Opaque id for one directory subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandleId(pub(crate) u64);

impl HandleId {
    /// Raw numeric value, for log messages.
    #[must_use]
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// The kind of filesystem change a notification describes.
///
/// This is a closed set. Backend event kinds with no counterpart here are
/// dropped at the mapping edge rather than surfaced as an "unknown" variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// A file or directory appeared after the initial scan.
    Created,
    /// A file or directory was present during the initial scan.
    Exists,
    /// A file's content changed.
    Changed,
    /// A file or directory was removed.
    Deleted,
    /// Marker: the initial scan of a monitored directory is complete.
    EndExist,
}

/// One change notification from the file-monitor service.
#[derive(Debug, Clone)]
pub struct MonitorEvent {
    /// Subscription the event was delivered on.
    pub handle: HandleId,
    /// Name relative to the monitored directory; empty for scan markers.
    pub filename: String,
    /// What happened.
    pub kind: Classification,
}

impl MonitorEvent {
    /// Create an event.
    #[must_use]
    pub fn new(handle: HandleId, filename: impl Into<String>, kind: Classification) -> Self {
        Self {
            handle,
            filename: filename.into(),
            kind,
        }
    }

    /// Create the scan-complete marker for a subscription.
    #[must_use]
    pub fn end_exist(handle: HandleId) -> Self {
        Self::new(handle, "", Classification::EndExist)
    }
}

/// Map a backend event kind onto a classification.
///
/// Returns `None` for kinds the substrate does not model (access
/// notifications, renames reported as generic "other" events, and so on);
/// those are discarded before reaching any consumer.
#[must_use]
pub(crate) fn classify(kind: &EventKind) -> Option<Classification> {
    match kind {
        EventKind::Create(_) => Some(Classification::Created),
        EventKind::Modify(_) => Some(Classification::Changed),
        EventKind::Remove(_) => Some(Classification::Deleted),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => None,
    }
}
