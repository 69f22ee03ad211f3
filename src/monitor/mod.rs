//! File-monitor service: directory change notifications for the tree engine.
//!
//! The [`FileMonitor`] trait is the seam between the directory
//! synchronization engine and whatever actually watches the filesystem.
//! [`NotifyMonitor`] is the production backend built on `notify`; tests
//! substitute scripted implementations.
//!
//! Delivery is unreliable by contract: events may arrive reordered,
//! duplicated, or for directories the consumer no longer knows about. The
//! consumers in [`crate::tree`] are written for exactly that channel.

mod events;
mod service;

pub use events::{Classification, HandleId, MonitorEvent};
pub use service::{FileMonitor, NotifyMonitor};
