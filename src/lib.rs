//! Plugin substrate for a configuration management server.
//!
//! Independent server plugins use this crate to mirror parts of a managed
//! configuration repository into memory and to record per-client statistics
//! asynchronously, without reimplementing filesystem watching or durable
//! queuing. The two engines at the center are:
//!
//! - [`tree::DirectoryMirror`] keeps an in-memory index of a repository
//!   subtree current against asynchronous change notifications from a
//!   [`monitor::FileMonitor`] service, tolerating reordered, duplicated,
//!   and stale deliveries.
//! - [`stats::ThreadedStatistics`] is a bounded producer/consumer queue with
//!   a background worker and a disk-backed pending snapshot, so records
//!   queued at shutdown survive a restart.
//!
//! Plugins attach through the contracts in [`plugin`].

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod debug;
pub mod error;
pub mod logging;
pub mod monitor;
pub mod plugin;
pub mod stats;
pub mod tree;

pub use config::Config;
pub use error::{Error, Result};
