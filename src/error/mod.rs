//! Error types and Result alias for the plugin substrate.
//!
//! The taxonomy mirrors how failures are handled at runtime: `Init` aborts a
//! plugin's load, `Execution` surfaces to the immediate caller,
//! `NotImplemented` marks an unoverridden extension point and is always
//! raised. Tolerated anomalies (stale monitor handles, duplicate directory
//! registrations, missing entries) never become errors at all; the engines
//! absorb them internally.

use thiserror::Error;

/// Result type alias using the substrate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for plugin operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Fatal failure during plugin construction; aborts that plugin's load.
    #[error("plugin initialization error: {0}")]
    Init(String),

    /// Caller-visible contract violation during plugin execution.
    #[error("plugin execution error: {0}")]
    Execution(String),

    /// Unoverridden extension point was invoked.
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// File-monitor service error.
    #[error("monitor error: {0}")]
    Monitor(#[from] MonitorError),

    /// Pending-snapshot codec error.
    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// File-monitor service errors.
#[derive(Error, Debug)]
pub enum MonitorError {
    /// Failed to register a watch on a path.
    #[error("failed to monitor path '{path}': {reason}")]
    AddFailed { path: String, reason: String },

    /// Failed to retire a watch.
    #[error("failed to remove monitor {handle}: {reason}")]
    RemoveFailed { handle: u64, reason: String },

    /// The monitor backend could not be created.
    #[error("monitor backend error: {0}")]
    Backend(String),
}

/// Pending-snapshot persistence errors.
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// The snapshot could not be serialized or written.
    #[error("failed to write snapshot '{path}': {reason}")]
    Write { path: String, reason: String },

    /// The snapshot could not be read or decoded.
    #[error("failed to read snapshot '{path}': {reason}")]
    Read { path: String, reason: String },
}

impl Error {
    /// Create a plugin-initialization error.
    pub fn init(msg: impl Into<String>) -> Self {
        Self::Init(msg.into())
    }

    /// Create a plugin-execution error.
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
