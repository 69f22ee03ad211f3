//! Pending-snapshot codec.
//!
//! The on-disk format is a JSON array of `(identity-string, payload-string)`
//! pairs. An explicit schema with string-serialized payloads keeps the
//! snapshot readable for inspection and independent of how payload types
//! evolve between releases.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SnapshotError;
use crate::Result;

/// One persisted statistic record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRecord {
    /// Client identity as a hostname string.
    pub client: String,
    /// Statistic payload in serialized markup form.
    pub payload: String,
}

/// Serialize records to the pending-snapshot path, creating parent
/// directories as needed.
///
/// # Errors
///
/// Returns an error if the snapshot cannot be created or written.
pub(crate) fn write_pending(path: &Path, records: &[PendingRecord]) -> Result<()> {
    let write_err = |reason: String| SnapshotError::Write {
        path: path.display().to_string(),
        reason,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;
    }
    let file = File::create(path).map_err(|e| write_err(e.to_string()))?;
    serde_json::to_writer(BufWriter::new(file), records)
        .map_err(|e| write_err(e.to_string()))?;
    Ok(())
}

/// Deserialize records from the pending-snapshot path.
///
/// # Errors
///
/// Returns an error if the snapshot cannot be opened or decoded.
pub(crate) fn read_pending(path: &Path) -> Result<Vec<PendingRecord>> {
    let read_err = |reason: String| SnapshotError::Read {
        path: path.display().to_string(),
        reason,
    };

    let file = File::open(path).map_err(|e| read_err(e.to_string()))?;
    let records = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| read_err(e.to_string()))?;
    Ok(records)
}
