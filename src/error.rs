//! Error types for the lock service.

use thiserror::Error;

/// Errors from snapshot backup and restore.
///
/// Command application itself is total: stale or mismatched requests produce
/// defined responses, never errors. A failed restore means the replica must
/// abort or re-fetch the snapshot; it must not continue on partial state.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Snapshot bytes could not be decoded.
    #[error("malformed lock snapshot: {0}")]
    Corrupt(#[source] serde_json::Error),

    /// Snapshot could not be written to the sink.
    #[error("failed to write lock snapshot: {0}")]
    Write(#[source] serde_json::Error),
}
