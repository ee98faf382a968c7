//! Fatal simulation errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::map::MapElementKind;

/// Errors that abort a run.
///
/// Planning failures are deliberately not represented here: an unreachable
/// goal yields an empty path and the affected vehicle simply retries on a
/// later tick, and a task nobody can reach stays pending.
#[derive(Debug, Error)]
pub enum Error {
    /// A task references a start or end point absent from the map.
    #[error("map element not found: {kind:?} {name:?}")]
    ElementNotFound { kind: MapElementKind, name: String },

    #[error("map file not found: {}", .0.display())]
    MapFileMissing(PathBuf),

    #[error("task file not found: {}", .0.display())]
    TaskFileMissing(PathBuf),

    /// The scheduler exceeded the tick ceiling without completing all tasks.
    #[error("failed to complete all tasks after {limit}s")]
    DeadlockExceeded { limit: u64 },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}
