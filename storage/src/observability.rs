//! Structured logging around store operations.
//!
//! The teacher's `storage::observability` wired both `tracing` spans and
//! `metrics` counters/histograms around every backend call; this workspace
//! has no metrics-collection consumer (§5 is single-threaded, in-process,
//! with no external monitoring surface), so only the `tracing` half
//! survives, covering the six operations [`QuadStore`](crate::QuadStore)
//! actually exposes.

use std::fmt;

use tracing::{debug, instrument, warn};

/// One of the operations a [`QuadStore`](crate::QuadStore) exposes, used to
/// tag the `tracing` span each operation runs inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationType {
    Add,
    Erase,
    EraseRange,
    Find,
    Count,
    Ask,
}

impl OperationType {
    pub fn name(self) -> &'static str {
        match self {
            OperationType::Add => "store.add",
            OperationType::Erase => "store.erase",
            OperationType::EraseRange => "store.erase_range",
            OperationType::Find => "store.find",
            OperationType::Count => "store.count",
            OperationType::Ask => "store.ask",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Runs `f`, logging its outcome at `debug` (success) or `warn` (error)
/// under a span named after `op`.
#[instrument(level = "debug", skip(f), fields(op = %op))]
pub fn track_operation<F, T, E>(op: OperationType, f: F) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E>,
    E: fmt::Debug,
{
    let result = f();
    match &result {
        Ok(_) => debug!(op = %op, "store operation completed"),
        Err(e) => warn!(op = %op, error = ?e, "store operation failed"),
    }
    result
}
