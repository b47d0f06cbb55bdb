//! Serializable summaries returned by database commands.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Counts reported by `Command::Stats`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsInfo {
    /// Authors in the record store
    pub stored_authors: usize,
    /// Books in the record store
    pub stored_books: usize,
    /// Author documents in the index
    pub indexed_authors: usize,
    /// Book documents in the index
    pub indexed_books: usize,
    /// Index batches applied
    pub index_version: u64,
    /// Units of work committed
    pub committed: u64,
    /// Units of work rolled back
    pub rolled_back: u64,
}

/// Outcome of `Command::Rebuild`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebuildInfo {
    /// Author documents written
    pub authors: usize,
    /// Book documents written
    pub books: usize,
    /// Stale documents removed
    pub purged: usize,
    /// Vacated doc id slots reclaimed
    #[serde(default)]
    pub compacted: usize,
    /// Wall time
    pub elapsed: Duration,
}
