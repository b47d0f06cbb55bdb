//! Conversions from engine types to executor types.

use libris_core::LibrisError;
use libris_engine::{LibraryStats, RebuildReport};

use crate::types::{RebuildInfo, StatsInfo};
use crate::Error;

impl From<LibrisError> for Error {
    fn from(err: LibrisError) -> Self {
        match err {
            LibrisError::NotFound { entity, id } => Error::NotFound {
                entity: entity.to_string(),
                id,
            },
            LibrisError::InvalidQuery { reason } => Error::InvalidQuery { reason },
            LibrisError::InvalidInput { field, reason } => Error::InvalidInput {
                field: field.to_string(),
                reason,
            },
            LibrisError::IndexSync { entity, reason } => Error::IndexSync {
                entity: entity.to_string(),
                reason,
            },
            LibrisError::Rebuild { reason } => Error::Rebuild { reason },
            LibrisError::Config { reason } => Error::Config { reason },
            LibrisError::Io(e) => Error::Io {
                reason: e.to_string(),
            },
        }
    }
}

impl From<LibraryStats> for StatsInfo {
    fn from(stats: LibraryStats) -> Self {
        StatsInfo {
            stored_authors: stats.stored_authors,
            stored_books: stats.stored_books,
            indexed_authors: stats.index.authors,
            indexed_books: stats.index.books,
            index_version: stats.index.version,
            committed: stats.transactions.total_committed,
            rolled_back: stats.transactions.total_rolled_back,
        }
    }
}

impl From<RebuildReport> for RebuildInfo {
    fn from(report: RebuildReport) -> Self {
        RebuildInfo {
            authors: report.authors,
            books: report.books,
            purged: report.purged,
            compacted: report.compacted,
            elapsed: report.elapsed,
        }
    }
}
