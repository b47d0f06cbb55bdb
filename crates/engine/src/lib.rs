//! Catalog engine for Libris
//!
//! This crate ties the record store to the search index:
//! - Library: the facade for mutations and queries
//! - UnitOfWork / Coordinator: staged changes committed to store and index together
//! - IndexSynchronizer: re-derivation rules and the full rebuild
//! - LibraryConfig: `libris.toml` settings
//!
//! The engine is the only component that writes to the index; the query
//! engine in `libris-search` only reads it.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod coordinator;
pub mod library;
pub mod sync;
pub mod transaction;

pub use config::{LibraryConfig, CONFIG_FILE_NAME};
pub use coordinator::{Coordinator, TransactionMetrics};
pub use library::{Library, LibraryStats};
pub use sync::{EntityView, IndexSynchronizer, RebuildReport, StoreView};
pub use transaction::{StagedChange, UnitOfWork};
