//! Storage layer for Libris
//!
//! This crate implements the record store the engine consumes through the
//! [`libris_core::RecordStore`] trait:
//! - MemoryStore: DashMap tables with an atomic batch gate
//! - Store-wide id sequence with AtomicU64
//! - Undo batches for rolling back a committed batch

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod memory;

pub use memory::MemoryStore;
