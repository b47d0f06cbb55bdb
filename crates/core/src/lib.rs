//! Core types and traits for Libris
//!
//! This crate defines the foundational types used throughout the workspace:
//! - AuthorId / BookId / EntityRef: entity identity
//! - Author / Book / Entity: catalog records with explicit ownership
//! - LibrisError: error taxonomy
//! - Limits: field length constraints
//! - Query contracts: QuerySpec, QueryMode, SortSpec, PageRequest, SearchResponse
//! - RecordStore: the store contract consumed by the engine

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod entity;
pub mod error;
pub mod limits;
pub mod search_types;
pub mod traits;
pub mod types;

pub use entity::{Author, Book, Entity};
pub use error::{LibrisError, LibrisResult};
pub use limits::{MAX_NAME_CHARS, MAX_TITLE_CHARS};
pub use search_types::{
    PageRequest, QueryMode, QuerySpec, SearchHit, SearchResponse, SearchStats, SortSpec,
};
pub use traits::{RecordStore, WriteBatch, WriteOp};
pub use types::{AuthorId, BookId, EntityKind, EntityRef};
