//! Search infrastructure for Libris
//!
//! This crate provides:
//! - Analyzers (name, English) with ASCII folding and Porter stemming
//! - Entity projection: searchable and sortable fields, document derivation
//! - Positional inverted index with one segment per entity type
//! - Scorer trait and BM25 implementation
//! - QueryEngine: the single dispatcher for every query mode
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//! use libris_core::{Author, AuthorId, Book, BookId, EntityKind, QueryMode, QuerySpec};
//! use libris_search::{Projection, QueryEngine, SearchIndex, SearchSettings};
//!
//! let index = Arc::new(SearchIndex::new());
//! let author = Author::new(AuthorId(1), "Jane", "Austen").with_book(BookId(2));
//! let book = Book::new(BookId(2), "Pride and Prejudice", AuthorId(1));
//! index.upsert(Projection::default().derive_book(&book, Some(&author)).unwrap()).unwrap();
//!
//! let engine = QueryEngine::new(index, SearchSettings::default());
//! let spec = QuerySpec::new(EntityKind::Book, QueryMode::Simple { pattern: "prejudice".into() });
//! assert_eq!(engine.execute(&spec).unwrap().len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analyzer;
pub mod folding;
pub mod index;
pub mod matcher;
pub mod projection;
pub mod query;
pub mod query_string;
pub mod scorer;
pub mod settings;
pub mod stemmer;

// Re-export commonly used types
pub use analyzer::{Analyzer, Token};
pub use index::{IndexOp, IndexStats, SearchIndex, Segment};
pub use projection::{FieldDef, FieldKind, IndexDocument, IndexedField, Projection};
pub use query::QueryEngine;
pub use scorer::{Bm25Scorer, Scorer, TermStats};
pub use settings::SearchSettings;
