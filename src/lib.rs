//! Libris - a library catalog of authors and books with full-text search
//!
//! Authors own books; books belong to exactly one author. Every mutation
//! updates the record store and the search index as one unit of work, and
//! every query goes through one dispatcher supporting seven modes:
//! match-all, by-id, simple query string, wildcard, phrase with slop,
//! exclusion and fuzzy.
//!
//! # Quick Start
//!
//! ```
//! use libris::Library;
//!
//! let library = Library::in_memory();
//! let austen = library.add_author("Jane", "Austen").unwrap();
//! library.add_book("Pride and Prejudice", austen).unwrap();
//!
//! assert_eq!(library.search_books_fuzzy("Prejudise", None).unwrap().len(), 1);
//! assert_eq!(library.search_books_wildcard("Prejudic*", None).unwrap().len(), 1);
//! ```
//!
//! # Architecture
//!
//! | Crate             | Role                                              |
//! |-------------------|---------------------------------------------------|
//! | `libris-core`     | entities, ids, errors, query contracts            |
//! | `libris-storage`  | in-memory record store                            |
//! | `libris-search`   | analyzers, projection, index, query engine        |
//! | `libris-engine`   | unit of work, synchronizer, `Library` facade      |
//! | `libris-executor` | serializable command surface                      |

pub use libris_core::{
    Author, AuthorId, Book, BookId, Entity, EntityKind, EntityRef, LibrisError, LibrisResult,
    PageRequest, QueryMode, QuerySpec, RecordStore, SearchHit, SearchResponse, SearchStats,
    SortSpec, WriteBatch, WriteOp,
};
pub use libris_engine::{
    Library, LibraryConfig, LibraryStats, RebuildReport, UnitOfWork, CONFIG_FILE_NAME,
};
pub use libris_executor::{Command, Executor, Output};
pub use libris_search::SearchSettings;
pub use libris_storage::MemoryStore;
