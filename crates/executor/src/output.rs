//! Output enum for command execution results.
//!
//! Every command produces exactly one output variant, documented on the
//! command itself.

use libris_core::{Author, AuthorId, Book, BookId, SearchResponse};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::types::{RebuildInfo, StatsInfo};

/// Successful command results.
///
/// # Example
///
/// ```text
/// match executor.execute(Command::AuthorById { id })? {
///     Output::MaybeAuthor(Some(a)) => println!("{} {}", a.first_name, a.last_name),
///     Output::MaybeAuthor(None) => println!("Not found"),
///     _ => unreachable!("AuthorById always returns MaybeAuthor"),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Output {
    /// Liveness response
    Pong {
        /// Crate version
        version: String,
    },

    /// Boolean result (updates and deletes)
    Bool(bool),

    /// Id of a created author
    AuthorId(AuthorId),

    /// Id of a created book, `None` when the author did not exist
    MaybeBookId(Option<BookId>),

    /// Authors in result order
    Authors(Vec<Author>),

    /// Single author lookup
    MaybeAuthor(Option<Author>),

    /// Books in result order
    Books(Vec<Book>),

    /// Single book lookup
    MaybeBook(Option<Book>),

    /// Full query response
    Search(SearchResponse),

    /// Query execution time
    Elapsed(Duration),

    /// Database counts
    Stats(StatsInfo),

    /// Rebuild outcome
    Rebuilt(RebuildInfo),
}
