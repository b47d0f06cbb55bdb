//! Command enum defining every Libris operation.
//!
//! Commands are the instruction set of the catalog. Each facade operation
//! is one variant, so any transport (HTTP, RPC, a CLI) maps onto this enum
//! instead of onto the facade directly.
//!
//! Commands are:
//! - **Self-contained**: all parameters are in the variant
//! - **Serializable**: JSON in, JSON out
//! - **Pure data**: no closures

use libris_core::{AuthorId, BookId, QuerySpec};
use serde::{Deserialize, Serialize};

/// A self-contained, serializable operation.
///
/// # Command Categories
///
/// | Category    | Count | Description                               |
/// |-------------|-------|-------------------------------------------|
/// | Database    | 3     | ping, stats, rebuild                      |
/// | Author      | 6     | create, update, delete, list, get, search |
/// | Book        | 11    | create, update, delete, list, page, get, five search modes |
/// | Query       | 2     | arbitrary `QuerySpec`, timing wrapper     |
///
/// # Example
///
/// ```
/// use libris_executor::Command;
///
/// let cmd: Command = serde_json::from_str(
///     r#"{"SearchBooks":{"pattern":"prejudice"}}"#,
/// ).unwrap();
/// assert_eq!(cmd, Command::SearchBooks { pattern: "prejudice".into(), size: None });
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub enum Command {
    // ==================== Database (3) ====================
    /// Liveness check.
    /// Returns: `Output::Pong`
    Ping,

    /// Store, index and unit-of-work counts.
    /// Returns: `Output::Stats`
    Stats,

    /// Reindex everything from the record store.
    /// Returns: `Output::Rebuilt`
    Rebuild,

    // ==================== Author (6) ====================
    /// Create an author.
    /// Returns: `Output::AuthorId`
    AddAuthor {
        first_name: String,
        last_name: String,
    },

    /// Rename an author.
    /// Returns: `Output::Bool` (false if the author does not exist)
    UpdateAuthor {
        id: AuthorId,
        first_name: String,
        last_name: String,
    },

    /// Delete an author and its books.
    /// Returns: `Output::Bool`
    DeleteAuthor { id: AuthorId },

    /// Every author by name.
    /// Returns: `Output::Authors`
    ListAuthors,

    /// One author by id.
    /// Returns: `Output::MaybeAuthor`
    AuthorById { id: AuthorId },

    /// Query string over names and book titles.
    /// Returns: `Output::Authors`
    SearchAuthors {
        pattern: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        size: Option<usize>,
    },

    // ==================== Book (11) ====================
    /// Create a book for an existing author.
    /// Returns: `Output::MaybeBookId` (None if the author does not exist)
    AddBook { title: String, author: AuthorId },

    /// Retitle a book.
    /// Returns: `Output::Bool`
    UpdateBook { id: BookId, title: String },

    /// Delete a book.
    /// Returns: `Output::Bool`
    DeleteBook { id: BookId },

    /// Every book by title.
    /// Returns: `Output::Books`
    ListBooks,

    /// One page of books by title.
    /// Returns: `Output::Books`
    ListBooksPage { page: u32, limit: u32 },

    /// One book by id.
    /// Returns: `Output::MaybeBook`
    BookById { id: BookId },

    /// Query string over titles, by relevance.
    /// Returns: `Output::Books`
    SearchBooks {
        pattern: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        size: Option<usize>,
    },

    /// `*`/`?` pattern over title words.
    /// Returns: `Output::Books`
    SearchBooksWildcard {
        pattern: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        size: Option<usize>,
    },

    /// Phrase with the configured slop.
    /// Returns: `Output::Books`
    SearchBooksPhrase {
        pattern: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        size: Option<usize>,
    },

    /// Books not matching the pattern.
    /// Returns: `Output::Books`
    SearchBooksExcept {
        pattern: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        size: Option<usize>,
    },

    /// Edit-distance match with the configured defaults.
    /// Returns: `Output::Books`
    SearchBooksFuzzy {
        pattern: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        size: Option<usize>,
    },

    // ==================== Query (2) ====================
    /// Any query, with hits and stats.
    /// Returns: `Output::Search`
    Query { spec: QuerySpec },

    /// Run a query command for its execution time only.
    /// Returns: `Output::Elapsed`; mutations are rejected
    Time { command: Box<Command> },
}

impl Command {
    /// Variant name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Command::Ping => "Ping",
            Command::Stats => "Stats",
            Command::Rebuild => "Rebuild",
            Command::AddAuthor { .. } => "AddAuthor",
            Command::UpdateAuthor { .. } => "UpdateAuthor",
            Command::DeleteAuthor { .. } => "DeleteAuthor",
            Command::ListAuthors => "ListAuthors",
            Command::AuthorById { .. } => "AuthorById",
            Command::SearchAuthors { .. } => "SearchAuthors",
            Command::AddBook { .. } => "AddBook",
            Command::UpdateBook { .. } => "UpdateBook",
            Command::DeleteBook { .. } => "DeleteBook",
            Command::ListBooks => "ListBooks",
            Command::ListBooksPage { .. } => "ListBooksPage",
            Command::BookById { .. } => "BookById",
            Command::SearchBooks { .. } => "SearchBooks",
            Command::SearchBooksWildcard { .. } => "SearchBooksWildcard",
            Command::SearchBooksPhrase { .. } => "SearchBooksPhrase",
            Command::SearchBooksExcept { .. } => "SearchBooksExcept",
            Command::SearchBooksFuzzy { .. } => "SearchBooksFuzzy",
            Command::Query { .. } => "Query",
            Command::Time { .. } => "Time",
        }
    }

    /// True for commands that change the catalog
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Command::AddAuthor { .. }
                | Command::UpdateAuthor { .. }
                | Command::DeleteAuthor { .. }
                | Command::AddBook { .. }
                | Command::UpdateBook { .. }
                | Command::DeleteBook { .. }
                | Command::Rebuild
        )
    }
}
