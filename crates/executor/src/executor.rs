//! The Executor: single entry point for commands.
//!
//! A stateless dispatcher that routes each [`Command`] to the matching
//! [`Library`] operation and wraps the result in an [`Output`].

use std::sync::Arc;

use libris_engine::Library;
use tracing::debug;

use crate::{Command, Error, Output, Result};

/// The command executor.
///
/// # Thread Safety
///
/// Executor is `Send + Sync` and can be shared across threads.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use libris_engine::Library;
/// use libris_executor::{Command, Executor, Output};
///
/// let executor = Executor::new(Arc::new(Library::in_memory()));
/// let author = match executor.execute(Command::AddAuthor {
///     first_name: "Jane".into(),
///     last_name: "Austen".into(),
/// }).unwrap() {
///     Output::AuthorId(id) => id,
///     other => panic!("unexpected {:?}", other),
/// };
///
/// let results = executor.execute_many(vec![
///     Command::AddBook { title: "Emma".into(), author },
///     Command::ListBooks,
/// ]);
/// assert_eq!(results.len(), 2);
/// ```
pub struct Executor {
    library: Arc<Library>,
}

impl Executor {
    /// Create an executor over a library
    pub fn new(library: Arc<Library>) -> Self {
        Self { library }
    }

    /// Execute a single command.
    pub fn execute(&self, cmd: Command) -> Result<Output> {
        debug!(target: "libris::executor", command = cmd.name(), "execute");
        let lib = &self.library;
        match cmd {
            Command::Ping => Ok(Output::Pong {
                version: env!("CARGO_PKG_VERSION").to_string(),
            }),
            Command::Stats => Ok(Output::Stats(lib.stats().into())),
            Command::Rebuild => Ok(Output::Rebuilt(lib.rebuild_all()?.into())),

            Command::AddAuthor {
                first_name,
                last_name,
            } => Ok(Output::AuthorId(lib.add_author(&first_name, &last_name)?)),
            Command::UpdateAuthor {
                id,
                first_name,
                last_name,
            } => Ok(Output::Bool(lib.update_author(id, &first_name, &last_name)?)),
            Command::DeleteAuthor { id } => Ok(Output::Bool(lib.delete_author(id)?)),
            Command::ListAuthors => Ok(Output::Authors(lib.list_authors()?)),
            Command::AuthorById { id } => Ok(Output::MaybeAuthor(lib.author_by_id(id)?)),
            Command::SearchAuthors { pattern, size } => {
                Ok(Output::Authors(lib.search_authors(&pattern, size)?))
            }

            Command::AddBook { title, author } => {
                Ok(Output::MaybeBookId(lib.add_book(&title, author)?))
            }
            Command::UpdateBook { id, title } => Ok(Output::Bool(lib.update_book(id, &title)?)),
            Command::DeleteBook { id } => Ok(Output::Bool(lib.delete_book(id)?)),
            Command::ListBooks => Ok(Output::Books(lib.list_books()?)),
            Command::ListBooksPage { page, limit } => {
                Ok(Output::Books(lib.list_books_page(page, limit)?))
            }
            Command::BookById { id } => Ok(Output::MaybeBook(lib.book_by_id(id)?)),
            Command::SearchBooks { pattern, size } => {
                Ok(Output::Books(lib.search_books(&pattern, size)?))
            }
            Command::SearchBooksWildcard { pattern, size } => {
                Ok(Output::Books(lib.search_books_wildcard(&pattern, size)?))
            }
            Command::SearchBooksPhrase { pattern, size } => {
                Ok(Output::Books(lib.search_books_phrase(&pattern, size)?))
            }
            Command::SearchBooksExcept { pattern, size } => {
                Ok(Output::Books(lib.search_books_except(&pattern, size)?))
            }
            Command::SearchBooksFuzzy { pattern, size } => {
                Ok(Output::Books(lib.search_books_fuzzy(&pattern, size)?))
            }

            Command::Query { spec } => Ok(Output::Search(lib.execute(&spec)?)),
            Command::Time { command } => self.time(*command).map(Output::Elapsed),
        }
    }

    /// Execution time of a query command
    fn time(&self, cmd: Command) -> Result<std::time::Duration> {
        let lib = &self.library;
        let elapsed = match cmd {
            Command::ListAuthors => lib.list_authors_time()?,
            Command::AuthorById { id } => lib.author_by_id_time(id)?,
            Command::SearchAuthors { pattern, size } => lib.search_authors_time(&pattern, size)?,
            Command::ListBooks => lib.list_books_time()?,
            Command::ListBooksPage { page, limit } => lib.list_books_page_time(page, limit)?,
            Command::BookById { id } => lib.book_by_id_time(id)?,
            Command::SearchBooks { pattern, size } => lib.search_books_time(&pattern, size)?,
            Command::SearchBooksWildcard { pattern, size } => {
                lib.search_books_wildcard_time(&pattern, size)?
            }
            Command::SearchBooksPhrase { pattern, size } => {
                lib.search_books_phrase_time(&pattern, size)?
            }
            Command::SearchBooksExcept { pattern, size } => {
                lib.search_books_except_time(&pattern, size)?
            }
            Command::SearchBooksFuzzy { pattern, size } => {
                lib.search_books_fuzzy_time(&pattern, size)?
            }
            Command::Query { spec } => lib.execute_time(&spec)?,
            other => {
                return Err(Error::InvalidCommand {
                    reason: format!("{} cannot be timed", other.name()),
                })
            }
        };
        Ok(elapsed)
    }

    /// Execute commands in order, one result per command.
    ///
    /// Each command is its own unit of work; a failure does not stop the
    /// commands after it.
    pub fn execute_many(&self, cmds: Vec<Command>) -> Vec<Result<Output>> {
        cmds.into_iter().map(|cmd| self.execute(cmd)).collect()
    }

    /// The library behind this executor
    pub fn library(&self) -> &Arc<Library> {
        &self.library
    }
}
