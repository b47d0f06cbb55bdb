//! Library facade
//!
//! The entry point for callers. Every mutation runs as one unit of work,
//! so the record store and the search index change together or not at
//! all. Every query goes through the single [`QueryEngine::execute`]
//! dispatcher; the named methods below only build the [`QuerySpec`].
//!
//! Mutations that reference a missing entity are no-ops and report it
//! through their return value (`false` / `None`), not as an error.

use crate::config::LibraryConfig;
use crate::coordinator::{Coordinator, TransactionMetrics};
use crate::sync::{IndexSynchronizer, RebuildReport};
use crate::transaction::UnitOfWork;
use libris_core::limits::{validate_name, validate_title};
use libris_core::{
    Author, AuthorId, Book, BookId, Entity, EntityKind, LibrisResult, PageRequest, QueryMode,
    QuerySpec, RecordStore, SearchResponse,
};
use libris_search::projection::TITLE;
use libris_search::{IndexStats, Projection, QueryEngine, SearchIndex};
use libris_storage::MemoryStore;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Counts across store, index and units of work
#[derive(Debug, Clone, PartialEq)]
pub struct LibraryStats {
    /// Authors in the record store
    pub stored_authors: usize,
    /// Books in the record store
    pub stored_books: usize,
    /// Index document counts and version
    pub index: IndexStats,
    /// Unit-of-work counters
    pub transactions: TransactionMetrics,
}

/// A searchable catalog of authors and books
///
/// # Example
///
/// ```
/// use libris_engine::Library;
///
/// let library = Library::in_memory();
/// let austen = library.add_author("Jane", "Austen").unwrap();
/// library.add_book("Pride and Prejudice", austen).unwrap();
///
/// let books = library.search_books("prejudice", None).unwrap();
/// assert_eq!(books[0].title, "Pride and Prejudice");
/// ```
pub struct Library {
    config: LibraryConfig,
    coordinator: Coordinator,
    engine: QueryEngine,
}

impl Library {
    // ========================================================================
    // Opening
    // ========================================================================

    /// Open a library over `store`
    ///
    /// A non-empty store is reindexed first when `reindex_on_startup` is
    /// set. If that fails no library is returned.
    ///
    /// # Errors
    ///
    /// `Config` for invalid settings, `Rebuild` when the store cannot be
    /// indexed.
    pub fn open(config: LibraryConfig, store: Arc<dyn RecordStore>) -> LibrisResult<Self> {
        config.validate()?;
        let library = Self::assemble(config, store);

        let store = library.coordinator.store();
        if !store.is_empty() && library.config.reindex_on_startup {
            library.coordinator.rebuild_all()?;
        }
        info!(
            target: "libris::db",
            authors = store.count_authors(),
            books = store.count_books(),
            "Library opened"
        );
        Ok(library)
    }

    /// Open a library configured by the TOML file at `path`
    ///
    /// A missing file means default settings.
    pub fn open_with_config_file(path: &Path, store: Arc<dyn RecordStore>) -> LibrisResult<Self> {
        let config = LibraryConfig::load_or_default(path)?;
        Self::open(config, store)
    }

    /// Empty library over a fresh [`MemoryStore`] with default settings
    pub fn in_memory() -> Self {
        Self::assemble(LibraryConfig::default(), Arc::new(MemoryStore::new()))
    }

    fn assemble(config: LibraryConfig, store: Arc<dyn RecordStore>) -> Self {
        let index = Arc::new(SearchIndex::with_capacity(config.index_capacity));
        let projection = Projection::new(config.search.position_increment_gap);
        let sync = IndexSynchronizer::new(index.clone(), projection);
        let engine = QueryEngine::new(index, config.search.clone());
        Library {
            coordinator: Coordinator::new(store, sync),
            engine,
            config,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &LibraryConfig {
        &self.config
    }

    /// The underlying query engine
    pub fn engine(&self) -> &QueryEngine {
        &self.engine
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Run `f` as one unit of work
    ///
    /// Everything `f` stages is committed to store and index together when
    /// it returns `Ok`, and discarded when it returns `Err`. `f` must not
    /// call back into this library.
    pub fn transaction<F, T>(&self, f: F) -> LibrisResult<T>
    where
        F: FnOnce(&mut UnitOfWork<'_>) -> LibrisResult<T>,
    {
        self.coordinator.transaction(f)
    }

    /// Create an author with no books
    pub fn add_author(&self, first_name: &str, last_name: &str) -> LibrisResult<AuthorId> {
        validate_name("first_name", first_name)?;
        validate_name("last_name", last_name)?;
        self.transaction(|uow| {
            let id = AuthorId(uow.next_id());
            uow.put_author(Author::new(id, first_name, last_name));
            Ok(id)
        })
    }

    /// Rename an author; `false` if it does not exist
    pub fn update_author(&self, id: AuthorId, first_name: &str, last_name: &str) -> LibrisResult<bool> {
        validate_name("first_name", first_name)?;
        validate_name("last_name", last_name)?;
        self.transaction(|uow| {
            let Some(mut author) = uow.author(id) else {
                return Ok(false);
            };
            author.first_name = first_name.to_string();
            author.last_name = last_name.to_string();
            uow.put_author(author);
            Ok(true)
        })
    }

    /// Create a book owned by `author`; `None` if the author does not exist
    pub fn add_book(&self, title: &str, author: AuthorId) -> LibrisResult<Option<BookId>> {
        validate_title(title)?;
        self.transaction(|uow| {
            let Some(mut owner) = uow.author(author) else {
                return Ok(None);
            };
            let id = BookId(uow.next_id());
            owner.books.insert(id);
            uow.put_author(owner);
            uow.put_book(Book::new(id, title, author));
            Ok(Some(id))
        })
    }

    /// Retitle a book; `false` if it does not exist
    ///
    /// The owner's document picks up the new title in the same unit of work.
    pub fn update_book(&self, id: BookId, title: &str) -> LibrisResult<bool> {
        validate_title(title)?;
        self.transaction(|uow| {
            let Some(mut book) = uow.book(id) else {
                return Ok(false);
            };
            book.title = title.to_string();
            uow.put_book(book);
            Ok(true)
        })
    }

    /// Delete a book and detach it from its author; `false` if it does not exist
    pub fn delete_book(&self, id: BookId) -> LibrisResult<bool> {
        self.transaction(|uow| {
            let Some(book) = uow.book(id) else {
                return Ok(false);
            };
            if let Some(mut owner) = uow.author(book.author) {
                owner.books.remove(&id);
                uow.put_author(owner);
            }
            uow.delete_book(id);
            Ok(true)
        })
    }

    /// Delete an author and every book it owns; `false` if it does not exist
    pub fn delete_author(&self, id: AuthorId) -> LibrisResult<bool> {
        self.transaction(|uow| {
            let Some(author) = uow.author(id) else {
                return Ok(false);
            };
            for book in &author.books {
                uow.delete_book(*book);
            }
            uow.delete_author(id);
            Ok(true)
        })
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Run any query
    pub fn execute(&self, spec: &QuerySpec) -> LibrisResult<SearchResponse> {
        self.engine.execute(spec)
    }

    /// Time a query without materializing its results for the caller
    pub fn execute_time(&self, spec: &QuerySpec) -> LibrisResult<Duration> {
        Ok(self.engine.execute(spec)?.stats.elapsed)
    }

    /// Every author, by last then first name
    pub fn list_authors(&self) -> LibrisResult<Vec<Author>> {
        self.execute(&Self::list_authors_spec()).map(authors)
    }

    /// Timing variant of [`list_authors`](Self::list_authors)
    pub fn list_authors_time(&self) -> LibrisResult<Duration> {
        self.execute_time(&Self::list_authors_spec())
    }

    /// The author with `id`, if indexed
    pub fn author_by_id(&self, id: AuthorId) -> LibrisResult<Option<Author>> {
        self.execute(&Self::author_by_id_spec(id))
            .map(|resp| authors(resp).into_iter().next())
    }

    /// Timing variant of [`author_by_id`](Self::author_by_id)
    pub fn author_by_id_time(&self, id: AuthorId) -> LibrisResult<Duration> {
        self.execute_time(&Self::author_by_id_spec(id))
    }

    /// Authors matching a query string over names and book titles, by name
    pub fn search_authors(&self, pattern: &str, size: Option<usize>) -> LibrisResult<Vec<Author>> {
        self.execute(&Self::search_authors_spec(pattern, size)).map(authors)
    }

    /// Timing variant of [`search_authors`](Self::search_authors)
    pub fn search_authors_time(&self, pattern: &str, size: Option<usize>) -> LibrisResult<Duration> {
        self.execute_time(&Self::search_authors_spec(pattern, size))
    }

    /// Every book, by title
    pub fn list_books(&self) -> LibrisResult<Vec<Book>> {
        self.execute(&Self::list_books_spec()).map(books)
    }

    /// Timing variant of [`list_books`](Self::list_books)
    pub fn list_books_time(&self) -> LibrisResult<Duration> {
        self.execute_time(&Self::list_books_spec())
    }

    /// One page of all books by title; `page` starts at 1
    pub fn list_books_page(&self, page: u32, limit: u32) -> LibrisResult<Vec<Book>> {
        self.execute(&Self::list_books_page_spec(page, limit)?).map(books)
    }

    /// Timing variant of [`list_books_page`](Self::list_books_page)
    pub fn list_books_page_time(&self, page: u32, limit: u32) -> LibrisResult<Duration> {
        self.execute_time(&Self::list_books_page_spec(page, limit)?)
    }

    /// The book with `id`, if indexed
    pub fn book_by_id(&self, id: BookId) -> LibrisResult<Option<Book>> {
        self.execute(&Self::book_by_id_spec(id))
            .map(|resp| books(resp).into_iter().next())
    }

    /// Timing variant of [`book_by_id`](Self::book_by_id)
    pub fn book_by_id_time(&self, id: BookId) -> LibrisResult<Duration> {
        self.execute_time(&Self::book_by_id_spec(id))
    }

    /// Books matching a query string over the title, by relevance
    pub fn search_books(&self, pattern: &str, size: Option<usize>) -> LibrisResult<Vec<Book>> {
        self.execute(&Self::search_books_spec(pattern, size)).map(books)
    }

    /// Timing variant of [`search_books`](Self::search_books)
    pub fn search_books_time(&self, pattern: &str, size: Option<usize>) -> LibrisResult<Duration> {
        self.execute_time(&Self::search_books_spec(pattern, size))
    }

    /// Books whose title words match a `*`/`?` pattern
    pub fn search_books_wildcard(&self, pattern: &str, size: Option<usize>) -> LibrisResult<Vec<Book>> {
        self.execute(&Self::wildcard_spec(pattern, size)).map(books)
    }

    /// Timing variant of [`search_books_wildcard`](Self::search_books_wildcard)
    pub fn search_books_wildcard_time(&self, pattern: &str, size: Option<usize>) -> LibrisResult<Duration> {
        self.execute_time(&Self::wildcard_spec(pattern, size))
    }

    /// Books whose title contains the phrase within the configured slop
    pub fn search_books_phrase(&self, pattern: &str, size: Option<usize>) -> LibrisResult<Vec<Book>> {
        self.execute(&Self::phrase_spec(pattern, size)).map(books)
    }

    /// Timing variant of [`search_books_phrase`](Self::search_books_phrase)
    pub fn search_books_phrase_time(&self, pattern: &str, size: Option<usize>) -> LibrisResult<Duration> {
        self.execute_time(&Self::phrase_spec(pattern, size))
    }

    /// Books whose title does not match the pattern
    pub fn search_books_except(&self, pattern: &str, size: Option<usize>) -> LibrisResult<Vec<Book>> {
        self.execute(&Self::exclusion_spec(pattern, size)).map(books)
    }

    /// Timing variant of [`search_books_except`](Self::search_books_except)
    pub fn search_books_except_time(&self, pattern: &str, size: Option<usize>) -> LibrisResult<Duration> {
        self.execute_time(&Self::exclusion_spec(pattern, size))
    }

    /// Books whose title terms are within the configured edit distance
    pub fn search_books_fuzzy(&self, pattern: &str, size: Option<usize>) -> LibrisResult<Vec<Book>> {
        self.execute(&Self::fuzzy_spec(pattern, size)).map(books)
    }

    /// Timing variant of [`search_books_fuzzy`](Self::search_books_fuzzy)
    pub fn search_books_fuzzy_time(&self, pattern: &str, size: Option<usize>) -> LibrisResult<Duration> {
        self.execute_time(&Self::fuzzy_spec(pattern, size))
    }

    // ------------------------------------------------------------------------
    // Query specs
    // ------------------------------------------------------------------------

    fn list_authors_spec() -> QuerySpec {
        QuerySpec::match_all(EntityKind::Author)
    }

    fn author_by_id_spec(id: AuthorId) -> QuerySpec {
        QuerySpec::new(EntityKind::Author, QueryMode::ById(id.get()))
    }

    fn search_authors_spec(pattern: &str, size: Option<usize>) -> QuerySpec {
        QuerySpec::new(
            EntityKind::Author,
            QueryMode::Simple {
                pattern: pattern.to_string(),
            },
        )
        .with_size_opt(size)
    }

    fn list_books_spec() -> QuerySpec {
        QuerySpec::match_all(EntityKind::Book)
    }

    fn list_books_page_spec(page: u32, limit: u32) -> LibrisResult<QuerySpec> {
        Ok(QuerySpec::match_all(EntityKind::Book).with_page(PageRequest::new(page, limit)?))
    }

    fn book_by_id_spec(id: BookId) -> QuerySpec {
        QuerySpec::new(EntityKind::Book, QueryMode::ById(id.get()))
    }

    fn search_books_spec(pattern: &str, size: Option<usize>) -> QuerySpec {
        QuerySpec::new(
            EntityKind::Book,
            QueryMode::Simple {
                pattern: pattern.to_string(),
            },
        )
        .with_size_opt(size)
    }

    fn wildcard_spec(pattern: &str, size: Option<usize>) -> QuerySpec {
        QuerySpec::new(
            EntityKind::Book,
            QueryMode::Wildcard {
                pattern: pattern.to_string(),
            },
        )
        .with_fields([TITLE])
        .with_size_opt(size)
    }

    fn phrase_spec(pattern: &str, size: Option<usize>) -> QuerySpec {
        QuerySpec::new(
            EntityKind::Book,
            QueryMode::Phrase {
                pattern: pattern.to_string(),
                slop: None,
            },
        )
        .with_fields([TITLE])
        .with_size_opt(size)
    }

    fn exclusion_spec(pattern: &str, size: Option<usize>) -> QuerySpec {
        QuerySpec::new(
            EntityKind::Book,
            QueryMode::Exclusion {
                pattern: pattern.to_string(),
            },
        )
        .with_fields([TITLE])
        .with_size_opt(size)
    }

    fn fuzzy_spec(pattern: &str, size: Option<usize>) -> QuerySpec {
        QuerySpec::new(
            EntityKind::Book,
            QueryMode::Fuzzy {
                pattern: pattern.to_string(),
                max_edits: None,
                prefix_length: None,
            },
        )
        .with_fields([TITLE])
        .with_size_opt(size)
    }

    // ========================================================================
    // Maintenance
    // ========================================================================

    /// Reindex every stored entity
    ///
    /// # Errors
    ///
    /// `Rebuild` if a rebuild is already running or any entity fails to
    /// index.
    pub fn rebuild_all(&self) -> LibrisResult<RebuildReport> {
        self.coordinator.rebuild_all()
    }

    /// Counts across store, index and units of work
    pub fn stats(&self) -> LibraryStats {
        let store = self.coordinator.store();
        LibraryStats {
            stored_authors: store.count_authors(),
            stored_books: store.count_books(),
            index: self.engine.index().stats(),
            transactions: self.coordinator.metrics(),
        }
    }
}

fn authors(resp: SearchResponse) -> Vec<Author> {
    resp.hits
        .into_iter()
        .filter_map(|hit| match hit.source {
            Entity::Author(a) => Some(a),
            Entity::Book(_) => None,
        })
        .collect()
}

fn books(resp: SearchResponse) -> Vec<Book> {
    resp.hits
        .into_iter()
        .filter_map(|hit| match hit.source {
            Entity::Book(b) => Some(b),
            Entity::Author(_) => None,
        })
        .collect()
}
