//! In-memory record store
//!
//! # Design
//!
//! - DashMap tables keyed by id, FxHash for fast integer hashing
//! - One store-wide id sequence shared by authors and books
//! - A batch gate (`RwLock<()>`) makes [`RecordStore::apply`] atomic with
//!   respect to readers: lookups take the read side, batches the write side
//!
//! # Thread Safety
//!
//! All operations are thread-safe. Readers never observe half of a batch.

use dashmap::DashMap;
use libris_core::{
    Author, AuthorId, Book, BookId, LibrisResult, RecordStore, WriteBatch, WriteOp,
};
use parking_lot::RwLock;
use rustc_hash::FxBuildHasher;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

/// In-memory implementation of [`RecordStore`]
///
/// # Example
///
/// ```
/// use libris_core::{Author, AuthorId, RecordStore, WriteBatch, WriteOp};
/// use libris_storage::MemoryStore;
///
/// let store = MemoryStore::new();
/// let id = AuthorId(store.next_id());
/// let mut batch = WriteBatch::new();
/// batch.push(WriteOp::PutAuthor(Author::new(id, "Jane", "Austen")));
/// store.apply(batch).unwrap();
///
/// assert_eq!(store.count_authors(), 1);
/// ```
pub struct MemoryStore {
    authors: DashMap<AuthorId, Author, FxBuildHasher>,
    books: DashMap<BookId, Book, FxBuildHasher>,
    /// Last id handed out by the sequence
    sequence: AtomicU64,
    /// Number of batches applied
    version: AtomicU64,
    /// Serializes batches against readers
    gate: RwLock<()>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        MemoryStore {
            authors: DashMap::with_hasher(FxBuildHasher::default()),
            books: DashMap::with_hasher(FxBuildHasher::default()),
            sequence: AtomicU64::new(0),
            version: AtomicU64::new(0),
            gate: RwLock::new(()),
        }
    }

    /// Number of batches applied so far
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// All authors, ascending by id
    pub fn authors(&self) -> Vec<Author> {
        let _guard = self.gate.read();
        let mut all: Vec<Author> = self.authors.iter().map(|r| r.value().clone()).collect();
        all.sort_by_key(|a| a.id);
        all
    }

    /// All books, ascending by id
    pub fn books(&self) -> Vec<Book> {
        let _guard = self.gate.read();
        let mut all: Vec<Book> = self.books.iter().map(|r| r.value().clone()).collect();
        all.sort_by_key(|b| b.id);
        all
    }

    /// Apply one op and return the op that undoes it
    fn apply_op(&self, op: WriteOp) -> Option<WriteOp> {
        match op {
            WriteOp::PutAuthor(author) => {
                let id = author.id;
                match self.authors.insert(id, author) {
                    Some(prior) => Some(WriteOp::PutAuthor(prior)),
                    None => Some(WriteOp::DeleteAuthor(id)),
                }
            }
            WriteOp::PutBook(book) => {
                let id = book.id;
                match self.books.insert(id, book) {
                    Some(prior) => Some(WriteOp::PutBook(prior)),
                    None => Some(WriteOp::DeleteBook(id)),
                }
            }
            WriteOp::DeleteAuthor(id) => self
                .authors
                .remove(&id)
                .map(|(_, prior)| WriteOp::PutAuthor(prior)),
            WriteOp::DeleteBook(id) => self
                .books
                .remove(&id)
                .map(|(_, prior)| WriteOp::PutBook(prior)),
        }
    }
}

impl RecordStore for MemoryStore {
    fn find_author(&self, id: AuthorId) -> Option<Author> {
        let _guard = self.gate.read();
        self.authors.get(&id).map(|r| r.value().clone())
    }

    fn find_book(&self, id: BookId) -> Option<Book> {
        let _guard = self.gate.read();
        self.books.get(&id).map(|r| r.value().clone())
    }

    fn count_authors(&self) -> usize {
        let _guard = self.gate.read();
        self.authors.len()
    }

    fn count_books(&self) -> usize {
        let _guard = self.gate.read();
        self.books.len()
    }

    fn author_ids(&self) -> Vec<AuthorId> {
        let _guard = self.gate.read();
        let mut ids: Vec<AuthorId> = self.authors.iter().map(|r| *r.key()).collect();
        ids.sort_unstable();
        ids
    }

    fn book_ids(&self) -> Vec<BookId> {
        let _guard = self.gate.read();
        let mut ids: Vec<BookId> = self.books.iter().map(|r| *r.key()).collect();
        ids.sort_unstable();
        ids
    }

    fn next_id(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::AcqRel) + 1
    }

    fn apply(&self, batch: WriteBatch) -> LibrisResult<WriteBatch> {
        let _guard = self.gate.write();
        let op_count = batch.len();

        // Undo ops are collected forward and replayed in reverse
        let mut undo: Vec<WriteOp> = Vec::with_capacity(op_count);
        for op in batch.into_ops() {
            if let Some(inverse) = self.apply_op(op) {
                undo.push(inverse);
            }
        }
        undo.reverse();

        let version = self.version.fetch_add(1, Ordering::AcqRel) + 1;
        trace!(target: "libris::store", version, ops = op_count, "Batch applied");

        Ok(undo.into_iter().collect())
    }
}
