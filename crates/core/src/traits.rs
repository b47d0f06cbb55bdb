//! Record store contract
//!
//! The relational record store is an external collaborator. The engine only
//! relies on this trait: lookups by id, counts, id enumeration for bulk
//! reindex, and atomic application of a [`WriteBatch`].

use crate::entity::{Author, Book};
use crate::error::LibrisResult;
use crate::types::{AuthorId, BookId, EntityRef};

/// A single staged store mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Create or replace an author
    PutAuthor(Author),
    /// Create or replace a book
    PutBook(Book),
    /// Remove an author (no-op if absent)
    DeleteAuthor(AuthorId),
    /// Remove a book (no-op if absent)
    DeleteBook(BookId),
}

impl WriteOp {
    /// Entity touched by this op
    pub fn entity_ref(&self) -> EntityRef {
        match self {
            WriteOp::PutAuthor(a) => EntityRef::Author(a.id),
            WriteOp::PutBook(b) => EntityRef::Book(b.id),
            WriteOp::DeleteAuthor(id) => EntityRef::Author(*id),
            WriteOp::DeleteBook(id) => EntityRef::Book(*id),
        }
    }

    /// True for delete ops
    pub fn is_delete(&self) -> bool {
        matches!(self, WriteOp::DeleteAuthor(_) | WriteOp::DeleteBook(_))
    }
}

/// Ordered list of store mutations applied all-or-nothing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    /// Create an empty batch
    pub fn new() -> Self {
        WriteBatch { ops: Vec::new() }
    }

    /// Append an op
    pub fn push(&mut self, op: WriteOp) {
        self.ops.push(op);
    }

    /// Staged ops in application order
    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    /// Consume into ops
    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }

    /// Number of staged ops
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// True if nothing is staged
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl FromIterator<WriteOp> for WriteBatch {
    fn from_iter<T: IntoIterator<Item = WriteOp>>(iter: T) -> Self {
        WriteBatch {
            ops: iter.into_iter().collect(),
        }
    }
}

/// Durable record storage for authors and books
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the engine shares one store
/// across all request threads.
///
/// # Atomicity
///
/// [`RecordStore::apply`] applies a whole batch or nothing and returns the
/// undo batch that restores the prior state. The engine uses the undo batch
/// to roll a committed store change back if the index update fails.
pub trait RecordStore: Send + Sync {
    /// Look up an author
    fn find_author(&self, id: AuthorId) -> Option<Author>;

    /// Look up a book
    fn find_book(&self, id: BookId) -> Option<Book>;

    /// Number of stored authors
    fn count_authors(&self) -> usize;

    /// Number of stored books
    fn count_books(&self) -> usize;

    /// Ids of all stored authors, ascending
    fn author_ids(&self) -> Vec<AuthorId>;

    /// Ids of all stored books, ascending
    fn book_ids(&self) -> Vec<BookId>;

    /// Allocate the next surrogate id from the store-wide sequence
    fn next_id(&self) -> u64;

    /// Apply a batch atomically, returning its undo batch
    fn apply(&self, batch: WriteBatch) -> LibrisResult<WriteBatch>;

    /// True when the store holds no entities
    fn is_empty(&self) -> bool {
        self.count_authors() == 0 && self.count_books() == 0
    }
}
