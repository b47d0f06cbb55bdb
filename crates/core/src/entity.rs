//! Catalog entities
//!
//! Ownership is explicit: an [`Author`] owns the set of its book ids, a
//! [`Book`] holds a non-owning reference to its author. Deletion logic in
//! the engine walks this ownership rather than relying on implicit cascade.

use crate::types::{AuthorId, BookId, EntityRef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A catalog author
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// Store-assigned id
    pub id: AuthorId,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Books owned by this author
    pub books: BTreeSet<BookId>,
}

impl Author {
    /// Create an author with no books
    pub fn new(id: AuthorId, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Author {
            id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            books: BTreeSet::new(),
        }
    }

    /// Builder: attach a book id
    pub fn with_book(mut self, book: BookId) -> Self {
        self.books.insert(book);
        self
    }
}

/// A catalog book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Store-assigned id
    pub id: BookId,
    /// Title
    pub title: String,
    /// Owning author
    pub author: AuthorId,
}

impl Book {
    /// Create a book owned by `author`
    pub fn new(id: BookId, title: impl Into<String>, author: AuthorId) -> Self {
        Book {
            id,
            title: title.into(),
            author,
        }
    }
}

/// Either entity, used where the store or synchronizer handles both kinds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Entity {
    /// An author record
    Author(Author),
    /// A book record
    Book(Book),
}

impl Entity {
    /// Reference to this entity
    pub fn entity_ref(&self) -> EntityRef {
        match self {
            Entity::Author(a) => EntityRef::Author(a.id),
            Entity::Book(b) => EntityRef::Book(b.id),
        }
    }
}

impl From<Author> for Entity {
    fn from(a: Author) -> Self {
        Entity::Author(a)
    }
}

impl From<Book> for Entity {
    fn from(b: Book) -> Self {
        Entity::Book(b)
    }
}
