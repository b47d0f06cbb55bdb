//! Identifier and reference types
//!
//! Every persisted entity receives a surrogate id from a single store-wide
//! sequence. `AuthorId` and `BookId` are distinct newtypes over that
//! sequence so the two id spaces cannot be mixed up at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an [`Author`](crate::Author)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthorId(pub u64);

/// Identifier of a [`Book`](crate::Book)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(pub u64);

impl AuthorId {
    /// Raw sequence value
    pub fn get(self) -> u64 {
        self.0
    }
}

impl BookId {
    /// Raw sequence value
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AuthorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The two indexed entity types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    /// Author entity
    Author,
    /// Book entity
    Book,
}

impl EntityKind {
    /// All entity kinds in a stable order
    pub const ALL: [EntityKind; 2] = [EntityKind::Author, EntityKind::Book];

    /// Stable lowercase name used in logs and error messages
    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Author => "author",
            EntityKind::Book => "book",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Back-pointer from an index document to its source entity
///
/// Index documents have no identity of their own; they are addressed by
/// the entity they project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityRef {
    /// Reference to an author
    Author(AuthorId),
    /// Reference to a book
    Book(BookId),
}

impl EntityRef {
    /// Entity kind of the referenced record
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityRef::Author(_) => EntityKind::Author,
            EntityRef::Book(_) => EntityKind::Book,
        }
    }

    /// Raw id value regardless of kind
    pub fn raw_id(&self) -> u64 {
        match self {
            EntityRef::Author(id) => id.0,
            EntityRef::Book(id) => id.0,
        }
    }
}

impl From<AuthorId> for EntityRef {
    fn from(id: AuthorId) -> Self {
        EntityRef::Author(id)
    }
}

impl From<BookId> for EntityRef {
    fn from(id: BookId) -> Self {
        EntityRef::Book(id)
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind(), self.raw_id())
    }
}
