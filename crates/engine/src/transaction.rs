//! Unit of work
//!
//! A [`UnitOfWork`] stages entity changes over a read-through view of the
//! record store. Nothing touches the store or the index until the owning
//! [`Library`](crate::Library) commits it:
//!
//! 1. derive every affected index document from the staged post-state
//! 2. apply the store batch, keeping its undo batch
//! 3. apply the index batch; on failure, apply the undo batch
//!
//! A failure in step 1 leaves both sides untouched. Units of work run one
//! at a time under the library's commit lock.

use crate::sync::EntityView;
use libris_core::{
    Author, AuthorId, Book, BookId, Entity, EntityRef, RecordStore, WriteBatch, WriteOp,
};
use std::collections::BTreeMap;

/// A staged change to one entity
#[derive(Debug, Clone, PartialEq)]
pub struct StagedChange {
    /// State in the store when the unit of work first touched the entity
    pub prior: Option<Entity>,
    /// State after commit; `None` deletes
    pub post: Option<Entity>,
}

/// Staged changes over a read-through view of the store
///
/// # Usage
///
/// ```ignore
/// library.transaction(|uow| {
///     let mut author = match uow.author(id) {
///         Some(a) => a,
///         None => return Ok(false),
///     };
///     author.last_name = "Austen".into();
///     uow.put_author(author);
///     Ok(true)
/// })?;
/// ```
pub struct UnitOfWork<'a> {
    store: &'a dyn RecordStore,
    id: u64,
    changes: BTreeMap<EntityRef, StagedChange>,
}

impl<'a> UnitOfWork<'a> {
    pub(crate) fn new(store: &'a dyn RecordStore, id: u64) -> Self {
        UnitOfWork {
            store,
            id,
            changes: BTreeMap::new(),
        }
    }

    /// Identifier used in logs
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Current author, including staged changes
    pub fn author(&self, id: AuthorId) -> Option<Author> {
        match self.changes.get(&EntityRef::Author(id)) {
            Some(change) => match &change.post {
                Some(Entity::Author(a)) => Some(a.clone()),
                _ => None,
            },
            None => self.store.find_author(id),
        }
    }

    /// Current book, including staged changes
    pub fn book(&self, id: BookId) -> Option<Book> {
        match self.changes.get(&EntityRef::Book(id)) {
            Some(change) => match &change.post {
                Some(Entity::Book(b)) => Some(b.clone()),
                _ => None,
            },
            None => self.store.find_book(id),
        }
    }

    /// Allocate an id from the store sequence
    ///
    /// Ids are never reused, even if this unit of work is rolled back.
    pub fn next_id(&self) -> u64 {
        self.store.next_id()
    }

    /// Stage an insert or update
    pub fn put_author(&mut self, author: Author) {
        self.stage(EntityRef::Author(author.id), Some(Entity::Author(author)));
    }

    /// Stage an insert or update
    pub fn put_book(&mut self, book: Book) {
        self.stage(EntityRef::Book(book.id), Some(Entity::Book(book)));
    }

    /// Stage a deletion
    pub fn delete_author(&mut self, id: AuthorId) {
        self.stage(EntityRef::Author(id), None);
    }

    /// Stage a deletion
    pub fn delete_book(&mut self, id: BookId) {
        self.stage(EntityRef::Book(id), None);
    }

    fn stage(&mut self, entity: EntityRef, post: Option<Entity>) {
        let store = self.store;
        self.changes
            .entry(entity)
            .or_insert_with(|| StagedChange {
                prior: lookup(store, entity),
                post: None,
            })
            .post = post;
    }

    /// True when nothing is staged
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Staged changes in entity order
    pub fn changes(&self) -> impl Iterator<Item = (&EntityRef, &StagedChange)> {
        self.changes.iter()
    }

    /// Store batch reaching the staged post-state
    ///
    /// Entities created and deleted within this unit of work produce nothing.
    pub(crate) fn write_batch(&self) -> WriteBatch {
        self.changes
            .iter()
            .filter_map(|(entity, change)| match (&change.post, &change.prior) {
                (Some(Entity::Author(a)), _) => Some(WriteOp::PutAuthor(a.clone())),
                (Some(Entity::Book(b)), _) => Some(WriteOp::PutBook(b.clone())),
                (None, Some(_)) => Some(match entity {
                    EntityRef::Author(id) => WriteOp::DeleteAuthor(*id),
                    EntityRef::Book(id) => WriteOp::DeleteBook(*id),
                }),
                (None, None) => None,
            })
            .collect()
    }
}

fn lookup(store: &dyn RecordStore, entity: EntityRef) -> Option<Entity> {
    match entity {
        EntityRef::Author(id) => store.find_author(id).map(Entity::Author),
        EntityRef::Book(id) => store.find_book(id).map(Entity::Book),
    }
}

impl EntityView for UnitOfWork<'_> {
    fn author(&self, id: AuthorId) -> Option<Author> {
        UnitOfWork::author(self, id)
    }

    fn book(&self, id: BookId) -> Option<Book> {
        UnitOfWork::book(self, id)
    }
}
