//! Index synchronizer
//!
//! Keeps the search index in step with the record store. Mutations never
//! touch the index directly: the synchronizer reads the post-mutation state
//! through an [`EntityView`] and turns it into [`IndexOp`]s.
//!
//! ## Re-derivation Rules
//!
//! | Change              | Documents re-derived                           |
//! |---------------------|------------------------------------------------|
//! | author written      | the author                                     |
//! | author deleted      | the author (removed)                           |
//! | book written        | the book, its owner, its previous owner        |
//! | book deleted        | the book (removed), its previous owner         |
//!
//! An author document embeds every title it owns, so any book change
//! rewrites the owner's document too.
//!
//! ## Rebuild
//!
//! [`IndexSynchronizer::rebuild_all`] re-derives every stored entity, one
//! document at a time under the commit lock, then purges documents whose
//! entity no longer exists. A second rebuild started while one runs is
//! rejected.

use crate::transaction::UnitOfWork;
use libris_core::{
    Author, AuthorId, Book, BookId, Entity, EntityKind, EntityRef, LibrisError, LibrisResult,
    RecordStore,
};
use libris_search::{IndexDocument, IndexOp, Projection, SearchIndex};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, trace, warn};

// ============================================================================
// EntityView
// ============================================================================

/// Read access to entity state used for derivation
pub trait EntityView {
    /// Look up an author
    fn author(&self, id: AuthorId) -> Option<Author>;

    /// Look up a book
    fn book(&self, id: BookId) -> Option<Book>;

    /// Look up either entity
    fn entity(&self, entity: EntityRef) -> Option<Entity> {
        match entity {
            EntityRef::Author(id) => self.author(id).map(Entity::Author),
            EntityRef::Book(id) => self.book(id).map(Entity::Book),
        }
    }
}

/// Committed store state
pub struct StoreView<'a>(pub &'a dyn RecordStore);

impl EntityView for StoreView<'_> {
    fn author(&self, id: AuthorId) -> Option<Author> {
        self.0.find_author(id)
    }

    fn book(&self, id: BookId) -> Option<Book> {
        self.0.find_book(id)
    }
}

// ============================================================================
// RebuildReport
// ============================================================================

/// Outcome of a full reindex
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebuildReport {
    /// Author documents written
    pub authors: usize,
    /// Book documents written
    pub books: usize,
    /// Documents removed because their entity is gone
    pub purged: usize,
    /// Vacated doc id slots reclaimed by compaction
    pub compacted: usize,
    /// Wall time of the rebuild
    pub elapsed: Duration,
}

/// Clears the running flag when a rebuild ends, however it ends
struct RebuildGuard<'a>(&'a AtomicBool);

impl<'a> RebuildGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> LibrisResult<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| LibrisError::rebuild("a rebuild is already running"))?;
        Ok(RebuildGuard(flag))
    }
}

impl Drop for RebuildGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// ============================================================================
// IndexSynchronizer
// ============================================================================

/// Derives index changes from entity changes
pub struct IndexSynchronizer {
    projection: Projection,
    index: Arc<SearchIndex>,
    rebuilding: AtomicBool,
}

impl IndexSynchronizer {
    /// Create a synchronizer writing to `index`
    pub fn new(index: Arc<SearchIndex>, projection: Projection) -> Self {
        IndexSynchronizer {
            projection,
            index,
            rebuilding: AtomicBool::new(false),
        }
    }

    /// The index this synchronizer maintains
    pub fn index(&self) -> &Arc<SearchIndex> {
        &self.index
    }

    /// True while [`rebuild_all`](Self::rebuild_all) runs
    pub fn is_rebuilding(&self) -> bool {
        self.rebuilding.load(Ordering::Acquire)
    }

    /// Derive the current document of an entity; `None` if it does not exist
    pub fn derive(
        &self,
        view: &dyn EntityView,
        entity: EntityRef,
    ) -> LibrisResult<Option<IndexDocument>> {
        match entity {
            EntityRef::Author(id) => {
                let Some(author) = view.author(id) else {
                    return Ok(None);
                };
                let books: Vec<Book> = author.books.iter().filter_map(|b| view.book(*b)).collect();
                self.projection.derive_author(&author, &books).map(Some)
            }
            EntityRef::Book(id) => {
                let Some(book) = view.book(id) else {
                    return Ok(None);
                };
                let owner = view.author(book.author);
                if let Some(owner) = &owner {
                    if !owner.books.contains(&book.id) {
                        return Err(LibrisError::index_sync(
                            EntityKind::Book,
                            format!("book {} is not listed by author {}", book.id, owner.id),
                        ));
                    }
                }
                self.projection.derive_book(&book, owner.as_ref()).map(Some)
            }
        }
    }

    /// Index change bringing one entity's document up to date
    pub fn op_for(&self, view: &dyn EntityView, entity: EntityRef) -> LibrisResult<IndexOp> {
        Ok(match self.derive(view, entity)? {
            Some(doc) => IndexOp::Upsert(doc),
            None => IndexOp::Remove(entity),
        })
    }

    /// Index changes for an entity that was created or updated
    ///
    /// A book also re-derives its owning author.
    pub fn on_entity_written(
        &self,
        view: &dyn EntityView,
        entity: &Entity,
    ) -> LibrisResult<Vec<IndexOp>> {
        let mut ops = vec![self.op_for(view, entity.entity_ref())?];
        if let Entity::Book(book) = entity {
            ops.push(self.op_for(view, EntityRef::Author(book.author))?);
        }
        Ok(ops)
    }

    /// Index changes for an entity that was deleted
    ///
    /// `prior` is the entity as it was before deletion. A deleted book's
    /// owner is re-derived without it.
    pub fn on_entity_deleted(
        &self,
        view: &dyn EntityView,
        prior: &Entity,
    ) -> LibrisResult<Vec<IndexOp>> {
        let mut ops = vec![IndexOp::Remove(prior.entity_ref())];
        if let Entity::Book(book) = prior {
            ops.push(self.op_for(view, EntityRef::Author(book.author))?);
        }
        Ok(ops)
    }

    /// Index changes for everything a unit of work staged
    ///
    /// Ops are keyed by entity so each document is written once. Any
    /// derivation failure fails the whole plan.
    pub fn plan(&self, uow: &UnitOfWork<'_>) -> LibrisResult<Vec<IndexOp>> {
        let mut planned: BTreeMap<EntityRef, IndexOp> = BTreeMap::new();
        for (entity, change) in uow.changes() {
            let ops = match (&change.post, &change.prior) {
                (Some(post), _) => self.on_entity_written(uow, post)?,
                (None, Some(prior)) => self.on_entity_deleted(uow, prior)?,
                (None, None) => continue,
            };
            for op in ops {
                planned.insert(op_entity(&op), op);
            }
            // A book that changed owner also leaves its previous owner
            if let (Some(Entity::Book(before)), Some(Entity::Book(after))) =
                (&change.prior, &change.post)
            {
                if before.author != after.author {
                    let previous = EntityRef::Author(before.author);
                    planned.insert(previous, self.op_for(uow, previous)?);
                }
            }
            trace!(target: "libris::sync", uow = uow.id(), entity = %entity, "planned");
        }
        Ok(planned.into_values().collect())
    }

    /// Reindex every stored entity
    ///
    /// Each document is re-derived from the store under `commit_lock`, so a
    /// concurrent unit of work either lands before the re-read or after the
    /// write. Running it twice yields the same index.
    ///
    /// # Errors
    ///
    /// `Rebuild` when another rebuild is running or when any entity cannot
    /// be indexed. Entities that did index remain indexed.
    pub fn rebuild_all(
        &self,
        store: &dyn RecordStore,
        commit_lock: &Mutex<()>,
    ) -> LibrisResult<RebuildReport> {
        let _running = RebuildGuard::acquire(&self.rebuilding)?;
        let start = Instant::now();
        info!(
            target: "libris::sync",
            authors = store.count_authors(),
            books = store.count_books(),
            "Index rebuild started"
        );

        let mut report = RebuildReport::default();
        let mut failures: Vec<(EntityRef, LibrisError)> = Vec::new();

        for kind in EntityKind::ALL {
            let entities: Vec<EntityRef> = match kind {
                EntityKind::Author => store.author_ids().into_iter().map(EntityRef::Author).collect(),
                EntityKind::Book => store.book_ids().into_iter().map(EntityRef::Book).collect(),
            };
            for entity in entities {
                let _commit = commit_lock.lock();
                let result = self
                    .op_for(&StoreView(store), entity)
                    .and_then(|op| {
                        let written = matches!(op, IndexOp::Upsert(_));
                        self.index.apply(vec![op]).map(|()| written)
                    });
                match result {
                    Ok(true) => match kind {
                        EntityKind::Author => report.authors += 1,
                        EntityKind::Book => report.books += 1,
                    },
                    Ok(false) => {}
                    Err(e) => {
                        warn!(target: "libris::sync", entity = %entity, error = %e, "Entity failed to reindex");
                        failures.push((entity, e));
                    }
                }
            }

            let _commit = commit_lock.lock();
            report.purged += self.purge_orphans(store, kind);
            report.compacted += self.index.compact(kind);
        }

        report.elapsed = start.elapsed();
        if let Some((entity, first)) = failures.first() {
            return Err(LibrisError::rebuild(format!(
                "{} entities failed to reindex, first {}: {}",
                failures.len(),
                entity,
                first
            )));
        }

        info!(
            target: "libris::sync",
            authors = report.authors,
            books = report.books,
            purged = report.purged,
            compacted = report.compacted,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Index rebuild finished"
        );
        Ok(report)
    }

    /// Remove documents whose entity is no longer stored
    fn purge_orphans(&self, store: &dyn RecordStore, kind: EntityKind) -> usize {
        let view = StoreView(store);
        self.index
            .entity_ids(kind)
            .into_iter()
            .map(|id| match kind {
                EntityKind::Author => EntityRef::Author(AuthorId(id)),
                EntityKind::Book => EntityRef::Book(BookId(id)),
            })
            .filter(|entity| view.entity(*entity).is_none())
            .filter(|entity| self.index.remove(*entity))
            .count()
    }
}

fn op_entity(op: &IndexOp) -> EntityRef {
    match op {
        IndexOp::Upsert(doc) => doc.entity_ref,
        IndexOp::Remove(entity) => *entity,
    }
}
