//! Inverted index
//!
//! This module provides:
//! - Segment: one entity type's documents with positional postings
//! - SearchIndex: both segments, each behind its own `RwLock`
//! - Batched, validated application of index operations
//! - Version watermark for consistency
//!
//! # Document ids
//!
//! Each segment maps entity ids to compact `u32` doc ids, assigned the
//! first time an entity is indexed and kept across re-indexing. Doc id
//! order is therefore first-indexed order, which is the final tie-break of
//! every sort. Removal leaves an empty slot behind; `compact` renumbers the
//! live documents densely in the same order.
//!
//! # Dictionaries
//!
//! Per text field a segment keeps three dictionaries:
//! - terms: analyzed term -> doc id -> positions (scored queries)
//! - words: unanalyzed word -> doc ids (wildcard and prefix)
//! - values: whole normalized value -> doc ids (wildcard)

use crate::projection::{self, FieldKind, IndexDocument, IndexedField};
use crate::scorer::TermStats;
use libris_core::{EntityKind, EntityRef, LibrisError, LibrisResult};
use parking_lot::{RwLock, RwLockReadGuard};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};

/// Compact per-segment document id
pub type DocId = u32;

/// Term positions within one field of one document
pub type Positions = SmallVec<[u32; 4]>;

/// Postings of one term: doc id -> positions
pub type PostingList = FxHashMap<DocId, Positions>;

// ============================================================================
// FieldIndex
// ============================================================================

/// Dictionaries and length statistics of one text field
#[derive(Debug, Default)]
struct FieldIndex {
    terms: FxHashMap<String, PostingList>,
    words: FxHashMap<String, FxHashSet<DocId>>,
    values: FxHashMap<String, FxHashSet<DocId>>,
    /// Field length per document, only for non-empty fields
    lengths: FxHashMap<DocId, u32>,
    total_len: u64,
}

impl FieldIndex {
    /// Remove one document's entries, using the field it was indexed from
    fn remove_doc(&mut self, doc: DocId, field: &IndexedField) {
        for token in &field.tokens {
            if let Some(postings) = self.terms.get_mut(&token.term) {
                postings.remove(&doc);
                if postings.is_empty() {
                    self.terms.remove(&token.term);
                }
            }
        }
        for word in &field.words {
            remove_from_set(&mut self.words, word, doc);
        }
        for value in &field.values {
            remove_from_set(&mut self.values, value, doc);
        }
        if let Some(len) = self.lengths.remove(&doc) {
            self.total_len -= len as u64;
        }
    }
}

fn remove_from_set(dict: &mut FxHashMap<String, FxHashSet<DocId>>, key: &str, doc: DocId) {
    if let Some(docs) = dict.get_mut(key) {
        docs.remove(&doc);
        if docs.is_empty() {
            dict.remove(key);
        }
    }
}

// ============================================================================
// Segment
// ============================================================================

/// The documents of one entity type
#[derive(Debug)]
pub struct Segment {
    kind: EntityKind,
    /// doc id -> document (None once removed, until `compact`)
    docs: Vec<Option<IndexDocument>>,
    /// entity id -> doc id
    ids: FxHashMap<u64, DocId>,
    fields: FxHashMap<&'static str, FieldIndex>,
    live: usize,
    version: u64,
}

impl Segment {
    /// Create an empty segment
    pub fn new(kind: EntityKind) -> Self {
        let fields = projection::fields(kind)
            .iter()
            .filter(|f| matches!(f.kind, FieldKind::Text(_)))
            .map(|f| (f.name, FieldIndex::default()))
            .collect();
        Segment {
            kind,
            docs: Vec::new(),
            ids: FxHashMap::default(),
            fields,
            live: 0,
            version: 0,
        }
    }

    /// Entity type held by this segment
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Number of indexed documents
    pub fn len(&self) -> usize {
        self.live
    }

    /// True when no documents are indexed
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Number of doc id slots, vacated ones included
    pub fn slots(&self) -> usize {
        self.docs.len()
    }

    /// Number of changes applied to this segment
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Doc id of an entity
    pub fn doc_id(&self, id: u64) -> Option<DocId> {
        self.ids.get(&id).copied()
    }

    /// Document by doc id
    pub fn document(&self, doc: DocId) -> Option<&IndexDocument> {
        self.docs.get(doc as usize).and_then(Option::as_ref)
    }

    /// Document by entity id
    pub fn get(&self, id: u64) -> Option<&IndexDocument> {
        self.doc_id(id).and_then(|doc| self.document(doc))
    }

    /// Live documents in doc id order
    pub fn iter(&self) -> impl Iterator<Item = (DocId, &IndexDocument)> {
        self.docs
            .iter()
            .enumerate()
            .filter_map(|(doc, d)| d.as_ref().map(|d| (doc as DocId, d)))
    }

    /// Entity ids of all live documents
    pub fn entity_ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.ids.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Postings of a term in a field
    pub fn postings(&self, field: &str, term: &str) -> Option<&PostingList> {
        self.fields.get(field).and_then(|f| f.terms.get(term))
    }

    /// Term dictionary of a field
    pub fn terms<'a>(&'a self, field: &str) -> impl Iterator<Item = (&'a str, &'a PostingList)> + 'a {
        self.fields
            .get(field)
            .into_iter()
            .flat_map(|f| f.terms.iter().map(|(t, p)| (t.as_str(), p)))
    }

    /// Unanalyzed word dictionary of a field
    pub fn words<'a>(
        &'a self,
        field: &str,
    ) -> impl Iterator<Item = (&'a str, &'a FxHashSet<DocId>)> + 'a {
        self.fields
            .get(field)
            .into_iter()
            .flat_map(|f| f.words.iter().map(|(w, d)| (w.as_str(), d)))
    }

    /// Whole-value dictionary of a field
    pub fn values<'a>(
        &'a self,
        field: &str,
    ) -> impl Iterator<Item = (&'a str, &'a FxHashSet<DocId>)> + 'a {
        self.fields
            .get(field)
            .into_iter()
            .flat_map(|f| f.values.iter().map(|(v, d)| (v.as_str(), d)))
    }

    /// Length of a field in one document
    pub fn field_len(&self, field: &str, doc: DocId) -> u32 {
        self.fields
            .get(field)
            .and_then(|f| f.lengths.get(&doc).copied())
            .unwrap_or(0)
    }

    /// Average length of a field over documents where it is non-empty
    pub fn avg_field_len(&self, field: &str) -> f32 {
        match self.fields.get(field) {
            Some(f) if !f.lengths.is_empty() => f.total_len as f32 / f.lengths.len() as f32,
            _ => 0.0,
        }
    }

    /// Scoring statistics for `term` in `field` of `doc`
    pub fn term_stats(&self, field: &str, term: &str, doc: DocId) -> Option<TermStats> {
        let postings = self.postings(field, term)?;
        let positions = postings.get(&doc)?;
        Some(TermStats {
            tf: positions.len() as u32,
            field_len: self.field_len(field, doc),
            avg_field_len: self.avg_field_len(field),
            doc_freq: postings.len(),
            doc_count: self.live,
        })
    }

    /// Check a document against this segment's schema
    fn validate(&self, doc: &IndexDocument) -> LibrisResult<()> {
        if doc.kind() != self.kind {
            return Err(LibrisError::index_sync(
                self.kind,
                format!("{} document offered to {} segment", doc.kind(), self.kind),
            ));
        }
        for field in &doc.fields {
            if !self.fields.contains_key(field.name) {
                return Err(LibrisError::index_sync(
                    self.kind,
                    format!("unknown text field '{}'", field.name),
                ));
            }
        }
        let declared = projection::sort_fields(self.kind);
        if doc.sort_keys.len() != declared.len()
            || doc.sort_keys.iter().zip(declared).any(|((n, _), d)| n != d)
        {
            return Err(LibrisError::index_sync(
                self.kind,
                format!("sort keys of {} do not match the declared sort fields", doc.entity_ref),
            ));
        }
        Ok(())
    }

    /// Insert or replace a document, keeping its doc id
    fn upsert(&mut self, doc: IndexDocument) -> DocId {
        let id = doc.entity_ref.raw_id();
        let doc_id = match self.ids.get(&id) {
            Some(&existing) => {
                self.unindex(existing);
                existing
            }
            None => {
                let assigned = self.docs.len() as DocId;
                self.docs.push(None);
                self.ids.insert(id, assigned);
                self.live += 1;
                assigned
            }
        };

        for field in &doc.fields {
            let Some(index) = self.fields.get_mut(field.name) else {
                continue;
            };
            for token in &field.tokens {
                index
                    .terms
                    .entry(token.term.clone())
                    .or_default()
                    .entry(doc_id)
                    .or_default()
                    .push(token.position);
            }
            for word in &field.words {
                index.words.entry(word.clone()).or_default().insert(doc_id);
            }
            for value in &field.values {
                index.values.entry(value.clone()).or_default().insert(doc_id);
            }
            if !field.is_empty() {
                index.lengths.insert(doc_id, field.len());
                index.total_len += field.len() as u64;
            }
        }

        self.docs[doc_id as usize] = Some(doc);
        self.version += 1;
        doc_id
    }

    /// Remove a document; false if it was not indexed
    fn remove(&mut self, id: u64) -> bool {
        let Some(doc_id) = self.ids.remove(&id) else {
            return false;
        };
        self.unindex(doc_id);
        self.live -= 1;
        self.version += 1;
        true
    }

    /// Remove a document's postings and take it out of its slot
    fn unindex(&mut self, doc_id: DocId) {
        let Some(old) = self.docs.get_mut(doc_id as usize).and_then(Option::take) else {
            return;
        };
        for field in &old.fields {
            if let Some(index) = self.fields.get_mut(field.name) {
                index.remove_doc(doc_id, field);
            }
        }
    }

    /// Reassign doc ids densely, dropping vacated slots
    ///
    /// Live documents keep their relative doc id order. Returns the number
    /// of slots reclaimed.
    fn compact(&mut self) -> usize {
        let vacated = self.docs.len() - self.live;
        if vacated == 0 {
            return 0;
        }
        let version = self.version + 1;
        let docs = std::mem::take(&mut self.docs);
        *self = Segment::new(self.kind);
        for doc in docs.into_iter().flatten() {
            self.upsert(doc);
        }
        self.version = version;
        vacated
    }

    /// Drop every document and restart doc id assignment
    fn clear(&mut self) {
        let version = self.version + 1;
        *self = Segment::new(self.kind);
        self.version = version;
    }
}

// ============================================================================
// SearchIndex
// ============================================================================

/// A change to the index
#[derive(Debug, Clone, PartialEq)]
pub enum IndexOp {
    /// Insert or replace a document
    Upsert(IndexDocument),
    /// Remove an entity's document if present
    Remove(EntityRef),
}

impl IndexOp {
    fn kind(&self) -> EntityKind {
        match self {
            IndexOp::Upsert(doc) => doc.kind(),
            IndexOp::Remove(r) => r.kind(),
        }
    }
}

/// Document counts and version watermark
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndexStats {
    /// Indexed authors
    pub authors: usize,
    /// Indexed books
    pub books: usize,
    /// Batches applied since creation
    pub version: u64,
}

/// Index of both entity types
///
/// # Thread Safety
///
/// Each segment sits behind a `parking_lot::RwLock`. Queries hold the read
/// lock of their segment for their whole run; batches take the write locks
/// they need, always authors before books, so a query never observes part
/// of a batch.
///
/// # Version Watermark
///
/// Incremented once per applied batch.
pub struct SearchIndex {
    authors: RwLock<Segment>,
    books: RwLock<Segment>,
    /// Maximum documents per segment
    capacity: Option<usize>,
    version: AtomicU64,
}

impl Default for SearchIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchIndex {
    /// Create an empty, unbounded index
    pub fn new() -> Self {
        Self::with_capacity(None)
    }

    /// Create an empty index holding at most `capacity` documents per type
    pub fn with_capacity(capacity: Option<usize>) -> Self {
        SearchIndex {
            authors: RwLock::new(Segment::new(EntityKind::Author)),
            books: RwLock::new(Segment::new(EntityKind::Book)),
            capacity,
            version: AtomicU64::new(0),
        }
    }

    fn segment(&self, kind: EntityKind) -> &RwLock<Segment> {
        match kind {
            EntityKind::Author => &self.authors,
            EntityKind::Book => &self.books,
        }
    }

    /// Read access to one segment
    pub fn read(&self, kind: EntityKind) -> RwLockReadGuard<'_, Segment> {
        self.segment(kind).read()
    }

    /// Apply a batch of operations atomically
    ///
    /// The whole batch is validated under the write locks before anything
    /// changes; a rejected batch leaves the index untouched.
    pub fn apply(&self, ops: Vec<IndexOp>) -> LibrisResult<()> {
        if ops.is_empty() {
            return Ok(());
        }
        let touches = |kind| ops.iter().any(|op| op.kind() == kind);
        let mut authors = touches(EntityKind::Author).then(|| self.authors.write());
        let mut books = touches(EntityKind::Book).then(|| self.books.write());

        for kind in EntityKind::ALL {
            let segment = match kind {
                EntityKind::Author => authors.as_deref(),
                EntityKind::Book => books.as_deref(),
            };
            if let Some(segment) = segment {
                self.check(segment, &ops)?;
            }
        }

        for op in ops {
            let segment = match op.kind() {
                EntityKind::Author => authors.as_deref_mut(),
                EntityKind::Book => books.as_deref_mut(),
            };
            let Some(segment) = segment else {
                continue;
            };
            match op {
                IndexOp::Upsert(doc) => {
                    trace!(target: "libris::search", entity = %doc.entity_ref, "upsert document");
                    segment.upsert(doc);
                }
                IndexOp::Remove(r) => {
                    trace!(target: "libris::search", entity = %r, "remove document");
                    segment.remove(r.raw_id());
                }
            }
        }
        self.version.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    /// Validate the part of a batch aimed at one segment
    fn check(&self, segment: &Segment, ops: &[IndexOp]) -> LibrisResult<()> {
        let mut added: FxHashSet<u64> = FxHashSet::default();
        let mut removed: FxHashSet<u64> = FxHashSet::default();
        for op in ops.iter().filter(|op| op.kind() == segment.kind()) {
            match op {
                IndexOp::Upsert(doc) => {
                    segment.validate(doc)?;
                    let id = doc.entity_ref.raw_id();
                    removed.remove(&id);
                    if segment.doc_id(id).is_none() {
                        added.insert(id);
                    }
                }
                IndexOp::Remove(r) => {
                    let id = r.raw_id();
                    added.remove(&id);
                    if segment.doc_id(id).is_some() {
                        removed.insert(id);
                    }
                }
            }
        }
        if let Some(capacity) = self.capacity {
            let after = segment.len() + added.len() - removed.len();
            if after > capacity {
                return Err(LibrisError::index_sync(
                    segment.kind(),
                    format!(
                        "{} index is full ({} documents, capacity {})",
                        segment.kind(),
                        segment.len(),
                        capacity
                    ),
                ));
            }
        }
        Ok(())
    }

    /// Insert or replace one document
    pub fn upsert(&self, doc: IndexDocument) -> LibrisResult<()> {
        self.apply(vec![IndexOp::Upsert(doc)])
    }

    /// Remove one document; false if it was not indexed
    pub fn remove(&self, entity: EntityRef) -> bool {
        let removed = self.segment(entity.kind()).write().remove(entity.raw_id());
        if removed {
            self.version.fetch_add(1, Ordering::AcqRel);
        }
        removed
    }

    /// Drop every document of one type
    pub fn clear(&self, kind: EntityKind) {
        self.segment(kind).write().clear();
        self.version.fetch_add(1, Ordering::AcqRel);
    }

    /// Reclaim the doc id slots of removed documents of one type
    ///
    /// Returns the number of slots reclaimed. Result order is unchanged.
    pub fn compact(&self, kind: EntityKind) -> usize {
        let reclaimed = self.segment(kind).write().compact();
        if reclaimed > 0 {
            debug!(target: "libris::search", kind = %kind, reclaimed, "compacted segment");
            self.version.fetch_add(1, Ordering::AcqRel);
        }
        reclaimed
    }

    /// Copy of an entity's current document
    pub fn get(&self, entity: EntityRef) -> Option<IndexDocument> {
        self.read(entity.kind()).get(entity.raw_id()).cloned()
    }

    /// True when the entity has a document
    pub fn contains(&self, entity: EntityRef) -> bool {
        self.read(entity.kind()).doc_id(entity.raw_id()).is_some()
    }

    /// Entity ids with documents, ascending
    pub fn entity_ids(&self, kind: EntityKind) -> Vec<u64> {
        self.read(kind).entity_ids()
    }

    /// Number of documents of one type
    pub fn len(&self, kind: EntityKind) -> usize {
        self.read(kind).len()
    }

    /// Batches applied since creation
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Document counts and version
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            authors: self.len(EntityKind::Author),
            books: self.len(EntityKind::Book),
            version: self.version(),
        }
    }
}
