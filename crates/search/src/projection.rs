//! Entity projection
//!
//! Declares which attributes of each entity are searchable or sortable and
//! derives the [`IndexDocument`] for an entity. Author documents embed the
//! titles of all their books under `books.title`.
//!
//! Derivation is pure: the same entity and books always produce an equal
//! document, so re-indexing an unchanged entity is a no-op.

use crate::analyzer::{raw_words, sort_key, Analyzer, Token};
use libris_core::{Author, Book, Entity, EntityKind, EntityRef, LibrisError, LibrisResult};

/// Author given name
pub const FIRST_NAME: &str = "firstName";
/// Author family name
pub const LAST_NAME: &str = "lastName";
/// Titles of an author's books
pub const BOOKS_TITLE: &str = "books.title";
/// Book title
pub const TITLE: &str = "title";
/// Sortable keyword for `firstName`
pub const FIRST_NAME_SORT: &str = "firstName_sort";
/// Sortable keyword for `lastName`
pub const LAST_NAME_SORT: &str = "lastName_sort";
/// Sortable keyword for `title`
pub const TITLE_SORT: &str = "title_sort";

/// How a field is indexed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Analyzed full-text field, usable for matching
    Text(Analyzer),
    /// Single normalized keyword, usable for sorting only
    SortKeyword,
}

/// A field exposed to the query engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// Field name as used in queries
    pub name: &'static str,
    /// Indexing behavior
    pub kind: FieldKind,
}

impl FieldDef {
    const fn text(name: &'static str, analyzer: Analyzer) -> Self {
        FieldDef {
            name,
            kind: FieldKind::Text(analyzer),
        }
    }

    const fn sort(name: &'static str) -> Self {
        FieldDef {
            name,
            kind: FieldKind::SortKeyword,
        }
    }

    /// Analyzer of a text field
    pub fn analyzer(&self) -> Option<Analyzer> {
        match self.kind {
            FieldKind::Text(a) => Some(a),
            FieldKind::SortKeyword => None,
        }
    }
}

const AUTHOR_FIELDS: &[FieldDef] = &[
    FieldDef::text(FIRST_NAME, Analyzer::Name),
    FieldDef::text(LAST_NAME, Analyzer::Name),
    FieldDef::text(BOOKS_TITLE, Analyzer::English),
    FieldDef::sort(FIRST_NAME_SORT),
    FieldDef::sort(LAST_NAME_SORT),
];

const BOOK_FIELDS: &[FieldDef] = &[
    FieldDef::text(TITLE, Analyzer::English),
    FieldDef::sort(TITLE_SORT),
];

/// Every field of an entity type
pub fn fields(kind: EntityKind) -> &'static [FieldDef] {
    match kind {
        EntityKind::Author => AUTHOR_FIELDS,
        EntityKind::Book => BOOK_FIELDS,
    }
}

/// Fields searched when a query names none
pub fn default_search_fields(kind: EntityKind) -> &'static [&'static str] {
    match kind {
        EntityKind::Author => &[FIRST_NAME, LAST_NAME, BOOKS_TITLE],
        EntityKind::Book => &[TITLE],
    }
}

/// Declared sort order for listing
pub fn sort_fields(kind: EntityKind) -> &'static [&'static str] {
    match kind {
        EntityKind::Author => &[LAST_NAME_SORT, FIRST_NAME_SORT],
        EntityKind::Book => &[TITLE_SORT],
    }
}

/// Look up a field by name
pub fn field(kind: EntityKind, name: &str) -> Option<&'static FieldDef> {
    fields(kind).iter().find(|f| f.name == name)
}

/// Resolve the text fields a query runs against
///
/// `None` selects the default search fields. Unknown fields and sort
/// keywords are rejected with `InvalidQuery`.
pub fn resolve_search_fields(
    kind: EntityKind,
    requested: Option<&[String]>,
) -> LibrisResult<Vec<&'static FieldDef>> {
    let Some(requested) = requested else {
        return Ok(default_search_fields(kind)
            .iter()
            .filter_map(|name| field(kind, name))
            .collect());
    };
    if requested.is_empty() {
        return Err(LibrisError::invalid_query("field list is empty"));
    }
    let mut resolved = Vec::with_capacity(requested.len());
    for name in requested {
        let def = field(kind, name).ok_or_else(|| {
            LibrisError::invalid_query(format!("unknown field '{}' for {}", name, kind))
        })?;
        if def.analyzer().is_none() {
            return Err(LibrisError::invalid_query(format!(
                "field '{}' is sortable only and cannot be searched",
                name
            )));
        }
        if !resolved.contains(&def) {
            resolved.push(def);
        }
    }
    Ok(resolved)
}

/// One analyzed field of an index document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedField {
    /// Field name
    pub name: &'static str,
    /// Analyzed terms with positions; values of a multi-valued field are
    /// separated by the position gap
    pub tokens: Vec<Token>,
    /// Unanalyzed words across all values
    pub words: Vec<String>,
    /// Whole values, normalized like sort keywords
    pub values: Vec<String>,
}

impl IndexedField {
    /// Number of analyzed terms, used as the BM25 field length
    pub fn len(&self) -> u32 {
        self.tokens.len() as u32
    }

    /// True when the field produced no terms
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// The searchable projection of one entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDocument {
    /// Entity this document describes
    pub entity_ref: EntityRef,
    /// Stored source returned with hits
    pub source: Entity,
    /// Analyzed text fields
    pub fields: Vec<IndexedField>,
    /// Sort keywords in declared order
    pub sort_keys: Vec<(&'static str, String)>,
}

impl IndexDocument {
    /// Entity type of this document
    pub fn kind(&self) -> EntityKind {
        self.entity_ref.kind()
    }

    /// Analyzed field by name
    pub fn field(&self, name: &str) -> Option<&IndexedField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Sort keyword by field name
    pub fn sort_key(&self, name: &str) -> Option<&str> {
        self.sort_keys
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Derives index documents from entities
#[derive(Debug, Clone, Copy)]
pub struct Projection {
    position_gap: u32,
}

impl Default for Projection {
    fn default() -> Self {
        Self::new(crate::settings::DEFAULT_POSITION_GAP)
    }
}

impl Projection {
    /// Create a projection with the given multi-value position gap
    pub fn new(position_gap: u32) -> Self {
        Projection { position_gap }
    }

    /// Position gap between values of a multi-valued field
    pub fn position_gap(&self) -> u32 {
        self.position_gap
    }

    /// Derive an author's document from the author and all of its books
    ///
    /// `books` must be exactly the books listed in `author.books`; a book
    /// owned by someone else or a missing book is an `IndexSync` error.
    pub fn derive_author(&self, author: &Author, books: &[Book]) -> LibrisResult<IndexDocument> {
        if books.len() != author.books.len() {
            return Err(LibrisError::index_sync(
                EntityKind::Author,
                format!(
                    "author {} lists {} books but {} resolved",
                    author.id,
                    author.books.len(),
                    books.len()
                ),
            ));
        }
        for book in books {
            if book.author != author.id || !author.books.contains(&book.id) {
                return Err(LibrisError::index_sync(
                    EntityKind::Author,
                    format!("book {} is not owned by author {}", book.id, author.id),
                ));
            }
        }

        // BTreeSet order keeps titles, and so positions, deterministic
        let mut ordered: Vec<&Book> = books.iter().collect();
        ordered.sort_by_key(|b| b.id);
        let titles: Vec<&str> = ordered.iter().map(|b| b.title.as_str()).collect();

        Ok(IndexDocument {
            entity_ref: EntityRef::Author(author.id),
            source: Entity::Author(author.clone()),
            fields: vec![
                self.index_values(FIRST_NAME, Analyzer::Name, &[&author.first_name]),
                self.index_values(LAST_NAME, Analyzer::Name, &[&author.last_name]),
                self.index_values(BOOKS_TITLE, Analyzer::English, &titles),
            ],
            sort_keys: vec![
                (LAST_NAME_SORT, sort_key(&author.last_name)),
                (FIRST_NAME_SORT, sort_key(&author.first_name)),
            ],
        })
    }

    /// Derive a book's document
    ///
    /// `author` is the resolved owner; a book without one cannot be indexed.
    pub fn derive_book(&self, book: &Book, author: Option<&Author>) -> LibrisResult<IndexDocument> {
        match author {
            Some(a) if a.id == book.author => {}
            _ => {
                return Err(LibrisError::index_sync(
                    EntityKind::Book,
                    format!("book {} has no resolvable author {}", book.id, book.author),
                ))
            }
        }
        Ok(IndexDocument {
            entity_ref: EntityRef::Book(book.id),
            source: Entity::Book(book.clone()),
            fields: vec![self.index_values(TITLE, Analyzer::English, &[&book.title])],
            sort_keys: vec![(TITLE_SORT, sort_key(&book.title))],
        })
    }

    fn index_values(&self, name: &'static str, analyzer: Analyzer, values: &[&str]) -> IndexedField {
        let mut tokens = Vec::new();
        let mut words = Vec::new();
        let mut normalized = Vec::with_capacity(values.len());
        let mut base = 0u32;
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                base += self.position_gap;
            }
            let analyzed = analyzer.analyze(value);
            let value_words = raw_words(value);
            for mut token in analyzed {
                token.position += base;
                tokens.push(token);
            }
            // Next value starts after the last word of this one
            base += value_words.len() as u32;
            words.extend(value_words);
            normalized.push(sort_key(value));
        }
        IndexedField {
            name,
            tokens,
            words,
            values: normalized,
        }
    }
}
