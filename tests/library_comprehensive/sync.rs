//! Index synchronization through the facade
//!
//! Every mutation leaves the author documents carrying the current titles
//! of exactly the books they own.

use super::*;
use libris::{Entity, EntityKind, EntityRef};

fn indexed_titles(library: &Library, author: libris::AuthorId) -> Vec<String> {
    library
        .engine()
        .index()
        .get(EntityRef::Author(author))
        .expect("author indexed")
        .field("books.title")
        .expect("books.title field")
        .values
        .clone()
}

// =============================================================================
// Idempotence
// =============================================================================

#[test]
fn test_reindex_twice_equals_once() {
    let (library, catalog) = catalog_library();
    let austen = catalog.author("Austen", "Jane");
    library.rebuild_all().unwrap();
    let once = library.engine().index().get(EntityRef::Author(austen)).unwrap();
    library.rebuild_all().unwrap();
    let twice = library.engine().index().get(EntityRef::Author(austen)).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn test_rebuild_keeps_result_order() {
    let (library, _) = catalog_library();
    let before = library.list_books().unwrap();
    let report = library.rebuild_all().unwrap();
    assert_eq!((report.authors, report.books, report.purged), (6, 16, 0));
    assert_eq!(library.list_books().unwrap(), before);
}

#[test]
fn test_noop_update_keeps_document() {
    let (library, catalog) = catalog_library();
    let eyre = catalog.book("Jane Eyre");
    let before = library.engine().index().get(EntityRef::Book(eyre)).unwrap();
    assert!(library.update_book(eyre, "Jane Eyre").unwrap());
    let after = library.engine().index().get(EntityRef::Book(eyre)).unwrap();
    assert_eq!(before, after);
}

// =============================================================================
// Consistency on title change
// =============================================================================

#[test]
fn test_title_change_reaches_author_document() {
    let (library, catalog) = catalog_library();
    let austen = catalog.author("Austen", "Jane");
    let pride = catalog.book("Pride and Prejudice");

    assert!(library.update_book(pride, "First Impressions").unwrap());

    let titles = indexed_titles(&library, austen);
    assert!(titles.contains(&"first impressions".to_string()));
    assert!(!titles.contains(&"pride and prejudice".to_string()));

    let by_old = library.search_authors("prejudice", None).unwrap();
    assert!(by_old.is_empty());
    let by_new = library.search_authors("impressions", None).unwrap();
    assert_eq!(by_new.len(), 1);
    assert_eq!(by_new[0].id, austen);
}

#[test]
fn test_new_book_reaches_author_document() {
    let (library, catalog) = catalog_library();
    let eliot = catalog.author("Eliot", "George");
    library.add_book("Daniel Deronda", eliot).unwrap().unwrap();

    let found = library.search_authors("deronda", None).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].last_name, "Eliot");
    assert_eq!(indexed_titles(&library, eliot).len(), 4);
}

// =============================================================================
// Cascade
// =============================================================================

#[test]
fn test_delete_author_removes_books_everywhere() {
    let (library, catalog) = catalog_library();
    let dickens = catalog.author("Dickens", "Charles");
    let bleak = catalog.book("Bleak House");

    assert!(library.delete_author(dickens).unwrap());

    assert!(library.book_by_id(bleak).unwrap().is_none());
    assert!(library.search_books("expectations", None).unwrap().is_empty());
    let stats = library.stats();
    assert_eq!(stats.stored_books, 13);
    assert_eq!(stats.index.books, 13);
    assert_eq!(stats.index.authors, 5);
    assert!(!library.engine().index().contains(EntityRef::Author(dickens)));
}

#[test]
fn test_delete_book_detaches_from_owner() {
    let (library, catalog) = catalog_library();
    let emily = catalog.author("Brontë", "Emily");
    let heights = catalog.book("Wuthering Heights");

    assert!(library.delete_book(heights).unwrap());

    let author = library.author_by_id(emily).unwrap().unwrap();
    assert!(author.books.is_empty());
    assert!(indexed_titles(&library, emily).is_empty());
    // An author with no books is still listed
    assert_eq!(library.list_authors().unwrap().len(), 6);
}

#[test]
fn test_hit_source_matches_store() {
    let (library, catalog) = catalog_library();
    let anne = catalog.author("Brontë", "Anne");
    let resp = library
        .execute(&libris::QuerySpec::new(
            EntityKind::Author,
            libris::QueryMode::ById(anne.get()),
        ))
        .unwrap();
    match &resp.hits[0].source {
        Entity::Author(a) => assert_eq!(a.books.len(), 2),
        other => panic!("unexpected source {:?}", other),
    }
}
