//! Worked examples end to end

use super::*;
use libris::{AuthorId, BookId, EntityKind};

const AUSTEN_TITLES: [&str; 5] = [
    "Pride and Prejudice",
    "Sense and Sensibility",
    "Emma",
    "Persuasion",
    "Mansfield Park",
];

fn austen_library() -> (Arc<MemoryStore>, Library, AuthorId, Vec<BookId>) {
    let (store, library) = open_library();
    let austen = library.add_author("Jane", "Austen").unwrap();
    let books = AUSTEN_TITLES
        .iter()
        .map(|t| library.add_book(t, austen).unwrap().unwrap())
        .collect();
    (store, library, austen, books)
}

#[test]
fn test_pride_and_prejudice_in_three_modes() {
    let (_, library) = open_library();
    let austen = library.add_author("Jane", "Austen").unwrap();
    let id = library
        .add_book("Pride and Prejudice", austen)
        .unwrap()
        .expect("author exists");

    let simple = library.search_books("Prejudice", None).unwrap();
    assert_eq!(simple.len(), 1);
    assert_eq!(simple[0].id, id);

    let fuzzy = library.search_books_fuzzy("Prejudise", None).unwrap();
    assert_eq!(fuzzy.iter().map(|b| b.id).collect::<Vec<_>>(), vec![id]);

    let wildcard = library.search_books_wildcard("Prejudic*", None).unwrap();
    assert_eq!(wildcard.iter().map(|b| b.id).collect::<Vec<_>>(), vec![id]);

    // The author is findable through the title too
    let authors = library.search_authors("prejudice", None).unwrap();
    assert_eq!(authors.len(), 1);
    assert_eq!(authors[0].id, austen);
    assert!(authors[0].books.contains(&id));
}

#[test]
fn test_phrase_with_one_intervening_word() {
    let (_, library, _, books) = austen_library();
    let found = library.search_books_phrase("Pride Prejudice", None).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, books[0]);

    // Order matters beyond the slop
    assert!(library
        .search_books_phrase("Prejudice Pride Sense", None)
        .unwrap()
        .is_empty());
}

#[test]
fn test_phrase_repeating_a_word_needs_it_twice() {
    let (_, library, austen, _) = austen_library();
    assert!(library.search_books_phrase("emma emma", None).unwrap().is_empty());

    let twice = library.add_book("Emma and Emma", austen).unwrap().unwrap();
    let found = library.search_books_phrase("emma emma", None).unwrap();
    assert_eq!(found.iter().map(|b| b.id).collect::<Vec<_>>(), vec![twice]);
}

#[test]
fn test_required_stopword_does_not_empty_results() {
    let (_, library, _, books) = austen_library();
    let found = library.search_books("+the emma", None).unwrap();
    assert_eq!(found.iter().map(|b| b.id).collect::<Vec<_>>(), vec![books[2]]);
}

#[test]
fn test_rebuild_reclaims_deleted_slots() {
    let (_, library, austen, books) = austen_library();
    for id in [books[0], books[3]] {
        assert!(library.delete_book(id).unwrap());
    }
    let before = titles(&library.list_books().unwrap())
        .into_iter()
        .map(String::from)
        .collect::<Vec<_>>();
    assert_eq!(library.engine().index().read(EntityKind::Book).slots(), 5);

    let report = library.rebuild_all().unwrap();
    assert_eq!(report.compacted, 2);
    assert_eq!(library.engine().index().read(EntityKind::Book).slots(), 3);
    assert_eq!(titles(&library.list_books().unwrap()), before);

    // New books take the next dense doc id
    library.add_book("Lady Susan", austen).unwrap().unwrap();
    assert_eq!(library.engine().index().read(EntityKind::Book).slots(), 4);
}

#[test]
fn test_exclusion_returns_the_other_four() {
    let (_, library, _, books) = austen_library();
    let rest = library.search_books_except("Prejudice", None).unwrap();
    let mut ids: Vec<_> = rest.iter().map(|b| b.id).collect();
    ids.sort();
    assert_eq!(ids, books[1..].to_vec());
}

#[test]
fn test_delete_nonexistent_book_is_noop() {
    let (store, library, austen, _) = austen_library();
    let version = store.version();
    let before = library.list_books().unwrap();

    assert!(!library.delete_book(BookId(9_999)).unwrap());

    assert_eq!(store.version(), version);
    assert_eq!(library.list_books().unwrap(), before);
    assert_eq!(library.author_by_id(austen).unwrap().unwrap().books.len(), 5);
}

#[test]
fn test_delete_nonexistent_author_is_noop() {
    let (store, library, _, _) = austen_library();
    let version = store.version();
    assert!(!library.delete_author(AuthorId(9_999)).unwrap());
    assert_eq!(store.version(), version);
}

#[test]
fn test_book_for_missing_author_is_not_created() {
    let (store, library, _, _) = austen_library();
    assert_eq!(library.add_book("Lady Susan", AuthorId(9_999)).unwrap(), None);
    assert_eq!(store.books().len(), 5);
    assert!(library.search_books("susan", None).unwrap().is_empty());
}

#[test]
fn test_renamed_author_found_by_new_name() {
    let (_, library, austen, _) = austen_library();
    assert!(library.update_author(austen, "Jane", "Austin").unwrap());

    assert!(library.search_authors("austen", None).unwrap().is_empty());
    let found = library.search_authors("austin", None).unwrap();
    assert_eq!(found.len(), 1);
    // Books still embedded after the rename
    assert_eq!(found[0].books.len(), 5);
    assert_eq!(library.search_authors("persuasion", None).unwrap().len(), 1);
}

#[test]
fn test_deleting_a_book_removes_it_from_author_search() {
    let (_, library, austen, books) = austen_library();
    assert!(library.delete_book(books[3]).unwrap());

    assert!(library.search_authors("persuasion", None).unwrap().is_empty());
    let author = library.author_by_id(austen).unwrap().unwrap();
    assert!(!author.books.contains(&books[3]));
    assert_eq!(library.list_books().unwrap().len(), 4);
}

#[test]
fn test_timing_variants_measure_without_results() {
    let (_, library, austen, books) = austen_library();
    // Durations are opaque; only success is checked
    library.list_books_time().unwrap();
    library.list_books_page_time(1, 2).unwrap();
    library.book_by_id_time(books[0]).unwrap();
    library.author_by_id_time(austen).unwrap();
    library.search_books_fuzzy_time("emma", None).unwrap();
    assert!(library.search_books_time("", None).is_err());
}
