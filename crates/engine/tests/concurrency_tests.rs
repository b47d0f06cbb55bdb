//! Multi-Threaded Library Tests
//!
//! Queries run concurrently with each other and with mutations; units of
//! work serialize on the commit lock. A query sees a mutation entirely or
//! not at all.

use libris_core::{AuthorId, EntityKind, EntityRef, QuerySpec};
use libris_engine::Library;
use std::sync::{Arc, Barrier};
use std::thread;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("libris=debug")
        .try_init();
}

// ============================================================================
// Writers
// ============================================================================

/// Test: concurrent add_book calls on one author all land in its document
#[test]
fn test_concurrent_books_all_reach_owner_document() {
    init_tracing();
    let lib = Arc::new(Library::in_memory());
    let author = lib.add_author("Jane", "Austen").unwrap();

    let threads = 4;
    let per_thread = 25;
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let lib = Arc::clone(&lib);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..per_thread {
                    lib.add_book(&format!("Volume {} {}", t, i), author).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let total = threads * per_thread;
    assert_eq!(lib.list_books().unwrap().len(), total);
    let austen = lib.author_by_id(author).unwrap().unwrap();
    assert_eq!(austen.books.len(), total);
    let doc = lib.engine().index().get(EntityRef::Author(author)).unwrap();
    assert_eq!(doc.field("books.title").unwrap().values.len(), total);
}

/// Test: ids stay unique under contention
#[test]
fn test_concurrent_ids_unique() {
    let lib = Arc::new(Library::in_memory());
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let lib = Arc::clone(&lib);
            thread::spawn(move || {
                (0..20)
                    .map(|i| lib.add_author(&format!("First{}", i), &format!("Last{}", t)).unwrap())
                    .collect::<Vec<AuthorId>>()
            })
        })
        .collect();
    let mut ids: Vec<AuthorId> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 80);
}

// ============================================================================
// Readers vs Writers
// ============================================================================

/// Test: a reader never sees a book without its owner's document agreeing
#[test]
fn test_queries_see_whole_mutations() {
    let lib = Arc::new(Library::in_memory());
    let author = lib.add_author("Jane", "Austen").unwrap();

    let writer = {
        let lib = Arc::clone(&lib);
        thread::spawn(move || {
            for i in 0..50 {
                let id = lib.add_book(&format!("Juvenilia {}", i), author).unwrap().unwrap();
                if i % 2 == 0 {
                    lib.delete_book(id).unwrap();
                }
            }
        })
    };

    let readers: Vec<_> = (0..3)
        .map(|_| {
            let lib = Arc::clone(&lib);
            thread::spawn(move || {
                for _ in 0..50 {
                    let resp = lib.execute(&QuerySpec::match_all(EntityKind::Book)).unwrap();
                    let ranks: Vec<u32> = resp.hits.iter().map(|h| h.rank).collect();
                    let expected: Vec<u32> = (1..=resp.hits.len() as u32).collect();
                    assert_eq!(ranks, expected);
                    let doc = lib.engine().index().get(EntityRef::Author(author)).unwrap();
                    let titles = &doc.field("books.title").unwrap().values;
                    // Owner document lists exactly the books it owns
                    match &doc.source {
                        libris_core::Entity::Author(a) => assert_eq!(a.books.len(), titles.len()),
                        other => panic!("unexpected source {:?}", other),
                    }
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for r in readers {
        r.join().unwrap();
    }
    assert_eq!(lib.list_books().unwrap().len(), 25);
}

// ============================================================================
// Rebuild
// ============================================================================

/// Test: rebuild running next to writers leaves the index matching the store
#[test]
fn test_rebuild_with_concurrent_writes_converges() {
    let lib = Arc::new(Library::in_memory());
    let author = lib.add_author("Jane", "Austen").unwrap();
    for i in 0..20 {
        lib.add_book(&format!("Letters {}", i), author).unwrap();
    }

    let writer = {
        let lib = Arc::clone(&lib);
        thread::spawn(move || {
            for i in 0..20 {
                lib.add_book(&format!("Fragments {}", i), author).unwrap();
            }
        })
    };
    let rebuilt = lib.rebuild_all();
    writer.join().unwrap();

    assert!(rebuilt.is_ok());
    let stats = lib.stats();
    assert_eq!(stats.index.books, stats.stored_books);
    assert_eq!(stats.index.authors, stats.stored_authors);
    assert_eq!(lib.search_books("fragments", None).unwrap().len(), 20);
}
