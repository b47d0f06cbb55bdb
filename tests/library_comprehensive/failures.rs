//! Rollback, corrupted stores and configuration errors

use super::*;
use libris::{
    Author, AuthorId, Book, BookId, Command, Executor, LibrisError, Output, RecordStore,
    WriteBatch, WriteOp, CONFIG_FILE_NAME,
};

// =============================================================================
// Unit-of-work rollback
// =============================================================================

fn bounded_library(capacity: usize) -> (Arc<MemoryStore>, Library) {
    open_library_with(LibraryConfig {
        index_capacity: Some(capacity),
        ..LibraryConfig::default()
    })
}

#[test]
fn test_index_failure_rolls_back_store() {
    let (store, library) = bounded_library(2);
    let author = library.add_author("George", "Eliot").unwrap();
    library.add_book("Middlemarch", author).unwrap();
    library.add_book("Silas Marner", author).unwrap();
    let version = store.version();

    let err = library.add_book("Romola", author).unwrap_err();
    assert!(matches!(err, LibrisError::IndexSync { .. }), "got {err:?}");

    // Applied then reverted
    assert_eq!(store.version(), version + 2);
    assert_eq!(store.books().len(), 2);
    let eliot = library.author_by_id(author).unwrap().unwrap();
    assert_eq!(eliot.books.len(), 2);
    assert!(library.search_books("romola", None).unwrap().is_empty());
    assert!(library.search_authors("romola", None).unwrap().is_empty());

    let stats = library.stats();
    assert_eq!(stats.transactions.total_rolled_back, 1);
    assert_eq!(stats.index.books, 2);
}

#[test]
fn test_failed_unit_leaves_library_usable() {
    let (_, library) = bounded_library(1);
    let author = library.add_author("Emily", "Brontë").unwrap();
    assert!(library.add_author("Anne", "Brontë").is_err());

    // Deleting a book frees its slot
    let book = library.add_book("Wuthering Heights", author).unwrap().unwrap();
    assert!(library.delete_book(book).unwrap());
    let again = library.add_book("Poems", author).unwrap();
    assert!(again.is_some());
    assert_eq!(library.list_books().unwrap().len(), 1);
}

#[test]
fn test_closure_error_applies_nothing() {
    let (store, library) = open_library();
    let version = store.version();
    let result: Result<(), _> = library.transaction(|uow| {
        let id = AuthorId(uow.next_id());
        uow.put_author(Author::new(id, "Charles", "Dickens"));
        Err(LibrisError::invalid_input("lastName", "rejected by caller"))
    });
    assert!(result.unwrap_err().is_caller_error());
    assert_eq!(store.version(), version);
    assert!(library.list_authors().unwrap().is_empty());
}

#[test]
fn test_invalid_names_rejected() {
    let (_, library) = open_library();
    assert!(matches!(
        library.add_author("  ", "Austen").unwrap_err(),
        LibrisError::InvalidInput { .. }
    ));
    let author = library.add_author("Jane", "Austen").unwrap();
    assert!(library.add_book("", author).is_err());
    assert!(library.list_books().unwrap().is_empty());
}

// =============================================================================
// Corrupted stores
// =============================================================================

/// Store with a book its author does not list
fn corrupted_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    let author = AuthorId(store.next_id());
    let book = BookId(store.next_id());
    let batch: WriteBatch = vec![
        WriteOp::PutAuthor(Author::new(author, "Anne", "Brontë")),
        WriteOp::PutBook(Book::new(book, "Agnes Grey", author)),
    ]
    .into_iter()
    .collect();
    store.apply(batch).unwrap();
    store
}

#[test]
fn test_open_fails_on_unindexable_store() {
    init_tracing();
    let err = match Library::open(LibraryConfig::default(), corrupted_store()) {
        Ok(_) => panic!("open should fail"),
        Err(e) => e,
    };
    assert!(matches!(err, LibrisError::Rebuild { .. }), "got {err:?}");
    assert!(err.is_fatal());
}

#[test]
fn test_rebuild_keeps_indexable_entities() {
    init_tracing();
    let config = LibraryConfig {
        reindex_on_startup: false,
        ..LibraryConfig::default()
    };
    let library = Library::open(config, corrupted_store()).unwrap();
    assert!(library.list_authors().unwrap().is_empty());

    assert!(matches!(
        library.rebuild_all().unwrap_err(),
        LibrisError::Rebuild { .. }
    ));
    assert_eq!(library.list_authors().unwrap().len(), 1);
    assert!(library.list_books().unwrap().is_empty());
}

#[test]
fn test_open_reindexes_existing_store() {
    let (store, library) = open_library();
    let author = library.add_author("Charles", "Dickens").unwrap();
    library.add_book("Hard Times", author).unwrap();
    drop(library);

    let reopened = Library::open(LibraryConfig::default(), store).unwrap();
    assert_eq!(reopened.search_books("times", None).unwrap().len(), 1);
    assert_eq!(reopened.search_authors("dickens", None).unwrap().len(), 1);
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn test_config_file_missing_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    let library = Library::open_with_config_file(&path, Arc::new(MemoryStore::new())).unwrap();
    assert_eq!(library.config(), &LibraryConfig::default());
}

#[test]
fn test_config_file_settings_applied() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(&path, "[search]\nphrase_slop = 0\n").unwrap();

    let library = Library::open_with_config_file(&path, Arc::new(MemoryStore::new())).unwrap();
    let author = library.add_author("Jane", "Austen").unwrap();
    library.add_book("Pride and Prejudice", author).unwrap();
    assert!(library
        .search_books_phrase("pride prejudice", None)
        .unwrap()
        .is_empty());
}

#[test]
fn test_config_file_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);

    std::fs::write(&path, "reindex_on_startup = \"sometimes\"\n").unwrap();
    let err = match Library::open_with_config_file(&path, Arc::new(MemoryStore::new())) {
        Ok(_) => panic!("bad TOML accepted"),
        Err(e) => e,
    };
    assert!(matches!(err, LibrisError::Config { .. }));

    std::fs::write(&path, "[search]\nfuzzy_max_edits = 3\n").unwrap();
    assert!(Library::open_with_config_file(&path, Arc::new(MemoryStore::new())).is_err());

    std::fs::write(&path, "index_capacity = 0\n").unwrap();
    assert!(Library::open_with_config_file(&path, Arc::new(MemoryStore::new())).is_err());
}

#[test]
fn test_default_config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    LibraryConfig::write_default_if_missing(&path).unwrap();
    assert_eq!(LibraryConfig::from_file(&path).unwrap(), LibraryConfig::default());
}

// =============================================================================
// Command surface
// =============================================================================

#[test]
fn test_executor_json_session() {
    init_tracing();
    let executor = Executor::new(Arc::new(Library::in_memory()));
    let run = |json: &str| -> Output {
        let cmd: Command = serde_json::from_str(json).unwrap();
        executor.execute(cmd).unwrap()
    };

    let author = match run(r#"{"AddAuthor":{"first_name":"Jane","last_name":"Austen"}}"#) {
        Output::AuthorId(id) => id,
        other => panic!("unexpected {other:?}"),
    };
    let add_book = format!(r#"{{"AddBook":{{"title":"Emma","author":{}}}}}"#, author.get());
    assert!(matches!(run(&add_book), Output::MaybeBookId(Some(_))));

    let found = run(r#"{"SearchBooksFuzzy":{"pattern":"emmma"}}"#);
    let json = serde_json::to_string(&found).unwrap();
    let back: Output = serde_json::from_str(&json).unwrap();
    assert_eq!(back, found);
    match back {
        Output::Books(books) => assert_eq!(titles(&books), vec!["Emma"]),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_executor_errors_serialize() {
    let executor = Executor::new(Arc::new(Library::in_memory()));
    let err = executor
        .execute(Command::SearchBooks {
            pattern: "".into(),
            size: None,
        })
        .unwrap_err();
    let json = serde_json::to_string(&err).unwrap();
    assert!(json.contains("InvalidQuery"));

    let timed_mutation = Command::Time {
        command: Box::new(Command::DeleteBook { id: BookId(1) }),
    };
    let err = executor.execute(timed_mutation).unwrap_err();
    assert!(serde_json::to_string(&err).unwrap().contains("InvalidCommand"));
}
