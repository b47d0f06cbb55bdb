//! The seven query modes over the fixture catalog

use super::*;
use libris::{EntityKind, EntityRef, LibrisError, QueryMode, QuerySpec, SortSpec};

fn book_spec(mode: QueryMode) -> QuerySpec {
    QuerySpec::new(EntityKind::Book, mode)
}

fn simple(pattern: &str) -> QueryMode {
    QueryMode::Simple {
        pattern: pattern.into(),
    }
}

// =============================================================================
// MatchAll / ById
// =============================================================================

#[test]
fn test_match_all_books_by_title() {
    let (library, _) = catalog_library();
    let books = library.list_books().unwrap();
    assert_eq!(books.len(), 16);
    let all = titles(&books);
    let mut sorted = all.clone();
    sorted.sort_by_key(|t| t.to_lowercase());
    assert_eq!(all, sorted);
    assert_eq!(all[0], "Agnes Grey");
}

#[test]
fn test_match_all_authors_by_last_then_first() {
    let (library, _) = catalog_library();
    let names: Vec<String> = library
        .list_authors()
        .unwrap()
        .into_iter()
        .map(|a| format!("{} {}", a.first_name, a.last_name))
        .collect();
    assert_eq!(
        names,
        vec![
            "Jane Austen",
            "Anne Brontë",
            "Charlotte Brontë",
            "Emily Brontë",
            "Charles Dickens",
            "George Eliot",
        ]
    );
}

#[test]
fn test_by_id_zero_or_one() {
    let (library, catalog) = catalog_library();
    let emma = catalog.book("Emma");
    let resp = library.execute(&book_spec(QueryMode::ById(emma.get()))).unwrap();
    assert_eq!(resp.refs(), vec![EntityRef::Book(emma)]);

    // An author id never matches in the book segment
    let austen = catalog.author("Austen", "Jane");
    assert!(library
        .execute(&book_spec(QueryMode::ById(austen.get())))
        .unwrap()
        .is_empty());
}

// =============================================================================
// Simple
// =============================================================================

#[test]
fn test_simple_author_fields() {
    let (library, _) = catalog_library();
    // First name, last name and book titles are all searched
    assert_eq!(library.search_authors("george", None).unwrap().len(), 1);
    assert_eq!(library.search_authors("bronte", None).unwrap().len(), 3);
    let by_title = library.search_authors("middlemarch", None).unwrap();
    assert_eq!(by_title[0].last_name, "Eliot");
}

#[test]
fn test_simple_author_results_sorted_by_name() {
    let (library, _) = catalog_library();
    // "jane" hits Jane Austen by name and Charlotte Brontë by title
    let found = library.search_authors("jane", None).unwrap();
    let last: Vec<&str> = found.iter().map(|a| a.last_name.as_str()).collect();
    assert_eq!(last, vec!["Austen", "Brontë"]);
}

#[test]
fn test_simple_books_by_relevance() {
    let (library, _) = catalog_library();
    let found = library.search_books("house hall", None).unwrap();
    let got = titles(&found);
    assert_eq!(got.len(), 2);
    // Shorter title scores higher
    assert_eq!(got[0], "Bleak House");
}

#[test]
fn test_simple_syntax() {
    let (library, _) = catalog_library();
    let required = library.search_books("+mill great", None).unwrap();
    assert_eq!(titles(&required), vec!["The Mill on the Floss"]);

    let prohibited = library.search_books("times -hard", None).unwrap();
    assert!(prohibited.is_empty());

    let prefix = library.search_books("wuther*", None).unwrap();
    assert_eq!(titles(&prefix), vec!["Wuthering Heights"]);

    let quoted = library.search_books("\"great expectations\"", None).unwrap();
    assert_eq!(titles(&quoted), vec!["Great Expectations"]);

    let fuzzy = library.search_books("emmma~1", None).unwrap();
    assert_eq!(titles(&fuzzy), vec!["Emma"]);
}

#[test]
fn test_simple_size_cap() {
    let (library, _) = catalog_library();
    let capped = library.search_books("the and", Some(1)).unwrap();
    assert_eq!(capped.len(), 0, "stopwords alone match nothing");
    let capped = library.search_books("sense emma persuasion", Some(2)).unwrap();
    assert_eq!(capped.len(), 2);
}

// =============================================================================
// Wildcard
// =============================================================================

#[test]
fn test_wildcard_word_and_value() {
    let (library, _) = catalog_library();
    let word = library.search_books_wildcard("h*s", None).unwrap();
    let mut got = titles(&word);
    got.sort();
    assert_eq!(got, vec!["Hard Times", "Wuthering Heights"]);

    let single = library.search_books_wildcard("e?ma", None).unwrap();
    assert_eq!(titles(&single), vec!["Emma"]);

    // Whole normalized value, spaces included
    let value = library.search_books_wildcard("jane e*", None).unwrap();
    assert_eq!(titles(&value), vec!["Jane Eyre"]);
}

#[test]
fn test_wildcard_is_case_and_accent_insensitive() {
    let (library, _) = catalog_library();
    let spec = QuerySpec::new(
        EntityKind::Author,
        QueryMode::Wildcard {
            pattern: "BRONT?".into(),
        },
    )
    .with_fields(["lastName"]);
    assert_eq!(library.execute(&spec).unwrap().len(), 3);
}

// =============================================================================
// Phrase
// =============================================================================

#[test]
fn test_phrase_slop_bounds() {
    let (library, _) = catalog_library();
    let within = library.search_books_phrase("tenant wildfell", None).unwrap();
    assert_eq!(titles(&within), vec!["The Tenant of Wildfell Hall"]);

    let exact = QueryMode::Phrase {
        pattern: "tenant wildfell".into(),
        slop: Some(0),
    };
    assert!(library
        .execute(&book_spec(exact).with_fields(["title"]))
        .unwrap()
        .is_empty());
}

#[test]
fn test_phrase_never_spans_two_titles() {
    let (library, _) = catalog_library();
    // Austen's document holds "... Mansfield Park" after "... Persuasion"
    let spec = QuerySpec::new(
        EntityKind::Author,
        QueryMode::Phrase {
            pattern: "persuasion mansfield".into(),
            slop: Some(50),
        },
    )
    .with_fields(["books.title"]);
    assert!(library.execute(&spec).unwrap().is_empty());
}

// =============================================================================
// Exclusion
// =============================================================================

#[test]
fn test_exclusion_on_author_names() {
    let (library, _) = catalog_library();
    let spec = QuerySpec::new(
        EntityKind::Author,
        QueryMode::Exclusion {
            pattern: "Brontë".into(),
        },
    )
    .with_fields(["lastName"])
    .with_sort(SortSpec::Fields);
    let resp = library.execute(&spec).unwrap();
    assert_eq!(resp.len(), 3);
    assert!(resp.hits.iter().all(|h| h.score == 1.0));
}

// =============================================================================
// Fuzzy
// =============================================================================

#[test]
fn test_fuzzy_prefix_must_match() {
    let (library, _) = catalog_library();
    // First three characters differ from "middlemarch"
    let spec = book_spec(QueryMode::Fuzzy {
        pattern: "niddlemarch".into(),
        max_edits: Some(1),
        prefix_length: None,
    });
    assert!(library.execute(&spec).unwrap().is_empty());

    let spec = book_spec(QueryMode::Fuzzy {
        pattern: "niddlemarch".into(),
        max_edits: Some(1),
        prefix_length: Some(0),
    });
    assert_eq!(library.execute(&spec).unwrap().len(), 1);
}

#[test]
fn test_fuzzy_edit_limits() {
    let (library, _) = catalog_library();
    assert!(library.search_books_fuzzy("marnnerr", None).unwrap().is_empty());

    let two = book_spec(QueryMode::Fuzzy {
        pattern: "marnerrr".into(),
        max_edits: Some(2),
        prefix_length: None,
    });
    assert_eq!(library.execute(&two).unwrap().len(), 1);

    let three = book_spec(QueryMode::Fuzzy {
        pattern: "marner".into(),
        max_edits: Some(3),
        prefix_length: None,
    });
    assert!(matches!(
        library.execute(&three).unwrap_err(),
        LibrisError::InvalidQuery { .. }
    ));
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn test_unknown_and_sort_only_fields_rejected() {
    let (library, _) = catalog_library();
    let unknown = book_spec(simple("emma")).with_fields(["isbn"]);
    assert!(library.execute(&unknown).unwrap_err().is_caller_error());
    let sort_only = book_spec(simple("emma")).with_fields(["title_sort"]);
    assert!(library.execute(&sort_only).unwrap_err().is_caller_error());
}

#[test]
fn test_blank_patterns_rejected_in_every_text_mode() {
    let (library, _) = catalog_library();
    assert!(library.search_books(" ", None).is_err());
    assert!(library.search_books_wildcard("", None).is_err());
    assert!(library.search_books_phrase("  ", None).is_err());
    assert!(library.search_books_except("", None).is_err());
    assert!(library.search_books_fuzzy("\t", None).is_err());
    assert!(library.search_authors("", None).is_err());
}

#[test]
fn test_unterminated_quote_rejected() {
    let (library, _) = catalog_library();
    let err = library.search_books("\"great expectations", None).unwrap_err();
    assert!(matches!(err, LibrisError::InvalidQuery { .. }));
}

#[test]
fn test_stats_report_totals() {
    let (library, _) = catalog_library();
    let resp = library
        .execute(&book_spec(QueryMode::MatchAll).with_size(3))
        .unwrap();
    assert_eq!(resp.len(), 3);
    assert_eq!(resp.stats.total_hits, 16);
}
