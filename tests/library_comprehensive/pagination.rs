//! Page law and sort stability

use super::*;
use libris::{EntityKind, LibrisError, PageRequest, QuerySpec};
use proptest::prelude::*;

// =============================================================================
// Page law: page p of size l is the slice [l*(p-1), l*p) of the full order
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_page_is_slice_of_full_listing(page in 1u32..8, limit in 1u32..7) {
        let (library, _) = catalog_library();
        let all = library.list_books().unwrap();
        let got = library.list_books_page(page, limit).unwrap();

        let start = (limit as usize * (page as usize - 1)).min(all.len());
        let end = (start + limit as usize).min(all.len());
        prop_assert_eq!(got, all[start..end].to_vec());
    }

    #[test]
    fn prop_pages_partition_listing(limit in 1u32..20) {
        let (library, _) = catalog_library();
        let all = library.list_books().unwrap();

        let mut joined = Vec::new();
        let mut page = 1;
        loop {
            let chunk = library.list_books_page(page, limit).unwrap();
            if chunk.is_empty() {
                break;
            }
            prop_assert!(chunk.len() <= limit as usize);
            joined.extend(chunk);
            page += 1;
        }
        prop_assert_eq!(joined, all);
    }
}

// =============================================================================
// Ranks and edges
// =============================================================================

#[test]
fn test_ranks_continue_across_pages() {
    let (library, _) = catalog_library();
    let spec = QuerySpec::match_all(EntityKind::Book).with_page(PageRequest { page: 3, limit: 5 });
    let resp = library.execute(&spec).unwrap();
    let ranks: Vec<u32> = resp.hits.iter().map(|h| h.rank).collect();
    assert_eq!(ranks, vec![11, 12, 13, 14, 15]);
    assert_eq!(resp.stats.total_hits, 16);
}

#[test]
fn test_page_past_end_is_empty() {
    let (library, _) = catalog_library();
    assert!(library.list_books_page(5, 4).unwrap().is_empty());
    assert_eq!(library.list_books_page(4, 4).unwrap().len(), 4);
    assert_eq!(library.list_books_page(2, 10).unwrap().len(), 6);
}

#[test]
fn test_zero_page_or_limit_rejected() {
    let (library, _) = catalog_library();
    assert!(matches!(
        library.list_books_page(0, 10).unwrap_err(),
        LibrisError::InvalidQuery { .. }
    ));
    assert!(matches!(
        library.list_books_page(1, 0).unwrap_err(),
        LibrisError::InvalidQuery { .. }
    ));
}

#[test]
fn test_size_caps_a_page() {
    let (library, _) = catalog_library();
    let spec = QuerySpec::match_all(EntityKind::Book)
        .with_page(PageRequest { page: 1, limit: 10 })
        .with_size(3);
    assert_eq!(library.execute(&spec).unwrap().len(), 3);
}

// =============================================================================
// Stability
// =============================================================================

#[test]
fn test_equal_titles_keep_insertion_order() {
    let (_, library) = open_library();
    let a = library.add_author("Anna", "Alpha").unwrap();
    let b = library.add_author("Bea", "Beta").unwrap();
    let first = library.add_book("Poems", b).unwrap().unwrap();
    let second = library.add_book("Poems", a).unwrap().unwrap();
    let third = library.add_book("poems", b).unwrap().unwrap();

    let ids: Vec<_> = library.list_books().unwrap().into_iter().map(|b| b.id).collect();
    assert_eq!(ids, vec![first, second, third]);

    // Paging splits the tie without reordering it
    let page1 = library.list_books_page(1, 2).unwrap();
    let page2 = library.list_books_page(2, 2).unwrap();
    assert_eq!(page1.iter().map(|b| b.id).collect::<Vec<_>>(), vec![first, second]);
    assert_eq!(page2.iter().map(|b| b.id).collect::<Vec<_>>(), vec![third]);
}

#[test]
fn test_repeated_queries_identical() {
    let (library, _) = catalog_library();
    let first = library.search_books("hall house great", None).unwrap();
    let again = library.search_books_except("heights", None).unwrap();
    for _ in 0..5 {
        assert_eq!(library.search_books("hall house great", None).unwrap(), first);
        assert_eq!(library.search_books_except("heights", None).unwrap(), again);
    }
    assert_eq!(again.len(), 15);
}
