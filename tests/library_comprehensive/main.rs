//! Library Comprehensive Test Suite
//!
//! End-to-end coverage of the catalog through the `Library` facade and the
//! command executor.
//!
//! ## Modules
//!
//! - `sync`: index synchronization (idempotence, title changes, cascade)
//! - `modes`: the seven query modes over the fixture catalog
//! - `pagination`: page law and sort stability (proptest)
//! - `scenarios`: worked examples (Austen, phrase slop, exclusion, no-ops)
//! - `failures`: rollback, corrupted stores, configuration errors
//!
//! ## Running Tests
//!
//! ```bash
//! # Everything
//! cargo test --test library_comprehensive
//!
//! # One module
//! cargo test --test library_comprehensive modes::
//!
//! # With logs
//! RUST_LOG=libris=debug cargo test --test library_comprehensive -- --nocapture
//! ```

use std::sync::Arc;

use libris::{Library, LibraryConfig, MemoryStore};

// Test data loader
pub mod test_data;

pub mod failures;
pub mod modes;
pub mod pagination;
pub mod scenarios;
pub mod sync;

// =============================================================================
// SHARED TEST UTILITIES
// =============================================================================

/// Route `libris` logs to the test writer; honors RUST_LOG when set
pub fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "libris=warn".to_string());
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(filter)
        .try_init();
}

/// Library over a store the test keeps a handle to
pub fn open_library() -> (Arc<MemoryStore>, Library) {
    open_library_with(LibraryConfig::default())
}

/// Library with a custom configuration
pub fn open_library_with(config: LibraryConfig) -> (Arc<MemoryStore>, Library) {
    init_tracing();
    let store = Arc::new(MemoryStore::new());
    let library = Library::open(config, store.clone()).expect("open library");
    (store, library)
}

/// Library preloaded with the fixture catalog
pub fn catalog_library() -> (Library, test_data::LoadedCatalog) {
    let (_, library) = open_library();
    let loaded = test_data::load_into(&library);
    (library, loaded)
}

/// Titles in result order
pub fn titles(books: &[libris::Book]) -> Vec<&str> {
    books.iter().map(|b| b.title.as_str()).collect()
}
