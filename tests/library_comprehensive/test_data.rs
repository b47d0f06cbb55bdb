//! Test Data Loader
//!
//! Loads the catalog fixture from `testdata/catalog.jsonl`. The first line
//! is a header; every other line is one author with its book titles.

use libris::{AuthorId, BookId, Library};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

/// Header line of the fixture
#[derive(Debug, Deserialize)]
pub struct CatalogHeader {
    pub description: String,
    pub total_authors: usize,
    pub total_books: usize,
}

/// One author line of the fixture
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorEntry {
    pub first_name: String,
    pub last_name: String,
    pub books: Vec<String>,
}

/// Parsed fixture
#[derive(Debug)]
pub struct CatalogData {
    pub header: CatalogHeader,
    pub authors: Vec<AuthorEntry>,
}

/// Ids assigned when the fixture was loaded into a library
#[derive(Debug, Default)]
pub struct LoadedCatalog {
    pub authors: Vec<(AuthorId, AuthorEntry)>,
    pub books: Vec<(BookId, String)>,
}

impl LoadedCatalog {
    pub fn author(&self, last_name: &str, first_name: &str) -> AuthorId {
        self.authors
            .iter()
            .find(|(_, a)| a.last_name == last_name && a.first_name == first_name)
            .map(|(id, _)| *id)
            .expect("author not in fixture")
    }

    pub fn book(&self, title: &str) -> BookId {
        self.books
            .iter()
            .find(|(_, t)| t == title)
            .map(|(id, _)| *id)
            .expect("book not in fixture")
    }
}

pub fn testdata_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("library_comprehensive")
        .join("testdata")
}

pub fn load_catalog_data() -> CatalogData {
    let path = testdata_dir().join("catalog.jsonl");
    let file = File::open(&path).unwrap_or_else(|e| panic!("open {}: {}", path.display(), e));
    let mut lines = BufReader::new(file).lines().map(|l| l.expect("read line"));

    let header: CatalogHeader =
        serde_json::from_str(&lines.next().expect("header line")).expect("parse header");
    let authors: Vec<AuthorEntry> = lines
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(&l).expect("parse author line"))
        .collect();
    CatalogData { header, authors }
}

/// Add every author and book of the fixture, in file order
pub fn load_into(library: &Library) -> LoadedCatalog {
    let data = load_catalog_data();
    let mut loaded = LoadedCatalog::default();
    for entry in data.authors {
        let author = library
            .add_author(&entry.first_name, &entry.last_name)
            .unwrap();
        for title in &entry.books {
            let book = library.add_book(title, author).unwrap().unwrap();
            loaded.books.push((book, title.clone()));
        }
        loaded.authors.push((author, entry));
    }
    loaded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_catalog_data() {
        let data = load_catalog_data();
        assert!(!data.header.description.is_empty());
        assert_eq!(data.authors.len(), data.header.total_authors);
        let books: usize = data.authors.iter().map(|a| a.books.len()).sum();
        assert_eq!(books, data.header.total_books);
    }
}
