//! Text analyzers
//!
//! Pipelines:
//! - Name:    UAX#29 word boundaries → lowercase → ASCII fold
//! - English: UAX#29 word boundaries → strip possessives → lowercase
//!            → ASCII fold → remove stopwords → Porter stem
//! - Sort:    trim → lowercase → ASCII fold, whole value as one keyword
//!
//! Every word consumes one position, including removed stopwords, so
//! phrase distances reflect the original text.

use crate::folding::fold;
use crate::stemmer;
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// Standard English stopwords (Lucene's default set).
pub const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is", "it",
    "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there", "these",
    "they", "this", "to", "was", "will", "with",
];

#[inline]
fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(&token)
}

/// Strip English possessive suffix (`'s` / `\u{2019}s`).
#[inline]
fn strip_possessive(word: &str) -> &str {
    word.strip_suffix("'s")
        .or_else(|| word.strip_suffix("\u{2019}s"))
        .unwrap_or(word)
}

/// Lowercase and fold one word
#[inline]
fn normalize_word(word: &str) -> String {
    fold(&word.to_lowercase())
}

/// An analyzed term and its position in the source value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Indexed term
    pub term: String,
    /// Word position, counting removed stopwords
    pub position: u32,
}

impl Token {
    /// Create a token
    pub fn new(term: impl Into<String>, position: u32) -> Self {
        Token {
            term: term.into(),
            position,
        }
    }
}

/// Full-text analyzer attached to a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Analyzer {
    /// Person names: no stemming, no stopwords
    Name,
    /// General English text
    English,
}

impl Analyzer {
    /// Analyze text into positioned tokens
    ///
    /// # Example
    ///
    /// ```
    /// use libris_search::analyzer::Analyzer;
    ///
    /// let terms: Vec<_> = Analyzer::English
    ///     .analyze("Pride and Prejudice")
    ///     .into_iter()
    ///     .map(|t| (t.term, t.position))
    ///     .collect();
    /// assert_eq!(terms, vec![("pride".to_string(), 0), ("prejudic".to_string(), 2)]);
    /// ```
    pub fn analyze(&self, text: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        for (position, word) in text.unicode_words().enumerate() {
            let position = position as u32;
            match self {
                Analyzer::Name => {
                    let term = normalize_word(word);
                    if !term.is_empty() {
                        tokens.push(Token::new(term, position));
                    }
                }
                Analyzer::English => {
                    let word = normalize_word(word);
                    let word = strip_possessive(&word);
                    if word.is_empty() || is_stopword(word) {
                        continue;
                    }
                    tokens.push(Token::new(stemmer::stem(word), position));
                }
            }
        }
        tokens
    }

    /// Analyze text, keeping only the terms
    pub fn terms(&self, text: &str) -> Vec<String> {
        self.analyze(text).into_iter().map(|t| t.term).collect()
    }

    /// Analyze text into distinct terms, first occurrence order
    pub fn unique_terms(&self, text: &str) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.terms(text)
            .into_iter()
            .filter(|t| seen.insert(t.clone()))
            .collect()
    }

    /// Analyzer name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Analyzer::Name => "name",
            Analyzer::English => "english",
        }
    }
}

/// Unanalyzed words of a value: lowercase and folded, nothing removed
///
/// Wildcard and prefix matching run against these so that patterns see
/// the words as written rather than their stems.
pub fn raw_words(text: &str) -> Vec<String> {
    text.unicode_words().map(normalize_word).collect()
}

/// Sort normalizer: the whole value as a single keyword
pub fn sort_key(text: &str) -> String {
    normalize_word(text.trim())
}
