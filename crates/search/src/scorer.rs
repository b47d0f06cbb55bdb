//! Relevance scoring
//!
//! This module provides:
//! - TermStats: per-(field, term, document) statistics gathered from the index
//! - Scorer trait for pluggable scoring algorithms
//! - Bm25Scorer default implementation

/// Statistics needed to score one term in one document field
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TermStats {
    /// Occurrences of the term in the field
    pub tf: u32,
    /// Field length in terms
    pub field_len: u32,
    /// Average field length across the segment
    pub avg_field_len: f32,
    /// Documents whose field contains the term
    pub doc_freq: usize,
    /// Documents in the segment
    pub doc_count: usize,
}

/// Pluggable scoring interface
///
/// Scorers must be Send + Sync; one scorer is shared by concurrent queries.
pub trait Scorer: Send + Sync {
    /// Score one term occurrence set; higher means more relevant
    fn score_term(&self, stats: &TermStats) -> f32;

    /// Name for debugging and logging
    fn name(&self) -> &str;
}

/// Okapi BM25
///
/// For each term t:
/// score = IDF(t) * (tf * (k1 + 1)) / (tf + k1 * (1 - b + b * dl/avgdl))
///
/// with IDF(t) = ln((N - df + 0.5) / (df + 0.5) + 1), which stays positive
/// even for terms present in every document.
#[derive(Debug, Clone, Copy)]
pub struct Bm25Scorer {
    k1: f32,
    b: f32,
}

impl Default for Bm25Scorer {
    fn default() -> Self {
        Bm25Scorer { k1: 1.2, b: 0.75 }
    }
}

impl Bm25Scorer {
    /// Create a scorer with custom parameters
    pub fn new(k1: f32, b: f32) -> Self {
        Bm25Scorer { k1, b }
    }

    /// Inverse document frequency
    pub fn idf(doc_freq: usize, doc_count: usize) -> f32 {
        let df = doc_freq as f32;
        let n = doc_count as f32;
        ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
    }
}

impl Scorer for Bm25Scorer {
    fn score_term(&self, stats: &TermStats) -> f32 {
        if stats.tf == 0 {
            return 0.0;
        }
        let tf = stats.tf as f32;
        let avg_len = stats.avg_field_len.max(1.0);
        let dl = stats.field_len as f32;
        let idf = Self::idf(stats.doc_freq, stats.doc_count);
        idf * (tf * (self.k1 + 1.0)) / (tf + self.k1 * (1.0 - self.b + self.b * dl / avg_len))
    }

    fn name(&self) -> &str {
        "bm25"
    }
}
