//! Search tuning knobs
//!
//! Loaded as the `[search]` table of the library configuration. Every
//! field has a default, so an empty table is valid.

use libris_core::{LibrisError, LibrisResult};
use serde::{Deserialize, Serialize};

/// Default phrase slop
pub const DEFAULT_PHRASE_SLOP: u32 = 2;
/// Default fuzzy edit distance
pub const DEFAULT_FUZZY_MAX_EDITS: u8 = 1;
/// Default number of leading characters that must match exactly in fuzzy mode
pub const DEFAULT_FUZZY_PREFIX_LENGTH: usize = 3;
/// Default position gap between values of a multi-valued field
pub const DEFAULT_POSITION_GAP: u32 = 100;
/// Largest edit distance any fuzzy query may request
pub const MAX_FUZZY_EDITS: u8 = 2;

/// Search settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Slop used when a phrase query does not specify one
    pub phrase_slop: u32,
    /// Edit distance used when a fuzzy query does not specify one
    pub fuzzy_max_edits: u8,
    /// Exact-prefix length used when a fuzzy query does not specify one
    pub fuzzy_prefix_length: usize,
    /// Positions inserted between values of a multi-valued field
    pub position_increment_gap: u32,
    /// BM25 term-frequency saturation
    pub bm25_k1: f32,
    /// BM25 length normalization
    pub bm25_b: f32,
}

impl Default for SearchSettings {
    fn default() -> Self {
        SearchSettings {
            phrase_slop: DEFAULT_PHRASE_SLOP,
            fuzzy_max_edits: DEFAULT_FUZZY_MAX_EDITS,
            fuzzy_prefix_length: DEFAULT_FUZZY_PREFIX_LENGTH,
            position_increment_gap: DEFAULT_POSITION_GAP,
            bm25_k1: 1.2,
            bm25_b: 0.75,
        }
    }
}

impl SearchSettings {
    /// Check value ranges
    pub fn validate(&self) -> LibrisResult<()> {
        if self.fuzzy_max_edits > MAX_FUZZY_EDITS {
            return Err(LibrisError::config(format!(
                "search.fuzzy_max_edits must be at most {}, got {}",
                MAX_FUZZY_EDITS, self.fuzzy_max_edits
            )));
        }
        if self.position_increment_gap <= self.phrase_slop {
            return Err(LibrisError::config(format!(
                "search.position_increment_gap ({}) must exceed search.phrase_slop ({})",
                self.position_increment_gap, self.phrase_slop
            )));
        }
        if !self.bm25_k1.is_finite() || self.bm25_k1 < 0.0 {
            return Err(LibrisError::config("search.bm25_k1 must be a non-negative number"));
        }
        if !self.bm25_b.is_finite() || !(0.0..=1.0).contains(&self.bm25_b) {
            return Err(LibrisError::config("search.bm25_b must be between 0 and 1"));
        }
        Ok(())
    }
}
