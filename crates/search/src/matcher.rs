//! Term matchers for wildcard and fuzzy queries
//!
//! Both run over term dictionaries, never over stored text:
//! - [`WildcardPattern`] is a glob (`*`, `?`) over lowercase, folded words
//! - [`fuzzy_distance`] is a bounded Levenshtein distance with an exact prefix

use crate::analyzer::sort_key;
use libris_core::{LibrisError, LibrisResult};

/// A compiled glob pattern
///
/// `*` matches any sequence (including empty), `?` exactly one character.
/// The pattern is lowercased and folded but not analyzed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WildcardPattern {
    chars: Vec<char>,
}

impl WildcardPattern {
    /// Compile a pattern; a blank pattern is an `InvalidQuery` error
    pub fn compile(pattern: &str) -> LibrisResult<Self> {
        let normalized = sort_key(pattern);
        if normalized.is_empty() {
            return Err(LibrisError::invalid_query("wildcard pattern is blank"));
        }
        Ok(WildcardPattern {
            chars: normalized.chars().collect(),
        })
    }

    /// Characters before the first wildcard
    pub fn literal_prefix(&self) -> String {
        self.chars
            .iter()
            .take_while(|c| **c != '*' && **c != '?')
            .collect()
    }

    /// True when the pattern has no wildcard characters
    pub fn is_literal(&self) -> bool {
        !self.chars.iter().any(|c| *c == '*' || *c == '?')
    }

    /// Match a whole string against the pattern
    ///
    /// # Example
    ///
    /// ```
    /// use libris_search::matcher::WildcardPattern;
    ///
    /// let pattern = WildcardPattern::compile("Prejudic*").unwrap();
    /// assert!(pattern.matches("prejudice"));
    /// assert!(!pattern.matches("pride"));
    /// ```
    pub fn matches(&self, text: &str) -> bool {
        let text: Vec<char> = text.chars().collect();
        let (mut p, mut t) = (0usize, 0usize);
        // Last `*` seen and the text position it was tried at
        let mut star: Option<(usize, usize)> = None;

        while t < text.len() {
            if p < self.chars.len() && (self.chars[p] == '?' || self.chars[p] == text[t]) {
                p += 1;
                t += 1;
            } else if p < self.chars.len() && self.chars[p] == '*' {
                star = Some((p, t));
                p += 1;
            } else if let Some((sp, st)) = star {
                // Let the star absorb one more character
                p = sp + 1;
                t = st + 1;
                star = Some((sp, st + 1));
            } else {
                return false;
            }
        }
        while p < self.chars.len() && self.chars[p] == '*' {
            p += 1;
        }
        p == self.chars.len()
    }
}

/// Levenshtein distance between `a` and `b`, or `None` if it exceeds `max`
pub fn bounded_levenshtein(a: &str, b: &str, max: u32) -> Option<u32> {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let max = max as usize;
    if a.len().abs_diff(b.len()) > max {
        return None;
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        let mut row_min = curr[0];
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
            row_min = row_min.min(curr[j + 1]);
        }
        if row_min > max {
            return None;
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    let distance = prev[b.len()];
    (distance <= max).then_some(distance as u32)
}

/// Fuzzy match of an index term against a query term
///
/// The first `prefix_len` characters of the query term must appear
/// unchanged at the start of the candidate; the full strings must then be
/// within `max_edits`.
pub fn fuzzy_distance(query: &str, candidate: &str, max_edits: u8, prefix_len: usize) -> Option<u32> {
    let prefix: String = query.chars().take(prefix_len).collect();
    if !candidate.starts_with(&prefix) {
        return None;
    }
    bounded_levenshtein(query, candidate, max_edits as u32)
}

/// Similarity boost for a fuzzy match: 1.0 for exact, lower per edit
pub fn similarity(distance: u32, query: &str, candidate: &str) -> f32 {
    if distance == 0 {
        return 1.0;
    }
    let shortest = query.chars().count().min(candidate.chars().count()).max(1) as f32;
    (1.0 - distance as f32 / shortest).max(0.1)
}
