//! Query contracts
//!
//! This module defines the request/response types shared by the query
//! engine, the engine facade and the command surface:
//! - QuerySpec: mode + fields + sort + pagination, consumed by one dispatcher
//! - QueryMode: the seven matching strategies
//! - SortSpec / PageRequest: deterministic ordering and paging
//! - SearchHit / SearchResponse / SearchStats: results plus timing

use crate::entity::Entity;
use crate::error::{LibrisError, LibrisResult};
use crate::types::{EntityKind, EntityRef};
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ============================================================================
// QueryMode
// ============================================================================

/// Matching strategy of a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QueryMode {
    /// Unconditional match
    MatchAll,
    /// Exact match on the entity id
    ById(u64),
    /// Simple query string over the entity's default text fields
    Simple {
        /// Query string (`term`, `term*`, `"phrase"`, `+term`, `-term`, `term~N`)
        pattern: String,
    },
    /// Glob pattern (`*`, `?`) over unanalyzed words
    Wildcard {
        /// Glob pattern
        pattern: String,
    },
    /// Phrase allowing displaced words
    Phrase {
        /// Phrase text
        pattern: String,
        /// Maximum displacement; `None` uses the configured default
        slop: Option<u32>,
    },
    /// Everything except documents matching the pattern
    Exclusion {
        /// Terms that disqualify a document
        pattern: String,
    },
    /// Bounded edit-distance matching
    Fuzzy {
        /// Query text
        pattern: String,
        /// Maximum edits per term; `None` uses the configured default
        max_edits: Option<u8>,
        /// Leading characters that must match exactly; `None` uses the default
        prefix_length: Option<usize>,
    },
}

impl QueryMode {
    /// Pattern text for text modes, `None` for MatchAll/ById
    pub fn pattern(&self) -> Option<&str> {
        match self {
            QueryMode::MatchAll | QueryMode::ById(_) => None,
            QueryMode::Simple { pattern }
            | QueryMode::Wildcard { pattern }
            | QueryMode::Phrase { pattern, .. }
            | QueryMode::Exclusion { pattern }
            | QueryMode::Fuzzy { pattern, .. } => Some(pattern),
        }
    }

    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            QueryMode::MatchAll => "match_all",
            QueryMode::ById(_) => "by_id",
            QueryMode::Simple { .. } => "simple",
            QueryMode::Wildcard { .. } => "wildcard",
            QueryMode::Phrase { .. } => "phrase",
            QueryMode::Exclusion { .. } => "exclusion",
            QueryMode::Fuzzy { .. } => "fuzzy",
        }
    }
}

// ============================================================================
// SortSpec
// ============================================================================

/// Result ordering
///
/// Ties always resolve by ascending document ordinal (first-indexed first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortSpec {
    /// The entity's declared sort keywords
    /// (Author: lastName_sort then firstName_sort; Book: title_sort)
    Fields,
    /// Descending relevance score
    ScoreDesc,
}

impl SortSpec {
    /// Default ordering for a mode on an entity
    ///
    /// Author free-text results browse alphabetically, book free-text
    /// results rank by relevance.
    pub fn default_for(entity: EntityKind, mode: &QueryMode) -> SortSpec {
        match mode {
            QueryMode::MatchAll | QueryMode::ById(_) => SortSpec::Fields,
            QueryMode::Simple { .. } => match entity {
                EntityKind::Author => SortSpec::Fields,
                EntityKind::Book => SortSpec::ScoreDesc,
            },
            _ => SortSpec::ScoreDesc,
        }
    }
}

// ============================================================================
// PageRequest
// ============================================================================

/// 1-indexed page of results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number, starting at 1
    pub page: u32,
    /// Results per page
    pub limit: u32,
}

impl PageRequest {
    /// Create a page request, rejecting zero page or limit
    pub fn new(page: u32, limit: u32) -> LibrisResult<Self> {
        let req = PageRequest { page, limit };
        req.validate()?;
        Ok(req)
    }

    /// Check page and limit are positive
    pub fn validate(&self) -> LibrisResult<()> {
        if self.page == 0 {
            return Err(LibrisError::invalid_query("page must be >= 1"));
        }
        if self.limit == 0 {
            return Err(LibrisError::invalid_query("limit must be >= 1"));
        }
        Ok(())
    }

    /// Number of results skipped: limit × (page − 1)
    pub fn offset(&self) -> usize {
        self.limit as usize * (self.page.saturating_sub(1)) as usize
    }
}

// ============================================================================
// QuerySpec
// ============================================================================

/// A complete query: what to match, where, in which order, which slice
///
/// # Examples
///
/// ```
/// use libris_core::{EntityKind, QueryMode, QuerySpec, SortSpec};
///
/// let spec = QuerySpec::new(EntityKind::Book, QueryMode::Simple { pattern: "prejudice".into() })
///     .with_size(10);
///
/// assert_eq!(spec.effective_sort(), SortSpec::ScoreDesc);
/// assert_eq!(spec.size, Some(10));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuerySpec {
    /// Entity type to search
    pub entity: EntityKind,
    /// Matching strategy
    pub mode: QueryMode,
    /// Target fields; `None` uses the entity's default text fields
    pub fields: Option<Vec<String>>,
    /// Ordering; `None` uses [`SortSpec::default_for`]
    pub sort: Option<SortSpec>,
    /// Page slice, applied after sorting
    pub page: Option<PageRequest>,
    /// Cap on returned results; `None` returns every match
    pub size: Option<usize>,
}

impl QuerySpec {
    /// Create a spec with default fields, sort and no paging
    pub fn new(entity: EntityKind, mode: QueryMode) -> Self {
        QuerySpec {
            entity,
            mode,
            fields: None,
            sort: None,
            page: None,
            size: None,
        }
    }

    /// Match every document of `entity`
    pub fn match_all(entity: EntityKind) -> Self {
        Self::new(entity, QueryMode::MatchAll)
    }

    /// Builder: restrict to fields
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Builder: set ordering
    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Builder: set page slice
    pub fn with_page(mut self, page: PageRequest) -> Self {
        self.page = Some(page);
        self
    }

    /// Builder: cap result count
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }

    /// Builder: optional cap
    pub fn with_size_opt(mut self, size: Option<usize>) -> Self {
        self.size = size;
        self
    }

    /// Ordering after defaults are applied
    pub fn effective_sort(&self) -> SortSpec {
        self.sort
            .unwrap_or_else(|| SortSpec::default_for(self.entity, &self.mode))
    }
}

// ============================================================================
// SearchHit
// ============================================================================

/// A single result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Back-pointer to the source entity
    pub entity_ref: EntityRef,
    /// Relevance score (constant for non-scoring modes)
    pub score: f32,
    /// Rank in the full sorted result set (1-indexed, before paging)
    pub rank: u32,
    /// Stored projection of the entity at index time
    pub source: Entity,
}

// ============================================================================
// SearchStats / SearchResponse
// ============================================================================

/// Execution statistics of a query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Wall time spent executing the query
    pub elapsed: Duration,
    /// Matches before size cap and paging
    pub total_hits: usize,
    /// Documents examined
    pub candidates_considered: usize,
}

impl SearchStats {
    /// Create stats
    pub fn new(elapsed: Duration, total_hits: usize, candidates_considered: usize) -> Self {
        SearchStats {
            elapsed,
            total_hits,
            candidates_considered,
        }
    }
}

/// Query results plus execution metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Hits in result order
    pub hits: Vec<SearchHit>,
    /// Execution statistics
    pub stats: SearchStats,
}

impl SearchResponse {
    /// Create an empty response
    pub fn empty() -> Self {
        Self::default()
    }

    /// Check if response has no hits
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Number of hits
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// Entity references in result order
    pub fn refs(&self) -> Vec<EntityRef> {
        self.hits.iter().map(|h| h.entity_ref).collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
