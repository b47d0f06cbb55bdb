//! Query engine
//!
//! A single dispatcher, [`QueryEngine::execute`], runs every [`QueryMode`]
//! against one entity segment:
//!
//! ```text
//! QuerySpec
//!    │ validate (pattern, fields, paging)
//!    ▼
//! match mode ──► scores: doc id -> score
//!    │
//!    ▼
//! sort (declared fields | score desc, then doc id) ──► rank ──► page ──► size cap
//!    │
//!    ▼
//! SearchResponse { hits, stats }
//! ```
//!
//! Multi-field modes keep the best field score per document. The segment's
//! read lock is held for the whole run.

use crate::analyzer::{sort_key, Token};
use crate::index::{DocId, SearchIndex, Segment};
use crate::matcher::{fuzzy_distance, similarity, WildcardPattern};
use crate::projection::{self, FieldDef};
use crate::query_string::{self, Clause, Occur};
use crate::scorer::{Bm25Scorer, Scorer};
use crate::settings::{SearchSettings, MAX_FUZZY_EDITS};
use libris_core::{
    LibrisError, LibrisResult, QueryMode, QuerySpec, SearchHit, SearchResponse, SearchStats,
    SortSpec,
};
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

type Scores = FxHashMap<DocId, f32>;

/// Score given to documents matched by non-scoring modes
const CONSTANT_SCORE: f32 = 1.0;

// ============================================================================
// QueryEngine
// ============================================================================

/// Executes query specifications against a [`SearchIndex`]
///
/// Stateless apart from its settings; share it freely across threads.
#[derive(Clone)]
pub struct QueryEngine {
    index: Arc<SearchIndex>,
    settings: SearchSettings,
    scorer: Arc<dyn Scorer>,
}

impl QueryEngine {
    /// Create an engine scoring with BM25 parameters from `settings`
    pub fn new(index: Arc<SearchIndex>, settings: SearchSettings) -> Self {
        let scorer = Arc::new(Bm25Scorer::new(settings.bm25_k1, settings.bm25_b));
        QueryEngine {
            index,
            settings,
            scorer,
        }
    }

    /// Builder: replace the scorer
    pub fn with_scorer(mut self, scorer: Arc<dyn Scorer>) -> Self {
        self.scorer = scorer;
        self
    }

    /// The index queried
    pub fn index(&self) -> &Arc<SearchIndex> {
        &self.index
    }

    /// Active settings
    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Run a query
    ///
    /// # Errors
    ///
    /// `InvalidQuery` for a blank pattern in a text mode, a malformed query
    /// string, an unknown or sort-only field, a fuzzy edit distance above 2,
    /// or a zero page, limit or size.
    pub fn execute(&self, spec: &QuerySpec) -> LibrisResult<SearchResponse> {
        let start = Instant::now();
        validate(spec)?;
        let fields = projection::resolve_search_fields(spec.entity, spec.fields.as_deref())?;

        let segment = self.index.read(spec.entity);
        let mut run = QueryRun {
            engine: self,
            segment: &segment,
            fields,
            candidates: 0,
        };
        let scores = run.matches(&spec.mode)?;
        let candidates = run.candidates;
        let total_hits = scores.len();
        let hits = collect(&segment, spec, scores);
        drop(segment);

        let elapsed = start.elapsed();
        debug!(
            target: "libris::search",
            entity = %spec.entity,
            mode = spec.mode.name(),
            total_hits,
            returned = hits.len(),
            elapsed_us = elapsed.as_micros() as u64,
            "query executed"
        );
        Ok(SearchResponse {
            hits,
            stats: SearchStats::new(elapsed, total_hits, candidates),
        })
    }
}

fn validate(spec: &QuerySpec) -> LibrisResult<()> {
    if let Some(page) = &spec.page {
        page.validate()?;
    }
    if spec.size == Some(0) {
        return Err(LibrisError::invalid_query("size must be >= 1"));
    }
    if let Some(pattern) = spec.mode.pattern() {
        if pattern.trim().is_empty() {
            return Err(LibrisError::invalid_query(format!(
                "{} query needs a non-blank pattern",
                spec.mode.name()
            )));
        }
    }
    if let QueryMode::Fuzzy {
        max_edits: Some(edits),
        ..
    } = spec.mode
    {
        if edits > MAX_FUZZY_EDITS {
            return Err(LibrisError::invalid_query(format!(
                "fuzzy edit distance {} exceeds {}",
                edits, MAX_FUZZY_EDITS
            )));
        }
    }
    Ok(())
}

/// Sort, rank, page and cap the matches
fn collect(segment: &Segment, spec: &QuerySpec, scores: Scores) -> Vec<SearchHit> {
    let mut matched: Vec<(DocId, f32)> = scores.into_iter().collect();
    match spec.effective_sort() {
        SortSpec::Fields => matched.sort_by(|a, b| {
            let ka = segment.document(a.0).map(|d| &d.sort_keys);
            let kb = segment.document(b.0).map(|d| &d.sort_keys);
            ka.cmp(&kb).then(a.0.cmp(&b.0))
        }),
        SortSpec::ScoreDesc => {
            matched.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)))
        }
    }

    let (offset, limit) = match spec.page {
        Some(page) => (page.offset(), page.limit as usize),
        None => (0, usize::MAX),
    };
    let cap = spec.size.unwrap_or(usize::MAX);

    matched
        .into_iter()
        .enumerate()
        .skip(offset)
        .take(limit.min(cap))
        .filter_map(|(i, (doc, score))| {
            let document = segment.document(doc)?;
            Some(SearchHit {
                entity_ref: document.entity_ref,
                score,
                rank: i as u32 + 1,
                source: document.source.clone(),
            })
        })
        .collect()
}

/// Keep the higher score per document
fn merge_best(into: &mut Scores, from: Scores) {
    for (doc, score) in from {
        let entry = into.entry(doc).or_insert(score);
        if score > *entry {
            *entry = score;
        }
    }
}

// ============================================================================
// QueryRun
// ============================================================================

/// State of one query against one segment
struct QueryRun<'a> {
    engine: &'a QueryEngine,
    segment: &'a Segment,
    fields: Vec<&'static FieldDef>,
    /// Dictionary entries and postings examined
    candidates: usize,
}

impl<'a> QueryRun<'a> {
    fn matches(&mut self, mode: &QueryMode) -> LibrisResult<Scores> {
        let settings = &self.engine.settings;
        match mode {
            QueryMode::MatchAll => Ok(self.match_all()),
            QueryMode::ById(id) => Ok(self.by_id(*id)),
            QueryMode::Simple { pattern } => self.simple(pattern),
            QueryMode::Wildcard { pattern } => self.wildcard(pattern),
            QueryMode::Phrase { pattern, slop } => {
                Ok(self.phrase(pattern, slop.unwrap_or(settings.phrase_slop)))
            }
            QueryMode::Exclusion { pattern } => Ok(self.exclusion(pattern)),
            QueryMode::Fuzzy {
                pattern,
                max_edits,
                prefix_length,
            } => Ok(self.fuzzy(
                pattern,
                max_edits.unwrap_or(settings.fuzzy_max_edits),
                prefix_length.unwrap_or(settings.fuzzy_prefix_length),
            )),
        }
    }

    /// Run `f` per field and keep the best score per document
    fn best_field<F>(&mut self, mut f: F) -> Scores
    where
        F: FnMut(&mut Self, &'static FieldDef) -> Scores,
    {
        let mut best = Scores::default();
        for field in self.fields.clone() {
            let scores = f(self, field);
            merge_best(&mut best, scores);
        }
        best
    }

    fn match_all(&mut self) -> Scores {
        let segment = self.segment;
        self.candidates += segment.len();
        segment
            .iter()
            .map(|(doc, _)| (doc, CONSTANT_SCORE))
            .collect()
    }

    fn by_id(&mut self, id: u64) -> Scores {
        let segment = self.segment;
        let mut scores = Scores::default();
        if let Some(doc) = segment.doc_id(id) {
            self.candidates += 1;
            scores.insert(doc, CONSTANT_SCORE);
        }
        scores
    }

    // ------------------------------------------------------------------------
    // Simple query string
    // ------------------------------------------------------------------------

    fn simple(&mut self, pattern: &str) -> LibrisResult<Scores> {
        let parsed = query_string::parse(pattern)?;

        let mut required: Vec<Scores> = Vec::new();
        let mut optional: Vec<Scores> = Vec::new();
        let mut excluded: FxHashSet<DocId> = FxHashSet::default();
        let mut negated = false;
        for (occur, clause) in &parsed.clauses {
            // A clause with no terms in any field does not take part
            let Some(scores) = self.clause_scores(clause) else {
                continue;
            };
            match occur {
                Occur::Must => required.push(scores),
                Occur::Should => optional.push(scores),
                Occur::MustNot => {
                    negated = true;
                    excluded.extend(scores.into_keys());
                }
            }
        }

        let mut result = if required.is_empty() && optional.is_empty() {
            if negated {
                self.match_all()
            } else {
                Scores::default()
            }
        } else if let Some((first, rest)) = required.split_first() {
            let mut all = first.clone();
            all.retain(|doc, _| rest.iter().all(|r| r.contains_key(doc)));
            for r in rest {
                for (doc, score) in all.iter_mut() {
                    *score += r.get(doc).copied().unwrap_or(0.0);
                }
            }
            for o in &optional {
                for (doc, score) in all.iter_mut() {
                    *score += o.get(doc).copied().unwrap_or(0.0);
                }
            }
            all
        } else {
            let mut any = Scores::default();
            for o in optional {
                for (doc, score) in o {
                    *any.entry(doc).or_insert(0.0) += score;
                }
            }
            any
        };
        result.retain(|doc, _| !excluded.contains(doc));
        Ok(result)
    }

    /// Best field score per document, `None` when the clause analyzes to
    /// no terms in every field
    fn clause_scores(&mut self, clause: &Clause) -> Option<Scores> {
        let mut best: Option<Scores> = None;
        for field in self.fields.clone() {
            if let Some(scores) = self.clause(field, clause) {
                merge_best(best.get_or_insert_with(Scores::default), scores);
            }
        }
        best
    }

    fn clause(&mut self, field: &'static FieldDef, clause: &Clause) -> Option<Scores> {
        let analyzer = field.analyzer()?;
        match clause {
            Clause::Term(text) => {
                let terms = analyzer.unique_terms(text);
                (!terms.is_empty()).then(|| self.score_terms(field.name, &terms))
            }
            Clause::Prefix(text) => {
                let prefix = sort_key(text);
                (!prefix.is_empty()).then(|| self.prefix(field.name, &prefix))
            }
            Clause::Phrase { text, slop } => {
                let tokens = analyzer.analyze(text);
                (!tokens.is_empty()).then(|| self.phrase_in_field(field.name, &tokens, *slop))
            }
            Clause::Fuzzy { text, edits } => {
                let terms = analyzer.unique_terms(text);
                (!terms.is_empty()).then(|| self.fuzzy_in_field(field.name, &terms, *edits, 0))
            }
        }
    }

    /// Sum of BM25 scores of `terms` per document
    fn score_terms(&mut self, field: &str, terms: &[String]) -> Scores {
        let segment = self.segment;
        let mut scores = Scores::default();
        for term in terms {
            let Some(postings) = segment.postings(field, term) else {
                continue;
            };
            self.candidates += postings.len();
            for &doc in postings.keys() {
                if let Some(stats) = segment.term_stats(field, term, doc) {
                    *scores.entry(doc).or_insert(0.0) += self.engine.scorer.score_term(&stats);
                }
            }
        }
        scores
    }

    /// Documents with a word or term starting with `prefix`
    fn prefix(&mut self, field: &str, prefix: &str) -> Scores {
        let segment = self.segment;
        let mut scores = Scores::default();
        if prefix.is_empty() {
            return scores;
        }
        for (word, docs) in segment.words(field) {
            self.candidates += 1;
            if word.starts_with(prefix) {
                scores.extend(docs.iter().map(|d| (*d, CONSTANT_SCORE)));
            }
        }
        for (term, postings) in segment.terms(field) {
            self.candidates += 1;
            if term.starts_with(prefix) {
                scores.extend(postings.keys().map(|d| (*d, CONSTANT_SCORE)));
            }
        }
        scores
    }

    // ------------------------------------------------------------------------
    // Wildcard
    // ------------------------------------------------------------------------

    fn wildcard(&mut self, pattern: &str) -> LibrisResult<Scores> {
        let pattern = WildcardPattern::compile(pattern)?;
        let prefix = pattern.literal_prefix();
        Ok(self.best_field(|run, field| {
            let mut scores = Scores::default();
            let segment = run.segment;
            let entries = segment.words(field.name).chain(segment.values(field.name));
            for (text, docs) in entries {
                if !text.starts_with(&prefix) {
                    continue;
                }
                run.candidates += 1;
                if pattern.matches(text) {
                    scores.extend(docs.iter().map(|d| (*d, CONSTANT_SCORE)));
                }
            }
            scores
        }))
    }

    // ------------------------------------------------------------------------
    // Phrase
    // ------------------------------------------------------------------------

    fn phrase(&mut self, pattern: &str, slop: u32) -> Scores {
        self.best_field(|run, field| match field.analyzer() {
            Some(analyzer) => run.phrase_in_field(field.name, &analyzer.analyze(pattern), slop),
            None => Scores::default(),
        })
    }

    /// Documents containing the phrase within `slop`
    ///
    /// A document's distance is the smallest spread of `position - query
    /// position` over the phrase terms; its score is the BM25 of the terms
    /// divided by `1 + distance`.
    fn phrase_in_field(&mut self, field: &str, tokens: &[Token], slop: u32) -> Scores {
        let segment = self.segment;
        let mut scores = Scores::default();
        if tokens.is_empty() {
            return scores;
        }
        let mut postings = Vec::with_capacity(tokens.len());
        for token in tokens {
            match segment.postings(field, &token.term) {
                Some(p) => postings.push(p),
                None => return scores,
            }
        }

        let Some(smallest) = postings.iter().min_by_key(|p| p.len()) else {
            return scores;
        };
        let mut distinct: Vec<&str> = tokens.iter().map(|t| t.term.as_str()).collect();
        distinct.sort_unstable();
        distinct.dedup();

        // Repeated words must land on different positions
        let repeats = distinct.len() < tokens.len();

        for &doc in smallest.keys() {
            self.candidates += 1;
            let mut candidates: Vec<Vec<(i64, u32)>> = Vec::with_capacity(tokens.len());
            for (token, p) in tokens.iter().zip(&postings) {
                let Some(positions) = p.get(&doc) else {
                    break;
                };
                let mut list: Vec<(i64, u32)> = positions
                    .iter()
                    .map(|&pos| (pos as i64 - token.position as i64, pos))
                    .collect();
                list.sort_unstable();
                candidates.push(list);
            }
            if candidates.len() != tokens.len() {
                continue;
            }
            let distance = if repeats {
                smallest_distinct_spread(&candidates, slop as i64)
            } else {
                let offsets: Vec<Vec<i64>> = candidates
                    .iter()
                    .map(|list| list.iter().map(|(offset, _)| *offset).collect())
                    .collect();
                smallest_spread(&offsets)
            };
            if distance > slop as i64 {
                continue;
            }
            let relevance: f32 = distinct
                .iter()
                .filter_map(|term| segment.term_stats(field, term, doc))
                .map(|stats| self.engine.scorer.score_term(&stats))
                .sum();
            scores.insert(doc, relevance / (1.0 + distance as f32));
        }
        scores
    }

    // ------------------------------------------------------------------------
    // Exclusion
    // ------------------------------------------------------------------------

    /// Every document except those matching any analyzed term of `pattern`
    fn exclusion(&mut self, pattern: &str) -> Scores {
        let segment = self.segment;
        let mut excluded: FxHashSet<DocId> = FxHashSet::default();
        for field in self.fields.clone() {
            let Some(analyzer) = field.analyzer() else {
                continue;
            };
            for term in analyzer.unique_terms(pattern) {
                if let Some(postings) = segment.postings(field.name, &term) {
                    self.candidates += postings.len();
                    excluded.extend(postings.keys().copied());
                }
            }
        }
        let mut scores = self.match_all();
        scores.retain(|doc, _| !excluded.contains(doc));
        scores
    }

    // ------------------------------------------------------------------------
    // Fuzzy
    // ------------------------------------------------------------------------

    fn fuzzy(&mut self, pattern: &str, max_edits: u8, prefix_len: usize) -> Scores {
        self.best_field(|run, field| match field.analyzer() {
            Some(analyzer) => {
                run.fuzzy_in_field(field.name, &analyzer.unique_terms(pattern), max_edits, prefix_len)
            }
            None => Scores::default(),
        })
    }

    /// Per query term, the best-scoring index term within `max_edits`;
    /// query terms add up
    fn fuzzy_in_field(
        &mut self,
        field: &str,
        terms: &[String],
        max_edits: u8,
        prefix_len: usize,
    ) -> Scores {
        let segment = self.segment;
        let mut scores = Scores::default();
        for query_term in terms {
            let mut best = Scores::default();
            for (term, postings) in segment.terms(field) {
                self.candidates += 1;
                let Some(distance) = fuzzy_distance(query_term, term, max_edits, prefix_len) else {
                    continue;
                };
                let boost = similarity(distance, query_term, term);
                for &doc in postings.keys() {
                    let Some(stats) = segment.term_stats(field, term, doc) else {
                        continue;
                    };
                    let score = self.engine.scorer.score_term(&stats) * boost;
                    let entry = best.entry(doc).or_insert(score);
                    if score > *entry {
                        *entry = score;
                    }
                }
            }
            for (doc, score) in best {
                *scores.entry(doc).or_insert(0.0) += score;
            }
        }
        scores
    }
}

/// Smallest `max - min` choosing one value from each sorted list
fn smallest_spread(lists: &[Vec<i64>]) -> i64 {
    if lists.iter().any(|l| l.is_empty()) {
        return i64::MAX;
    }
    let mut cursor = vec![0usize; lists.len()];
    let mut best = i64::MAX;
    loop {
        let mut min_list = 0;
        let mut min = i64::MAX;
        let mut max = i64::MIN;
        for (i, list) in lists.iter().enumerate() {
            let value = list[cursor[i]];
            if value < min {
                min = value;
                min_list = i;
            }
            max = max.max(value);
        }
        best = best.min(max - min);
        cursor[min_list] += 1;
        if best == 0 || cursor[min_list] == lists[min_list].len() {
            return best;
        }
    }
}

/// Smallest spread of offsets choosing one `(offset, position)` per list
/// with every document position used at most once
///
/// Returns a value above `limit` when no choice stays within it.
fn smallest_distinct_spread(lists: &[Vec<(i64, u32)>], limit: i64) -> i64 {
    let mut best = limit.saturating_add(1);
    let mut used = Vec::with_capacity(lists.len());
    distinct_spread(lists, &mut used, i64::MAX, i64::MIN, &mut best);
    best
}

fn distinct_spread(lists: &[Vec<(i64, u32)>], used: &mut Vec<u32>, lo: i64, hi: i64, best: &mut i64) {
    let Some(list) = lists.get(used.len()) else {
        *best = (*best).min(hi - lo);
        return;
    };
    for &(offset, position) in list {
        if used.contains(&position) {
            continue;
        }
        let (lo, hi) = (lo.min(offset), hi.max(offset));
        if hi - lo >= *best {
            continue;
        }
        used.push(position);
        distinct_spread(lists, used, lo, hi, best);
        used.pop();
    }
}

impl std::fmt::Debug for QueryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryEngine")
            .field("settings", &self.settings)
            .field("scorer", &self.scorer.name())
            .finish()
    }
}
