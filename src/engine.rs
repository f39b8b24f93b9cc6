//! Search engine state
//!
//! Holds one immutable corpus snapshot (records, folded texts, character
//! index). `load` builds a complete replacement before swapping it in, so a
//! concurrent search sees either the old snapshot or the new one.

use crate::error::SearchError;
use crate::index::char_index::CharIndex;
use crate::index::types::{MatchResult, SearchHit, SearchOptions, SearchPage, SubtitleRecord};
use crate::query::executor::QueryExecutor;
use crate::query::parser::{parse_query, Query};
use crate::query::ranker::{paginate, rank, total_pages};
use crate::utils::fold_case;
use rayon::prelude::*;
use std::sync::{Arc, RwLock};

/// One loaded corpus with its character index
pub struct Snapshot {
    records: Vec<SubtitleRecord>,
    folded: Vec<String>,
    index: CharIndex,
}

impl Snapshot {
    /// Fold every text and build the character index
    pub fn build(records: Vec<SubtitleRecord>) -> Self {
        let folded: Vec<String> = records.par_iter().map(|r| fold_case(&r.text)).collect();
        let index = CharIndex::from_folded(&folded);
        Self {
            records,
            folded,
            index,
        }
    }

    pub fn records(&self) -> &[SubtitleRecord] {
        &self.records
    }

    pub fn index(&self) -> &CharIndex {
        &self.index
    }

    pub fn executor(&self) -> QueryExecutor<'_> {
        QueryExecutor::new(&self.index, &self.records, &self.folded)
    }

    /// Match and rank a parsed query, returning every hit that survives
    /// `options` (before pagination). Options are taken as already validated.
    pub fn ranked_matches(&self, query: &Query, options: &SearchOptions) -> Vec<MatchResult> {
        let mut results = self
            .executor()
            .execute(query, options.min_ratio, options.min_similarity);
        rank(&mut results);

        if let Some(max) = options.max_results {
            results.truncate(max);
        }
        results
    }

    /// Run a parsed query and return the requested page
    pub fn search(&self, query: &Query, options: &SearchOptions) -> SearchPage {
        let ranked = self.ranked_matches(query, options);

        let hits = paginate(&ranked, options.page_size, options.page)
            .iter()
            .map(|m| SearchHit::from_match(&self.records[m.record as usize], m))
            .collect();

        SearchPage {
            hits,
            page: options.page,
            page_size: options.page_size,
            total_hits: ranked.len(),
            total_pages: total_pages(ranked.len(), options.page_size),
        }
    }
}

/// Owned search engine with an explicit load lifecycle
#[derive(Default)]
pub struct SearchEngine {
    snapshot: RwLock<Option<Arc<Snapshot>>>,
}

impl SearchEngine {
    /// Create an engine with no corpus. Searches fail with `NotReady` until `load`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine and load `records`
    pub fn with_corpus(records: Vec<SubtitleRecord>) -> Self {
        let engine = Self::new();
        engine.load(records);
        engine
    }

    /// Replace the corpus. The new index is built before the swap.
    pub fn load(&self, records: Vec<SubtitleRecord>) {
        let snapshot = Arc::new(Snapshot::build(records));
        log::info!(
            "corpus loaded: {} records, {} indexed characters",
            snapshot.records.len(),
            snapshot.index.len()
        );

        match self.snapshot.write() {
            Ok(mut guard) => *guard = Some(snapshot),
            Err(poisoned) => *poisoned.into_inner() = Some(snapshot),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.current().is_some()
    }

    /// The snapshot searches currently run against
    pub fn current(&self) -> Option<Arc<Snapshot>> {
        match self.snapshot.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Run a query against the current snapshot
    pub fn search(&self, query: &str, options: &SearchOptions) -> Result<SearchPage, SearchError> {
        // Validate before checking readiness so bad input is reported as such
        options.validate()?;
        let query = parse_query(query)?;

        let snapshot = self.current().ok_or(SearchError::NotReady)?;
        Ok(snapshot.search(&query, options))
    }
}
