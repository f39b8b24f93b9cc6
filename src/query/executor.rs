use crate::error::ValidationError;
use crate::index::char_index::CharIndex;
use crate::index::types::{MatchResult, RecordId, SubtitleRecord};
use crate::query::parser::{parse_query, Query};
use crate::query::scorer::Scorer;
use rayon::prelude::*;
use roaring::RoaringBitmap;

/// Candidate sets below this size are scored on the calling thread
const PARALLEL_THRESHOLD: u64 = 2048;

/// Query executor over one corpus snapshot
pub struct QueryExecutor<'a> {
    index: &'a CharIndex,
    records: &'a [SubtitleRecord],
    /// Case-folded record texts, parallel to `records`
    folded: &'a [String],
}

impl<'a> QueryExecutor<'a> {
    pub fn new(index: &'a CharIndex, records: &'a [SubtitleRecord], folded: &'a [String]) -> Self {
        debug_assert_eq!(records.len(), folded.len());
        Self {
            index,
            records,
            folded,
        }
    }

    /// Parse `input` and return every candidate scoring at least `min_score`.
    ///
    /// An empty query fails before any candidate generation.
    pub fn match_query(&self, input: &str, min_score: f64) -> Result<Vec<MatchResult>, ValidationError> {
        let query = parse_query(input)?;
        Ok(self.execute(&query, min_score, 0.0))
    }

    /// Score the candidates of a parsed query.
    ///
    /// Results come back in candidate discovery order (ascending record
    /// position). Records with similarity below `min_similarity` are skipped.
    pub fn execute(&self, query: &Query, min_score: f64, min_similarity: f64) -> Vec<MatchResult> {
        let candidates = self.candidates(query);
        let scorer = Scorer::new(query);

        let score_one = |id: RecordId| -> Option<MatchResult> {
            let record = self.records.get(id as usize)?;
            if record.similarity < min_similarity {
                return None;
            }
            let (score, exact) = scorer.score(&self.folded[id as usize]);
            (score >= min_score).then_some(MatchResult {
                record: id,
                score,
                exact,
            })
        };

        let results: Vec<MatchResult> = if candidates.len() >= PARALLEL_THRESHOLD {
            let ids: Vec<RecordId> = candidates.iter().collect();
            ids.par_iter().filter_map(|&id| score_one(id)).collect()
        } else {
            candidates.iter().filter_map(score_one).collect()
        };

        log::debug!(
            "query {:?}: {} candidates, {} matches",
            query.terms(),
            candidates.len(),
            results.len()
        );

        results
    }

    /// Candidate records for a query.
    ///
    /// Each term contributes the union of its characters' posting sets. With
    /// several terms the per-term sets are intersected, smallest first.
    pub fn candidates(&self, query: &Query) -> RoaringBitmap {
        let mut term_sets: Vec<RoaringBitmap> = query
            .terms()
            .iter()
            .map(|term| self.index.term_candidates(term))
            .collect();

        // Sort by size for efficient intersection
        term_sets.sort_by_key(|s| s.len());

        let mut sets = term_sets.into_iter();
        let Some(mut result) = sets.next() else {
            return RoaringBitmap::new();
        };
        for set in sets {
            if result.is_empty() {
                break;
            }
            result &= set;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::fold_case;

    struct Fixture {
        records: Vec<SubtitleRecord>,
        folded: Vec<String>,
        index: CharIndex,
    }

    impl Fixture {
        fn new(texts: &[&str]) -> Self {
            let records: Vec<SubtitleRecord> = texts
                .iter()
                .enumerate()
                .map(|(i, t)| SubtitleRecord::new("ep", format!("0m{}s", i), 0.5, *t))
                .collect();
            let folded: Vec<String> = records.iter().map(|r| fold_case(&r.text)).collect();
            let index = CharIndex::from_folded(&folded);
            Self {
                records,
                folded,
                index,
            }
        }

        fn executor(&self) -> QueryExecutor<'_> {
            QueryExecutor::new(&self.index, &self.records, &self.folded)
        }
    }

    #[test]
    fn test_single_term_scenario() {
        let fx = Fixture::new(&["hello world", "goodbye world", "hello there"]);
        let results = fx.executor().match_query("hello", 50.0).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0], MatchResult { record: 0, score: 100.0, exact: true });
        assert_eq!(results[1], MatchResult { record: 2, score: 100.0, exact: true });
    }

    #[test]
    fn test_multi_term_scenario() {
        let fx = Fixture::new(&["hello world", "goodbye world", "hello there"]);
        let results = fx.executor().match_query("hello world", 100.0).unwrap();

        let exact: Vec<_> = results.iter().filter(|r| r.exact).collect();
        assert_eq!(exact.len(), 1);
        assert_eq!(exact[0].record, 0);
    }

    #[test]
    fn test_empty_query_rejected() {
        let fx = Fixture::new(&["hello"]);
        assert_eq!(
            fx.executor().match_query("  ", 0.0),
            Err(ValidationError::EmptyQuery)
        );
    }

    #[test]
    fn test_candidates_prune_records_without_query_chars() {
        let fx = Fixture::new(&["abc", "xyz", "cde"]);
        let query = parse_query("c").unwrap();
        let cands: Vec<u32> = fx.executor().candidates(&query).iter().collect();
        assert_eq!(cands, vec![0, 2]);
    }

    #[test]
    fn test_multi_term_candidates_intersect() {
        let fx = Fixture::new(&["ab", "a", "b", "ba"]);
        let query = parse_query("a b").unwrap();
        let cands: Vec<u32> = fx.executor().candidates(&query).iter().collect();
        assert_eq!(cands, vec![0, 3]);
    }

    #[test]
    fn test_fuzzy_match_below_threshold_filtered() {
        let fx = Fixture::new(&["hello"]);
        let executor = fx.executor();

        let results = executor.match_query("hallo", 80.0).unwrap();
        assert_eq!(results.len(), 1);
        assert!(!results[0].exact);

        assert!(executor.match_query("hallo", 81.0).unwrap().is_empty());
    }

    #[test]
    fn test_min_similarity_filter() {
        let fx = Fixture::new(&["hello"]);
        let query = parse_query("hello").unwrap();
        assert_eq!(fx.executor().execute(&query, 0.0, 0.5).len(), 1);
        assert!(fx.executor().execute(&query, 0.0, 0.6).is_empty());
    }

    #[test]
    fn test_case_insensitive() {
        let fx = Fixture::new(&["HeLLo World"]);
        let results = fx.executor().match_query("WORLD", 100.0).unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].exact);
    }

    #[test]
    fn test_large_candidate_set_keeps_order() {
        let texts: Vec<String> = (0..5000).map(|i| format!("line {} ok", i)).collect();
        let refs: Vec<&str> = texts.iter().map(|s| s.as_str()).collect();
        let fx = Fixture::new(&refs);

        let results = fx.executor().match_query("ok", 100.0).unwrap();
        assert_eq!(results.len(), 5000);
        assert!(results.windows(2).all(|w| w[0].record < w[1].record));
    }
}
