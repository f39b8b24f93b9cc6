use crate::error::ValidationError;
use serde::{Deserialize, Serialize};

/// Position of a record in the loaded corpus
pub type RecordId = u32;

/// Default number of hits per result page
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Default minimum match ratio
pub const DEFAULT_MIN_RATIO: f64 = 50.0;

/// One subtitle line of the corpus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleRecord {
    pub episode_title: String,
    pub timestamp: String,
    /// Frame similarity reported by the subtitle extractor (0.0 - 1.0)
    #[serde(default)]
    pub similarity: f64,
    pub text: String,
}

impl SubtitleRecord {
    pub fn new(
        episode_title: impl Into<String>,
        timestamp: impl Into<String>,
        similarity: f64,
        text: impl Into<String>,
    ) -> Self {
        Self {
            episode_title: episode_title.into(),
            timestamp: timestamp.into(),
            similarity,
            text: text.into(),
        }
    }
}

/// A scored candidate produced by the matcher
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchResult {
    pub record: RecordId,
    /// Match ratio, 0 - 100
    pub score: f64,
    /// Every query term occurs verbatim in the record text
    pub exact: bool,
}

/// Search hit handed to presentation code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub episode_title: String,
    pub timestamp: String,
    pub text: String,
    pub match_ratio: f64,
    pub similarity: f64,
    pub exact_match: bool,
}

impl SearchHit {
    pub fn from_match(record: &SubtitleRecord, m: &MatchResult) -> Self {
        Self {
            episode_title: record.episode_title.clone(),
            timestamp: record.timestamp.clone(),
            text: record.text.clone(),
            match_ratio: m.score,
            similarity: record.similarity,
            exact_match: m.exact,
        }
    }
}

/// One page of ranked hits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    pub hits: Vec<SearchHit>,
    pub page: usize,
    pub page_size: usize,
    /// Hits across all pages (after `max_results` truncation)
    pub total_hits: usize,
    pub total_pages: usize,
}

/// Search tuning knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Minimum match ratio a hit needs (0 - 100)
    pub min_ratio: f64,
    /// Records with a lower frame similarity are skipped (0.0 - 1.0)
    pub min_similarity: f64,
    /// Cap on ranked hits before pagination
    pub max_results: Option<usize>,
    pub page_size: usize,
    /// 1-based page number
    pub page: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            min_ratio: DEFAULT_MIN_RATIO,
            min_similarity: 0.0,
            max_results: None,
            page_size: DEFAULT_PAGE_SIZE,
            page: 1,
        }
    }
}

impl SearchOptions {
    /// Check option ranges before any search work is done
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(0.0..=100.0).contains(&self.min_ratio) {
            return Err(ValidationError::MinRatioOutOfRange(self.min_ratio));
        }
        if !(0.0..=1.0).contains(&self.min_similarity) {
            return Err(ValidationError::MinSimilarityOutOfRange(self.min_similarity));
        }
        if self.max_results == Some(0) {
            return Err(ValidationError::ZeroMaxResults);
        }
        if self.page_size == 0 {
            return Err(ValidationError::ZeroPageSize);
        }
        Ok(())
    }
}
