//! Error types for search and frame retrieval
//!
//! Lookups that simply miss (an absent frame key, a query with no hits) are
//! not errors and are returned as `None` / empty results instead.

use thiserror::Error;

/// Rejected input, raised before any search work is done
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("search query must not be empty")]
    EmptyQuery,

    #[error("minimum match ratio must be within 0-100 (got {0})")]
    MinRatioOutOfRange(f64),

    #[error("minimum similarity must be within 0-1 (got {0})")]
    MinSimilarityOutOfRange(f64),

    #[error("maximum result count must be greater than 0")]
    ZeroMaxResults,

    #[error("page size must be greater than 0")]
    ZeroPageSize,
}

/// Malformed sprite index. The whole index is unusable when this is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("index truncated reading {field}: need {needed} bytes at offset {offset}, have {available}")]
    Truncated {
        field: &'static str,
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("frame table out of order at record {position}: ({folder_id}, {frame_num}) follows a larger key")]
    Unsorted {
        position: usize,
        folder_id: u32,
        frame_num: u32,
    },

    #[error("frame offsets decrease at record {position}: {offset} < {previous}")]
    DecreasingOffset {
        position: usize,
        offset: u64,
        previous: u64,
    },
}

/// Failure of the lower transport layer for one byte-range read
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to fetch {resource}: {message}")]
pub struct TransportError {
    pub resource: String,
    pub message: String,
}

impl TransportError {
    pub fn new(resource: impl Into<String>, message: impl ToString) -> Self {
        Self {
            resource: resource.into(),
            message: message.to_string(),
        }
    }
}

/// Errors from the search engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A query arrived before any corpus was loaded
    #[error("search engine has no corpus loaded")]
    NotReady,
}

/// Errors from fetching a single frame
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("invalid sprite index {resource}: {source}")]
    Parse {
        resource: String,
        #[source]
        source: ParseError,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("folder id 0 has no sprite group")]
    InvalidFolder,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display() {
        let err = ValidationError::MinRatioOutOfRange(120.0);
        assert_eq!(
            err.to_string(),
            "minimum match ratio must be within 0-100 (got 120)"
        );
    }

    #[test]
    fn test_search_error_from_validation() {
        let err: SearchError = ValidationError::EmptyQuery.into();
        assert!(matches!(err, SearchError::Validation(ValidationError::EmptyQuery)));
        assert_eq!(err.to_string(), "search query must not be empty");
    }

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::new("3.webp", "connection reset");
        assert_eq!(err.to_string(), "failed to fetch 3.webp: connection reset");
    }
}
