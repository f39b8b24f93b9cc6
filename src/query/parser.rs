use crate::error::ValidationError;
use crate::utils::fold_case;

/// Normalized search query.
///
/// Terms are case-folded and non-empty. Several terms combine with AND: a
/// record must satisfy every one of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    terms: Vec<String>,
}

impl Query {
    /// The folded terms, in query order
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn is_multi_term(&self) -> bool {
        self.terms.len() > 1
    }
}

/// Parse a raw query string.
///
/// Trims, case-folds and splits on whitespace. `%20` is accepted as a space
/// since queries often arrive URL-encoded. An empty or whitespace-only query
/// is rejected.
pub fn parse_query(input: &str) -> Result<Query, ValidationError> {
    let decoded = input.replace("%20", " ");
    let folded = fold_case(decoded.trim());

    let terms: Vec<String> = folded
        .split_whitespace()
        .map(|t| t.to_string())
        .collect();

    if terms.is_empty() {
        return Err(ValidationError::EmptyQuery);
    }

    Ok(Query { terms })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_term() {
        let q = parse_query("Hello").unwrap();
        assert_eq!(q.terms(), &["hello".to_string()]);
        assert!(!q.is_multi_term());
    }

    #[test]
    fn test_multi_term() {
        let q = parse_query("  Hello   World ").unwrap();
        assert_eq!(q.terms(), &["hello".to_string(), "world".to_string()]);
        assert!(q.is_multi_term());
    }

    #[test]
    fn test_url_encoded_space() {
        let q = parse_query("hello%20world").unwrap();
        assert_eq!(q.terms().len(), 2);
    }

    #[test]
    fn test_empty_query() {
        assert_eq!(parse_query(""), Err(ValidationError::EmptyQuery));
        assert_eq!(parse_query("   \t "), Err(ValidationError::EmptyQuery));
        assert_eq!(parse_query("%20"), Err(ValidationError::EmptyQuery));
    }

    #[test]
    fn test_cjk_term() {
        let q = parse_query("我是 东大").unwrap();
        assert_eq!(q.terms(), &["我是".to_string(), "东大".to_string()]);
    }
}
