//! Scoring for subtitle matches
//!
//! A record that contains every query term verbatim is an exact match and
//! scores 100. Anything else falls back to `partial_ratio`, a sliding-window
//! character alignment between a term and the record text.

use crate::query::parser::Query;
use crate::utils::fold_case;
use memchr::memmem::Finder;

/// Score given to exact matches
pub const EXACT_SCORE: f64 = 100.0;

/// Approximate substring score between two strings, 0 - 100.
///
/// Both inputs are case-folded. Equal strings, or one containing the other,
/// score 100. Otherwise the shorter string is slid across the longer one and
/// the best share of position-wise equal characters is returned.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a = fold_case(a);
    let b = fold_case(b);
    let a_chars: Vec<char> = a.chars().collect();
    partial_ratio_folded(&a, &a_chars, &b)
}

/// `partial_ratio` over pre-folded input, with the first string's chars precomputed
fn partial_ratio_folded(a: &str, a_chars: &[char], b: &str) -> f64 {
    if a == b || a.contains(b) || b.contains(a) {
        return EXACT_SCORE;
    }

    let b_chars: Vec<char> = b.chars().collect();
    let (short, long) = if a_chars.len() > b_chars.len() {
        (b_chars.as_slice(), a_chars)
    } else {
        (a_chars, b_chars.as_slice())
    };

    sliding_ratio(short, long)
}

/// Best alignment of `short` against every offset of `long`
fn sliding_ratio(short: &[char], long: &[char]) -> f64 {
    if short.is_empty() || short.len() > long.len() {
        return 0.0;
    }

    let len = short.len() as f64;
    let mut best = 0.0;

    for window in long.windows(short.len()) {
        let matches = short
            .iter()
            .zip(window)
            .filter(|(x, y)| x == y)
            .count();
        let ratio = matches as f64 / len * 100.0;
        if ratio > best {
            best = ratio;
            if matches == short.len() {
                break;
            }
        }
    }

    best
}

/// One prepared query term
struct TermScorer {
    term: String,
    chars: Vec<char>,
    finder: Finder<'static>,
}

/// Scores folded record texts against a parsed query
pub struct Scorer {
    terms: Vec<TermScorer>,
}

impl Scorer {
    pub fn new(query: &Query) -> Self {
        let terms = query
            .terms()
            .iter()
            .map(|term| TermScorer {
                term: term.clone(),
                chars: term.chars().collect(),
                finder: Finder::new(term.as_bytes()).into_owned(),
            })
            .collect();
        Self { terms }
    }

    /// Score a case-folded record text. Returns `(score, exact)`.
    ///
    /// Exact means every term occurs as a substring. Otherwise the score is
    /// the best `partial_ratio` of any single term.
    pub fn score(&self, folded_text: &str) -> (f64, bool) {
        let haystack = folded_text.as_bytes();
        let exact = self.terms.iter().all(|t| t.finder.find(haystack).is_some());
        if exact {
            return (EXACT_SCORE, true);
        }

        let best = self
            .terms
            .iter()
            .map(|t| partial_ratio_folded(&t.term, &t.chars, folded_text))
            .fold(0.0, f64::max);

        (best, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::parser::parse_query;

    #[test]
    fn test_partial_ratio_equal() {
        assert_eq!(partial_ratio("abc", "abc"), 100.0);
        assert_eq!(partial_ratio("ABC", "abc"), 100.0);
    }

    #[test]
    fn test_partial_ratio_contains_either_way() {
        assert_eq!(partial_ratio("ell", "hello"), 100.0);
        assert_eq!(partial_ratio("hello", "ell"), 100.0);
    }

    #[test]
    fn test_partial_ratio_sliding() {
        // "abd" vs "xabcx": best window "abc" matches 2 of 3
        let score = partial_ratio("abd", "xabcx");
        assert!((score - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_partial_ratio_symmetric_sliding() {
        assert_eq!(partial_ratio("hallo", "hello there"), partial_ratio("hello there", "hallo"));
        assert_eq!(partial_ratio("hallo", "hello there"), 80.0);
    }

    #[test]
    fn test_partial_ratio_no_overlap() {
        assert_eq!(partial_ratio("xyz", "abcdef"), 0.0);
    }

    #[test]
    fn test_partial_ratio_counts_chars_not_bytes() {
        // one of two characters matches
        assert_eq!(partial_ratio("东京", "东大学"), 50.0);
    }

    #[test]
    fn test_partial_ratio_bounded() {
        let pairs = [("a", "b"), ("abc", "cab"), ("hello", "world"), ("q", "qqqq")];
        for (a, b) in pairs {
            let s = partial_ratio(a, b);
            assert!((0.0..=100.0).contains(&s), "{} vs {} = {}", a, b, s);
        }
    }

    #[test]
    fn test_scorer_single_term_exact() {
        let scorer = Scorer::new(&parse_query("World").unwrap());
        assert_eq!(scorer.score("hello world"), (100.0, true));
    }

    #[test]
    fn test_scorer_multi_term_requires_all() {
        let scorer = Scorer::new(&parse_query("hello world").unwrap());
        assert_eq!(scorer.score("hello world"), (100.0, true));

        // one term contained: best term ratio is 100 but not exact
        let (score, exact) = scorer.score("hello there");
        assert_eq!(score, 100.0);
        assert!(!exact);
    }

    #[test]
    fn test_scorer_fuzzy() {
        let scorer = Scorer::new(&parse_query("hallo").unwrap());
        let (score, exact) = scorer.score("hello");
        assert_eq!(score, 80.0);
        assert!(!exact);
    }
}
