//! Case folding shared by indexing and matching

/// Case-fold text for indexing and comparison.
///
/// Index building, candidate generation and scoring must all fold the same
/// way, otherwise a posting lookup can miss records the scorer would accept.
#[inline]
pub fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

/// Distinct characters of already folded text, sorted
pub fn distinct_chars(folded: &str) -> Vec<char> {
    let mut chars: Vec<char> = folded.chars().collect();
    chars.sort_unstable();
    chars.dedup();
    chars
}
