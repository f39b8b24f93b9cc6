use crate::index::types::{RecordId, SubtitleRecord};
use crate::utils::{distinct_chars, fold_case};
use roaring::RoaringBitmap;
use rustc_hash::FxHashMap;

/// Presence index from a case-folded character to the records containing it.
///
/// Stores presence only (no positions or frequencies). Built once per corpus
/// snapshot and never updated in place.
#[derive(Debug, Default, Clone)]
pub struct CharIndex {
    postings: FxHashMap<char, RoaringBitmap>,
    record_count: u32,
}

/// Record id of the text at `pos`, `None` once ids run out
fn record_id(pos: usize) -> Option<RecordId> {
    RecordId::try_from(pos).ok().filter(|&id| id < RecordId::MAX)
}

impl CharIndex {
    /// Build the index from raw records
    pub fn build(records: &[SubtitleRecord]) -> Self {
        let folded: Vec<String> = records.iter().map(|r| fold_case(&r.text)).collect();
        Self::from_folded(&folded)
    }

    /// Build the index from texts that are already case-folded.
    /// Record ids are positions in `texts`.
    ///
    /// Record ids are `u32`, so at most `u32::MAX` records are indexed.
    /// Texts past that limit are left out with a warning.
    pub fn from_folded<S: AsRef<str>>(texts: &[S]) -> Self {
        let mut postings: FxHashMap<char, RoaringBitmap> = FxHashMap::default();
        let mut record_count: u32 = 0;

        for (pos, text) in texts.iter().enumerate() {
            let Some(id) = record_id(pos) else {
                log::warn!("corpus exceeds {} records, {} not indexed", record_count, texts.len() - pos);
                break;
            };
            for c in distinct_chars(text.as_ref()) {
                postings.entry(c).or_default().insert(id);
            }
            record_count = id + 1;
        }

        log::debug!(
            "built character index: {} records, {} distinct characters",
            record_count,
            postings.len()
        );

        Self { postings, record_count }
    }

    /// Records containing `c` (already folded)
    pub fn postings(&self, c: char) -> Option<&RoaringBitmap> {
        self.postings.get(&c)
    }

    /// Union of the posting sets of every distinct character in `term`.
    ///
    /// A record missing from every contributing set cannot match the term
    /// and is pruned before scoring.
    pub fn term_candidates(&self, folded_term: &str) -> RoaringBitmap {
        let mut candidates = RoaringBitmap::new();
        for c in distinct_chars(folded_term) {
            if let Some(docs) = self.postings.get(&c) {
                candidates |= docs;
            }
        }
        candidates
    }

    /// Number of distinct characters indexed
    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    /// Number of records the index was built from
    pub fn record_count(&self) -> u32 {
        self.record_count
    }

    /// Characters with their document frequency, most frequent first
    /// (ties ordered by character)
    pub fn char_frequencies(&self) -> Vec<(char, u64)> {
        let mut freqs: Vec<(char, u64)> = self
            .postings
            .iter()
            .map(|(&c, docs)| (c, docs.len()))
            .collect();
        freqs.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        freqs
    }
}
