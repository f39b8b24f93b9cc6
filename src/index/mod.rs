pub mod char_index;
pub mod corpus;
pub mod stats;
pub mod types;

pub use char_index::CharIndex;
pub use corpus::{load_corpus, load_corpus_with_progress};
pub use types::*;
