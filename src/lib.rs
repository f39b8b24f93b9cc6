//! # vvsearch - subtitle search and sprite frame retrieval
//!
//! Approximate search over a corpus of subtitle lines, plus byte-range
//! retrieval of video frames packed into sprite blobs.
//!
//! ## Architecture
//!
//! - [`index`] - Subtitle records, corpus loading and the character index
//! - [`query`] - Query parsing, scoring (`partial_ratio`), ranking and paging
//! - [`engine`] - Owned search engine with an explicit corpus load
//! - [`sprite`] - Sprite index format, packing and frame fetching
//! - [`output`] - Terminal and JSON result formatting
//! - [`utils`] - Config, encoding, text and timestamp helpers
//!
//! ## Quick Start
//!
//! ```no_run
//! use vvsearch::engine::SearchEngine;
//! use vvsearch::index::{load_corpus, SearchOptions};
//! use std::path::Path;
//!
//! let engine = SearchEngine::with_corpus(load_corpus(Path::new("subtitles")).unwrap());
//! let page = engine.search("hello world", &SearchOptions::default()).unwrap();
//!
//! for hit in page.hits {
//!     println!("{} {} {:.0}% {}", hit.episode_title, hit.timestamp, hit.match_ratio, hit.text);
//! }
//! ```
//!
//! ## Matching
//!
//! Every distinct character maps to the set of records containing it. A
//! query term's candidates are the union over its characters; multi-term
//! queries intersect the per-term sets. Candidates are then scored: records
//! containing every term verbatim are exact (100), the rest get the best
//! sliding-window `partial_ratio` of any term.

pub mod engine;
pub mod error;
pub mod index;
pub mod output;
pub mod query;
pub mod sprite;
pub mod utils;
