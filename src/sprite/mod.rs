//! Sprite frame storage
//!
//! Frames of up to ten consecutive episode folders are concatenated into one
//! blob per group, with a sorted binary index mapping `(folder_id, frame_num)`
//! to a byte offset. A single frame is then one range read.

pub mod fetch;
pub mod reader;
pub mod types;
pub mod writer;

#[cfg(feature = "http")]
pub use fetch::HttpRangeFetcher;
pub use fetch::{FileRangeFetcher, FrameFetcher, FrameOutcome, FrameRequest, RangeFetcher, ResourceLayout};
pub use reader::SpriteIndex;
pub use types::*;
pub use writer::{pack_frames, PackOptions, PackSummary, SpriteIndexWriter};
