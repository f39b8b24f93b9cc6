use crate::index::types::SearchHit;
use crate::utils::{episode_number, timestamp_to_seconds};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of consecutive folders packed into one sprite group
pub const GROUP_SIZE: u32 = 10;

/// Size of one frame table record: folder_id u32, frame_num u32, file_offset u64
pub const RECORD_SIZE: usize = 4 + 4 + 8;

/// Default sprite grid (frames per folder is capped at width * height)
pub const DEFAULT_GRID: (u32, u32) = (60, 60);

/// Composite key of a frame. Ordering is lexicographic: folder first, then frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FrameKey {
    pub folder_id: u32,
    pub frame_num: u32,
}

impl FrameKey {
    pub fn new(folder_id: u32, frame_num: u32) -> Self {
        Self {
            folder_id,
            frame_num,
        }
    }

    /// Frame shown for a search hit: the episode number is the folder and
    /// the timestamp in seconds is the frame number.
    pub fn from_hit(hit: &SearchHit) -> Option<Self> {
        let folder_id = episode_number(&hit.episode_title)?;
        let frame_num = timestamp_to_seconds(&hit.timestamp)?;
        Some(Self::new(folder_id, frame_num))
    }

    /// Sprite group holding this frame, `None` for folder 0
    pub fn group(&self, group_size: u32) -> Option<u32> {
        group_for_folder(self.folder_id, group_size)
    }
}

impl fmt::Display for FrameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.folder_id, self.frame_num)
    }
}

/// Group id of a folder: `(folder_id - 1) / group_size`. Folder ids start at 1.
pub fn group_for_folder(folder_id: u32, group_size: u32) -> Option<u32> {
    if folder_id == 0 || group_size == 0 {
        return None;
    }
    Some((folder_id - 1) / group_size)
}

/// One entry of the frame table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLocation {
    pub key: FrameKey,
    /// Start of the frame's bytes in the group blob
    pub file_offset: u64,
}

/// Fixed header preceding the frame table
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpriteIndexHeader {
    pub grid_width: u32,
    pub grid_height: u32,
    pub folder_count: u32,
    pub folder_ids: Vec<u32>,
    pub file_count: u32,
}

impl SpriteIndexHeader {
    /// Encoded size of the header in bytes
    pub fn encoded_len(&self) -> usize {
        4 * 4 + 4 * self.folder_ids.len()
    }
}

/// Byte range of one frame inside a blob. `end` is exclusive; `None` means
/// "to the end of the resource".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRange {
    pub start: u64,
    pub end: Option<u64>,
}

impl FrameRange {
    pub fn bounded(start: u64, end: u64) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    pub fn open(start: u64) -> Self {
        Self { start, end: None }
    }

    /// The whole resource
    pub fn full() -> Self {
        Self::open(0)
    }

    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }

    /// Length in bytes, if bounded
    pub fn len(&self) -> Option<u64> {
        self.end.map(|end| end.saturating_sub(self.start))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    /// Value for an HTTP `Range` header (the header's end is inclusive).
    /// An empty range has no header form.
    pub fn http_header(&self) -> Option<String> {
        match self.end {
            Some(end) if end > self.start => Some(format!("bytes={}-{}", self.start, end - 1)),
            Some(_) => None,
            None => Some(format!("bytes={}-", self.start)),
        }
    }
}

impl fmt::Display for FrameRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) => write!(f, "[{}, {})", self.start, end),
            None => write!(f, "[{}, end)", self.start),
        }
    }
}
