use crate::error::ParseError;
use crate::sprite::types::*;
use crate::sprite::writer::encode_table;
use crate::utils::ByteCursor;
use anyhow::{Context, Result};
use memmap2::Mmap;
use std::cmp::Ordering;
use std::fs::File;
use std::path::Path;

/// Parsed sprite index: header plus the sorted frame table.
///
/// Read-only once parsed. A table that fails validation is rejected whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteIndex {
    header: SpriteIndexHeader,
    frames: Vec<FrameLocation>,
}

impl SpriteIndex {
    /// Parse an index resource.
    ///
    /// Layout (little-endian): `u32 grid_width | u32 grid_height |
    /// u32 folder_count | u32[folder_count] folder_ids | u32 file_count |
    /// record[file_count]`, each record `u32 folder_id | u32 frame_num |
    /// u64 file_offset`.
    pub fn parse(bytes: &[u8]) -> Result<Self, ParseError> {
        let mut cursor = ByteCursor::new(bytes);

        let grid_width = cursor.read_u32_le("grid_width")?;
        let grid_height = cursor.read_u32_le("grid_height")?;
        let folder_count = cursor.read_u32_le("folder_count")?;

        // Check the declared size up front instead of trusting it for allocation
        let folder_bytes = (folder_count as usize).saturating_mul(4);
        let folder_table = cursor.take(folder_bytes, "folder_ids")?;
        let folder_ids: Vec<u32> = folder_table
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        let file_count = cursor.read_u32_le("file_count")?;
        let table_bytes = (file_count as usize).saturating_mul(RECORD_SIZE);
        let table = cursor.take(table_bytes, "frame_table")?;

        let mut frames = Vec::with_capacity(file_count as usize);
        let mut records = ByteCursor::new(table);
        for _ in 0..file_count {
            let folder_id = records.read_u32_le("folder_id")?;
            let frame_num = records.read_u32_le("frame_num")?;
            let file_offset = records.read_u64_le("file_offset")?;
            frames.push(FrameLocation {
                key: FrameKey::new(folder_id, frame_num),
                file_offset,
            });
        }

        validate_table(&frames)?;

        if cursor.remaining() > 0 {
            log::debug!("sprite index has {} trailing bytes", cursor.remaining());
        }

        Ok(Self {
            header: SpriteIndexHeader {
                grid_width,
                grid_height,
                folder_count,
                folder_ids,
                file_count,
            },
            frames,
        })
    }

    /// Memory-map and parse an index file
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        let len = file.metadata()?.len();

        let index = if len == 0 {
            Self::parse(&[])
        } else {
            let mmap = unsafe { Mmap::map(&file)? };
            Self::parse(&mmap)
        };

        index.with_context(|| format!("Invalid sprite index {}", path.display()))
    }

    pub fn header(&self) -> &SpriteIndexHeader {
        &self.header
    }

    /// The frame table, ascending by key
    pub fn frames(&self) -> &[FrameLocation] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Byte range of a frame, or `None` when the key is not indexed
    pub fn locate(&self, folder_id: u32, frame_num: u32) -> Option<FrameRange> {
        locate(&self.frames, folder_id, frame_num)
    }

    /// Encode back to the on-disk format
    pub fn encode(&self) -> Vec<u8> {
        encode_table(&self.header, &self.frames)
    }
}

/// Binary search a sorted frame table for `(folder_id, frame_num)`.
///
/// The range ends where the next record starts; the last record's range is
/// open. With duplicate keys the first record in table order wins.
pub fn locate(table: &[FrameLocation], folder_id: u32, frame_num: u32) -> Option<FrameRange> {
    let key = FrameKey::new(folder_id, frame_num);
    let pos = table.partition_point(|loc| loc.key.cmp(&key) == Ordering::Less);

    let hit = table.get(pos)?;
    if hit.key != key {
        return None;
    }

    Some(match table.get(pos + 1) {
        Some(next) => FrameRange::bounded(hit.file_offset, next.file_offset),
        None => FrameRange::open(hit.file_offset),
    })
}

/// Keys must ascend (duplicates tolerated) and offsets must not decrease
pub(crate) fn validate_table(frames: &[FrameLocation]) -> Result<(), ParseError> {
    for (i, pair) in frames.windows(2).enumerate() {
        let (prev, cur) = (&pair[0], &pair[1]);
        if cur.key < prev.key {
            return Err(ParseError::Unsorted {
                position: i + 1,
                folder_id: cur.key.folder_id,
                frame_num: cur.key.frame_num,
            });
        }
        if cur.file_offset < prev.file_offset {
            return Err(ParseError::DecreasingOffset {
                position: i + 1,
                offset: cur.file_offset,
                previous: prev.file_offset,
            });
        }
    }
    Ok(())
}
