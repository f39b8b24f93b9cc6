use crate::error::ParseError;
use crate::sprite::reader::validate_table;
use crate::sprite::types::*;
use crate::utils::{item_progress, put_u32_le, put_u64_le};
use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// File name prefix of packable frames (`frame_<n>.webp`)
const FRAME_PREFIX: &str = "frame_";
const FRAME_EXTENSION: &str = "webp";

/// Encode a frame table as an index resource.
///
/// Records are sorted by key (stable, so equal keys keep their offset
/// order) and the folder list is derived from them.
pub fn encode_index(grid_width: u32, grid_height: u32, frames: &[FrameLocation]) -> Result<Vec<u8>, ParseError> {
    let mut sorted = frames.to_vec();
    sorted.sort_by_key(|loc| (loc.key, loc.file_offset));
    validate_table(&sorted)?;

    let mut folder_ids: Vec<u32> = sorted.iter().map(|loc| loc.key.folder_id).collect();
    folder_ids.dedup();

    let header = SpriteIndexHeader {
        grid_width,
        grid_height,
        folder_count: folder_ids.len() as u32,
        folder_ids,
        file_count: sorted.len() as u32,
    };

    Ok(encode_table(&header, &sorted))
}

/// Serialize a header and frame table as stored, without validation
pub(crate) fn encode_table(header: &SpriteIndexHeader, frames: &[FrameLocation]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(header.encoded_len() + frames.len() * RECORD_SIZE);
    put_u32_le(&mut buf, header.grid_width);
    put_u32_le(&mut buf, header.grid_height);
    put_u32_le(&mut buf, header.folder_count);
    for &folder in &header.folder_ids {
        put_u32_le(&mut buf, folder);
    }
    put_u32_le(&mut buf, header.file_count);
    for loc in frames {
        put_u32_le(&mut buf, loc.key.folder_id);
        put_u32_le(&mut buf, loc.key.frame_num);
        put_u64_le(&mut buf, loc.file_offset);
    }
    buf
}

/// Accumulates frame locations for one group and writes its index
pub struct SpriteIndexWriter {
    grid_width: u32,
    grid_height: u32,
    frames: Vec<FrameLocation>,
}

impl SpriteIndexWriter {
    pub fn new(grid_width: u32, grid_height: u32) -> Self {
        Self {
            grid_width,
            grid_height,
            frames: Vec::new(),
        }
    }

    /// Record that `key` starts at `file_offset` in the group blob
    pub fn add(&mut self, key: FrameKey, file_offset: u64) {
        self.frames.push(FrameLocation { key, file_offset });
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Encode the accumulated table
    pub fn finish(&self) -> Result<Vec<u8>, ParseError> {
        encode_index(self.grid_width, self.grid_height, &self.frames)
    }

    /// Encode and write the index to `path`
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let bytes = self.finish()?;
        fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
    }
}

/// Settings for packing frame folders into sprite groups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackOptions {
    pub grid_width: u32,
    pub grid_height: u32,
    pub group_size: u32,
    /// Index resource name, `{group}` is replaced with the group id
    pub index_template: String,
    /// Blob resource name, `{group}` is replaced with the group id
    pub blob_template: String,
}

impl Default for PackOptions {
    fn default() -> Self {
        Self {
            grid_width: DEFAULT_GRID.0,
            grid_height: DEFAULT_GRID.1,
            group_size: GROUP_SIZE,
            index_template: "{group}.index".to_string(),
            blob_template: "{group}.webp".to_string(),
        }
    }
}

impl PackOptions {
    /// Frames kept per folder
    pub fn frames_per_folder(&self) -> usize {
        (self.grid_width as usize).saturating_mul(self.grid_height as usize)
    }
}

/// Outcome of a pack run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PackSummary {
    pub groups: usize,
    pub folders: usize,
    pub frames: usize,
    pub bytes: u64,
    pub outputs: Vec<PathBuf>,
}

/// Fill a `{group}` resource template
pub fn render_template(template: &str, group: u32) -> String {
    template.replace("{group}", &group.to_string())
}

/// Frame number of a `frame_<n>.webp` file name
pub fn parse_frame_file_name(name: &str) -> Option<u32> {
    let stem = name.strip_suffix(FRAME_EXTENSION)?.strip_suffix('.')?;
    stem.strip_prefix(FRAME_PREFIX)?.parse().ok()
}

/// Pack `frames_dir/<folder_id>/frame_<n>.webp` into one blob and one index per group.
///
/// Folder names must be numeric. Frames are written in ascending numeric
/// order, at most `grid_width * grid_height` per folder.
pub fn pack_frames(frames_dir: &Path, out_dir: &Path, options: &PackOptions, silent: bool) -> Result<PackSummary> {
    anyhow::ensure!(options.group_size > 0, "group size must be greater than 0");

    let groups = collect_groups(frames_dir, options.group_size)?;
    fs::create_dir_all(out_dir).with_context(|| format!("Failed to create {}", out_dir.display()))?;

    let mut summary = PackSummary::default();
    for (group, folders) in &groups {
        let (frames, bytes) = pack_group(*group, folders, out_dir, options, silent, &mut summary.outputs)?;
        summary.groups += 1;
        summary.folders += folders.len();
        summary.frames += frames;
        summary.bytes += bytes;
    }

    log::info!(
        "packed {} frames from {} folders into {} groups",
        summary.frames,
        summary.folders,
        summary.groups
    );
    Ok(summary)
}

/// Numeric sub-directories of `frames_dir`, grouped by sprite group
fn collect_groups(frames_dir: &Path, group_size: u32) -> Result<BTreeMap<u32, Vec<(u32, PathBuf)>>> {
    let mut groups: BTreeMap<u32, Vec<(u32, PathBuf)>> = BTreeMap::new();

    let entries = fs::read_dir(frames_dir)
        .with_context(|| format!("Failed to read frames directory {}", frames_dir.display()))?;
    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let Some(folder_id) = path.file_name().and_then(|n| n.to_str()).and_then(|n| n.parse::<u32>().ok()) else {
            continue;
        };
        match group_for_folder(folder_id, group_size) {
            Some(group) => groups.entry(group).or_default().push((folder_id, path)),
            None => log::warn!("skipping folder {}: folder ids start at 1", path.display()),
        }
    }

    for folders in groups.values_mut() {
        folders.sort_by_key(|(id, _)| *id);
    }
    Ok(groups)
}

/// Frame files of one folder in numeric order, capped at `limit`
fn list_frames(folder: &Path, limit: usize) -> Result<Vec<(u32, PathBuf)>> {
    let mut frames: Vec<(u32, PathBuf)> = fs::read_dir(folder)
        .with_context(|| format!("Failed to read {}", folder.display()))?
        .filter_map(|e| e.ok())
        .filter_map(|entry| {
            let path = entry.path();
            let frame = parse_frame_file_name(path.file_name()?.to_str()?)?;
            Some((frame, path))
        })
        .collect();

    frames.sort();
    if frames.len() > limit {
        log::warn!(
            "{}: {} frames exceed the {} slot grid, extra frames dropped",
            folder.display(),
            frames.len(),
            limit
        );
        frames.truncate(limit);
    }
    Ok(frames)
}

fn pack_group(
    group: u32,
    folders: &[(u32, PathBuf)],
    out_dir: &Path,
    options: &PackOptions,
    silent: bool,
    outputs: &mut Vec<PathBuf>,
) -> Result<(usize, u64)> {
    let blob_path = out_dir.join(render_template(&options.blob_template, group));
    let index_path = out_dir.join(render_template(&options.index_template, group));

    let mut blob = BufWriter::new(
        File::create(&blob_path).with_context(|| format!("Failed to create {}", blob_path.display()))?,
    );
    let mut index = SpriteIndexWriter::new(options.grid_width, options.grid_height);
    let mut offset = 0u64;

    for (folder_id, folder_path) in folders {
        let frames = list_frames(folder_path, options.frames_per_folder())?;
        if frames.is_empty() {
            continue;
        }

        let progress_bar = item_progress(frames.len(), format!("Packing folder {}", folder_id), silent);

        // Read in parallel, write in frame order
        let contents: Vec<Result<Vec<u8>>> = frames
            .par_iter()
            .map(|(_, path)| {
                let data = fs::read(path).with_context(|| format!("Failed to read {}", path.display()));
                if let Some(ref pb) = progress_bar {
                    pb.inc(1);
                }
                data
            })
            .collect();

        for ((frame_num, _), data) in frames.iter().zip(contents) {
            let data = data?;
            blob.write_all(&data)?;
            index.add(FrameKey::new(*folder_id, *frame_num), offset);
            offset += data.len() as u64;
        }

        if let Some(pb) = progress_bar {
            pb.finish_and_clear();
        }
    }

    blob.flush()?;
    index.write_to(&index_path)?;
    log::debug!("group {}: {} frames, {} bytes", group, index.len(), offset);

    outputs.push(index_path);
    outputs.push(blob_path);
    Ok((index.len(), offset))
}
