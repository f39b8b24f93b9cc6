use crate::engine::Snapshot;
use crate::sprite::reader::SpriteIndex;
use anyhow::Result;
use std::collections::BTreeMap;
use std::path::Path;

/// Summary figures for a loaded corpus
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusStats {
    pub records: usize,
    pub episodes: usize,
    pub indexed_chars: usize,
    pub avg_text_chars: f64,
    /// Most frequent characters with their record counts
    pub top_chars: Vec<(char, u64)>,
}

impl CorpusStats {
    pub fn collect(snapshot: &Snapshot, top: usize) -> Self {
        let records = snapshot.records();
        let mut episodes: BTreeMap<&str, usize> = BTreeMap::new();
        let mut total_chars = 0usize;
        for record in records {
            *episodes.entry(record.episode_title.as_str()).or_insert(0) += 1;
            total_chars += record.text.chars().count();
        }

        let avg_text_chars = if records.is_empty() {
            0.0
        } else {
            total_chars as f64 / records.len() as f64
        };

        let mut top_chars = snapshot.index().char_frequencies();
        top_chars.truncate(top);

        Self {
            records: records.len(),
            episodes: episodes.len(),
            indexed_chars: snapshot.index().len(),
            avg_text_chars,
            top_chars,
        }
    }
}

/// Display corpus and character index statistics
pub fn show_stats(corpus_path: &Path, snapshot: &Snapshot) {
    let stats = CorpusStats::collect(snapshot, 15);

    println!("Corpus Statistics");
    println!("=================");
    println!();
    println!("Corpus path:      {}", corpus_path.display());
    println!("Records:          {}", stats.records);
    println!("Episodes:         {}", stats.episodes);
    println!("Avg text length:  {:.1} chars", stats.avg_text_chars);
    println!("Indexed chars:    {}", stats.indexed_chars);

    println!();
    println!("Most common characters:");
    for (c, count) in &stats.top_chars {
        println!("  {:?} {:>10}", c, count);
    }
    if stats.indexed_chars > stats.top_chars.len() {
        println!("  ... and {} more", stats.indexed_chars - stats.top_chars.len());
    }
}

/// Summary of one sprite index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteIndexStats {
    pub grid: (u32, u32),
    pub folders: Vec<u32>,
    pub frames: usize,
    /// Frames per folder
    pub per_folder: BTreeMap<u32, usize>,
    /// Offset of the last frame (bytes before it in the blob)
    pub last_offset: Option<u64>,
}

impl SpriteIndexStats {
    pub fn collect(index: &SpriteIndex) -> Self {
        let mut per_folder = BTreeMap::new();
        for loc in index.frames() {
            *per_folder.entry(loc.key.folder_id).or_insert(0) += 1;
        }

        Self {
            grid: (index.header().grid_width, index.header().grid_height),
            folders: index.header().folder_ids.clone(),
            frames: index.len(),
            per_folder,
            last_offset: index.frames().last().map(|loc| loc.file_offset),
        }
    }
}

/// Display the header and table summary of a sprite index file
pub fn inspect_sprite_index(path: &Path) -> Result<()> {
    let index = SpriteIndex::open(path)?;
    let stats = SpriteIndexStats::collect(&index);
    let file_size = std::fs::metadata(path)?.len();

    println!("Sprite Index");
    println!("============");
    println!();
    println!("Path:             {}", path.display());
    println!("Index size:       {}", format_size(file_size));
    println!("Grid:             {}x{}", stats.grid.0, stats.grid.1);
    println!("Folders:          {:?}", stats.folders);
    println!("Frames:           {}", stats.frames);
    if let Some(offset) = stats.last_offset {
        println!("Last offset:      {}", format_size(offset));
    }

    println!();
    println!("Frames by folder:");
    for (folder, count) in &stats.per_folder {
        println!("  {:6} {}", folder, count);
    }

    Ok(())
}

/// Format byte size to human readable
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
