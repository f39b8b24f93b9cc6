use crate::index::types::SubtitleRecord;
use crate::utils::item_progress;
use anyhow::{Context, Result};
use globset::Glob;
use rayon::prelude::*;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Default pattern for per-episode subtitle files
pub const EPISODE_FILE_GLOB: &str = "*.json";

/// One line of a per-episode subtitle file. The episode title comes from the file name.
#[derive(Debug, Deserialize)]
struct EpisodeLine {
    timestamp: String,
    #[serde(default)]
    similarity: f64,
    text: String,
}

/// Load a corpus from a directory of episode files or a single record file
pub fn load_corpus(path: &Path) -> Result<Vec<SubtitleRecord>> {
    load_corpus_with_progress(path, true)
}

/// Load a corpus, optionally showing a progress bar.
///
/// A directory is read as one `*.json` file per episode (a JSON array of
/// `{timestamp, similarity, text}`), concatenated in sorted file-name order.
/// A file is read as a JSON array of complete records.
pub fn load_corpus_with_progress(path: &Path, silent: bool) -> Result<Vec<SubtitleRecord>> {
    let records = if path.is_dir() {
        load_episode_dir(path, EPISODE_FILE_GLOB, silent)?
    } else {
        load_record_file(path)?
    };

    log::info!("loaded {} subtitle records from {}", records.len(), path.display());
    Ok(records)
}

/// Read every episode file in `dir` whose name matches `pattern`
pub fn load_episode_dir(dir: &Path, pattern: &str, silent: bool) -> Result<Vec<SubtitleRecord>> {
    let matcher = Glob::new(pattern)
        .with_context(|| format!("Invalid corpus file pattern: {}", pattern))?
        .compile_matcher();

    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read corpus directory {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| path.file_name().is_some_and(|name| matcher.is_match(name)))
        .collect();

    // Record positions must not depend on directory iteration order
    files.sort();

    let progress_bar = item_progress(files.len(), "Loading subtitles...", silent);

    // par_iter + collect keeps file order
    let per_file: Vec<Result<Vec<SubtitleRecord>>> = files
        .par_iter()
        .map(|path| {
            let result = read_episode_file(path);
            if let Some(ref pb) = progress_bar {
                pb.inc(1);
            }
            result
        })
        .collect();

    let mut records = Vec::new();
    for file_records in per_file {
        records.extend(file_records?);
    }

    if let Some(pb) = progress_bar {
        pb.finish_with_message(format!("Loaded {} files", files.len()));
    }

    Ok(records)
}

/// Parse one episode file
fn read_episode_file(path: &Path) -> Result<Vec<SubtitleRecord>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let lines: Vec<EpisodeLine> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    let episode_title = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(lines
        .into_iter()
        .map(|line| SubtitleRecord {
            episode_title: episode_title.clone(),
            timestamp: line.timestamp,
            similarity: line.similarity,
            text: line.text,
        })
        .collect())
}

/// Parse a JSON array of full records
fn load_record_file(path: &Path) -> Result<Vec<SubtitleRecord>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_episode_dir_sorted() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("[P2] second.json"),
            r#"[{"timestamp":"0m1s","similarity":0.9,"text":"two"}]"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("[P1] first.json"),
            r#"[{"timestamp":"0m1s","similarity":0.8,"text":"one"},
               {"timestamp":"0m2s","similarity":0.7,"text":"uno"}]"#,
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let records = load_corpus(dir.path()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].episode_title, "[P1] first");
        assert_eq!(records[0].text, "one");
        assert_eq!(records[1].text, "uno");
        assert_eq!(records[2].episode_title, "[P2] second");
    }

    #[test]
    fn test_load_record_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("corpus.json");
        fs::write(
            &path,
            r#"[{"episode_title":"P1","timestamp":"1m0s","similarity":1.0,"text":"hello"}]"#,
        )
        .unwrap();

        let records = load_corpus(&path).unwrap();
        assert_eq!(records, vec![SubtitleRecord::new("P1", "1m0s", 1.0, "hello")]);
    }

    #[test]
    fn test_malformed_file_names_path() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bad.json"), "{not json").unwrap();

        let err = load_corpus(dir.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("bad.json"));
    }
}
