//! End-to-end search over corpora loaded from disk.

use std::fs;
use std::path::Path;
use tempfile::TempDir;
use vvsearch::engine::SearchEngine;
use vvsearch::error::{SearchError, ValidationError};
use vvsearch::index::{load_corpus, SearchOptions, SubtitleRecord};

fn write_episode(dir: &Path, title: &str, lines: &[(&str, f64, &str)]) {
    let json: Vec<serde_json::Value> = lines
        .iter()
        .map(|(timestamp, similarity, text)| {
            serde_json::json!({ "timestamp": timestamp, "similarity": similarity, "text": text })
        })
        .collect();
    fs::write(dir.join(format!("{}.json", title)), serde_json::to_string(&json).unwrap()).unwrap();
}

/// The three-line corpus used across the matching scenarios
fn scenario_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_episode(
        dir.path(),
        "[P1] first",
        &[("0m1s", 0.9, "hello world"), ("0m2s", 0.8, "goodbye world")],
    );
    write_episode(dir.path(), "[P2] second", &[("1m5s", 0.7, "hello there")]);
    dir
}

fn engine_for(dir: &TempDir) -> SearchEngine {
    SearchEngine::with_corpus(load_corpus(dir.path()).unwrap())
}

#[test]
fn test_records_follow_file_order() {
    let dir = scenario_dir();
    let records = load_corpus(dir.path()).unwrap();
    let texts: Vec<&str> = records.iter().map(|r| r.text.as_str()).collect();
    assert_eq!(texts, vec!["hello world", "goodbye world", "hello there"]);
    assert_eq!(records[2].episode_title, "[P2] second");
}

#[test]
fn test_single_term_scenario() {
    let dir = scenario_dir();
    let page = engine_for(&dir).search("hello", &SearchOptions::default()).unwrap();

    let texts: Vec<&str> = page.hits.iter().map(|h| h.text.as_str()).collect();
    assert_eq!(texts, vec!["hello world", "hello there"]);
    assert!(page.hits.iter().all(|h| h.exact_match && h.match_ratio == 100.0));
}

#[test]
fn test_multi_term_scenario() {
    let dir = scenario_dir();
    let page = engine_for(&dir).search("hello world", &SearchOptions::default()).unwrap();

    let exact: Vec<&str> = page
        .hits
        .iter()
        .filter(|h| h.exact_match)
        .map(|h| h.text.as_str())
        .collect();
    assert_eq!(exact, vec!["hello world"]);
    assert_eq!(page.hits[0].text, "hello world");
}

#[test]
fn test_query_is_case_insensitive_and_url_spaces() {
    let dir = scenario_dir();
    let engine = engine_for(&dir);
    let a = engine.search("HELLO%20World", &SearchOptions::default()).unwrap();
    let b = engine.search("hello world", &SearchOptions::default()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_min_similarity_filters_records() {
    let dir = scenario_dir();
    let options = SearchOptions {
        min_similarity: 0.85,
        ..Default::default()
    };
    let page = engine_for(&dir).search("hello", &options).unwrap();
    assert_eq!(page.total_hits, 1);
    assert_eq!(page.hits[0].timestamp, "0m1s");
}

#[test]
fn test_invalid_options_rejected() {
    let dir = scenario_dir();
    let engine = engine_for(&dir);

    let bad_ratio = SearchOptions {
        min_ratio: 101.0,
        ..Default::default()
    };
    assert_eq!(
        engine.search("hello", &bad_ratio),
        Err(SearchError::Validation(ValidationError::MinRatioOutOfRange(101.0)))
    );

    let zero_max = SearchOptions {
        max_results: Some(0),
        ..Default::default()
    };
    assert_eq!(
        engine.search("hello", &zero_max),
        Err(SearchError::Validation(ValidationError::ZeroMaxResults))
    );

    assert_eq!(
        engine.search("   ", &SearchOptions::default()),
        Err(SearchError::Validation(ValidationError::EmptyQuery))
    );
}

#[test]
fn test_pages_partition_results() {
    let records: Vec<SubtitleRecord> = (0..45)
        .map(|i| SubtitleRecord::new("[P3] long", &format!("{}s", i), 1.0, &format!("line {} with tokyo", i)))
        .collect();
    let engine = SearchEngine::with_corpus(records);

    let mut seen = Vec::new();
    for page in 1..=4 {
        let options = SearchOptions {
            page,
            ..Default::default()
        };
        let result = engine.search("tokyo", &options).unwrap();
        assert_eq!(result.total_hits, 45);
        assert_eq!(result.total_pages, 3);
        seen.extend(result.hits.into_iter().map(|h| h.timestamp));
    }

    let expected: Vec<String> = (0..45).map(|i| format!("{}s", i)).collect();
    assert_eq!(seen, expected);
}

#[test]
fn test_reload_gives_identical_results() {
    let dir = scenario_dir();
    let engine = engine_for(&dir);
    let options = SearchOptions {
        min_ratio: 0.0,
        ..Default::default()
    };
    let before = engine.search("helo wrld", &options).unwrap();

    engine.load(load_corpus(dir.path()).unwrap());
    assert_eq!(engine.search("helo wrld", &options).unwrap(), before);
}

#[test]
fn test_record_file_corpus() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("records.json");
    let records = vec![
        SubtitleRecord::new("[P4] x", "2:00", 0.5, "東京タワー"),
        SubtitleRecord::new("[P4] x", "2:01", 0.5, "大阪"),
    ];
    fs::write(&path, serde_json::to_string(&records).unwrap()).unwrap();

    let engine = SearchEngine::with_corpus(load_corpus(&path).unwrap());
    let page = engine.search("東京", &SearchOptions::default()).unwrap();
    assert_eq!(page.total_hits, 1);
    assert!(page.hits[0].exact_match);
}

#[test]
fn test_malformed_episode_file_is_an_error() {
    let dir = scenario_dir();
    fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
    let err = load_corpus(dir.path()).unwrap_err();
    assert!(format!("{:#}", err).contains("broken.json"));
}
