//! Output formatting for search results

use crate::index::types::{SearchHit, SearchOptions, SearchPage};
use serde::Serialize;
use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// JSON response shape for `search --json`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
    pub status: &'static str,
    pub data: Vec<SearchHit>,
    pub count: usize,
    pub total_hits: usize,
    pub page: usize,
    pub total_pages: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl SearchResponse {
    pub fn from_page(query: &str, page: &SearchPage, options: &SearchOptions) -> Self {
        let (message, suggestions) = if page.total_hits == 0 {
            (
                Some(format!("No results matching '{}'", query)),
                suggestions(options),
            )
        } else {
            (None, Vec::new())
        };

        Self {
            status: "success",
            data: page.hits.clone(),
            count: page.hits.len(),
            total_hits: page.total_hits,
            page: page.page,
            total_pages: page.total_pages,
            max_results: options.max_results,
            message,
            suggestions,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            data: Vec::new(),
            count: 0,
            total_hits: 0,
            page: 0,
            total_pages: 0,
            max_results: None,
            message: Some(message.into()),
            suggestions: Vec::new(),
        }
    }
}

/// Hints shown when a query finds nothing
pub fn suggestions(options: &SearchOptions) -> Vec<String> {
    vec![
        "Check the query for typos".to_string(),
        format!("Try a lower minimum match ratio (current: {}%)", options.min_ratio),
        format!("Try a lower minimum similarity (current: {})", options.min_similarity),
        "Try shorter keywords".to_string(),
    ]
}

/// Print a response as pretty JSON
pub fn print_json(response: &SearchResponse) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, response)?;
    writeln!(out)
}

/// Print one page of hits to stdout
pub fn print_page(query: &str, page: &SearchPage, options: &SearchOptions, color: bool) -> io::Result<()> {
    let choice = if color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    let mut stdout = StandardStream::stdout(choice);
    write_page(&mut stdout, query, page, options)
}

/// Write one page of hits, one line per hit:
/// `episode timestamp [ratio%] text`, exact matches marked with `*`
pub fn write_page<W: WriteColor>(w: &mut W, query: &str, page: &SearchPage, options: &SearchOptions) -> io::Result<()> {
    if page.total_hits == 0 {
        writeln!(w, "No results matching '{}'", query)?;
        for hint in suggestions(options) {
            writeln!(w, "  - {}", hint)?;
        }
        return Ok(());
    }

    for hit in &page.hits {
        write_hit(w, hit)?;
    }

    w.set_color(ColorSpec::new().set_dimmed(true))?;
    writeln!(
        w,
        "page {}/{} ({} hits)",
        page.page, page.total_pages, page.total_hits
    )?;
    w.reset()?;
    Ok(())
}

fn write_hit<W: WriteColor>(w: &mut W, hit: &SearchHit) -> io::Result<()> {
    w.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)))?;
    write!(w, "{}", hit.episode_title)?;
    w.reset()?;
    write!(w, " ")?;

    w.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
    write!(w, "{}", hit.timestamp)?;
    w.reset()?;
    write!(w, " ")?;

    if hit.exact_match {
        w.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
        write!(w, "[*{:.0}%]", hit.match_ratio)?;
    } else {
        w.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)))?;
        write!(w, "[{:.0}%]", hit.match_ratio)?;
    }
    w.reset()?;

    writeln!(w, " {}", hit.text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use termcolor::NoColor;

    fn hit(text: &str, exact: bool, ratio: f64) -> SearchHit {
        SearchHit {
            episode_title: "[P1] pilot".to_string(),
            timestamp: "1m2s".to_string(),
            text: text.to_string(),
            match_ratio: ratio,
            similarity: 0.9,
            exact_match: exact,
        }
    }

    fn page(hits: Vec<SearchHit>) -> SearchPage {
        let total = hits.len();
        SearchPage {
            hits,
            page: 1,
            page_size: 20,
            total_hits: total,
            total_pages: usize::from(total > 0),
        }
    }

    #[test]
    fn test_write_page_lines() {
        let mut out = NoColor::new(Vec::new());
        let p = page(vec![hit("hello world", true, 100.0), hit("hallo", false, 80.0)]);
        write_page(&mut out, "hello", &p, &SearchOptions::default()).unwrap();

        let text = String::from_utf8(out.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "[P1] pilot 1m2s [*100%] hello world");
        assert_eq!(lines[1], "[P1] pilot 1m2s [80%] hallo");
        assert_eq!(lines[2], "page 1/1 (2 hits)");
    }

    #[test]
    fn test_write_empty_page_suggests() {
        let mut out = NoColor::new(Vec::new());
        write_page(&mut out, "zzz", &page(Vec::new()), &SearchOptions::default()).unwrap();

        let text = String::from_utf8(out.into_inner()).unwrap();
        assert!(text.starts_with("No results matching 'zzz'"));
        assert!(text.contains("current: 50%"));
    }

    #[test]
    fn test_response_json_shape() {
        let p = page(vec![hit("hello", true, 100.0)]);
        let response = SearchResponse::from_page("hello", &p, &SearchOptions::default());
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["status"], "success");
        assert_eq!(json["count"], 1);
        assert_eq!(json["data"][0]["exact_match"], true);
        assert!(json.get("suggestions").is_none());
        assert!(json.get("message").is_none());
    }

    #[test]
    fn test_empty_response_has_suggestions() {
        let response = SearchResponse::from_page("zzz", &page(Vec::new()), &SearchOptions::default());
        assert_eq!(response.suggestions.len(), 4);
        assert_eq!(response.message.as_deref(), Some("No results matching 'zzz'"));
    }

    #[test]
    fn test_error_response() {
        let json = serde_json::to_value(SearchResponse::error("bad input")).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "bad input");
    }
}
