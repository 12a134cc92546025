//! Display-ready views of search results and comparison reports.
//!
//! Everything here is pure: values are truncated or rounded for display
//! but never reordered or recomputed. Rendering to a terminal lives in
//! `cli::format`.

use serde_json::Value;

use crate::models::{BackendId, ComparisonReport, Hit, SearchResult, Statistics};

/// Maximum number of characters kept from a title.
pub const TITLE_WIDTH: usize = 50;

/// Maximum number of contributors listed per hit.
pub const MAX_AUTHORS: usize = 3;

const ELLIPSIS: char = '…';
const MISSING: &str = "n/a";

/// One hit, reduced for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HitRow {
    pub id: String,
    pub score: String,
    pub title: String,
    pub authors: String,
}

/// A single-query result, reduced for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultView {
    pub backend: String,
    pub query: String,
    pub rows: Vec<HitRow>,
    pub elapsed: String,
}

/// Formatted min/max/average for one backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatCells {
    pub min: String,
    pub max: String,
    pub average: String,
}

/// One phrase of a comparison, reduced for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonRow {
    pub phrase: String,
    pub es: StatCells,
    pub pg: StatCells,
}

/// Grand total line for one backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TotalLine {
    pub label: String,
    pub total: String,
}

/// A comparison report, reduced for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonView {
    pub rows: Vec<ComparisonRow>,
    pub totals: Vec<TotalLine>,
}

pub fn result_view(result: &SearchResult) -> ResultView {
    ResultView {
        backend: format!("{} ({})", result.backend.label(), result.backend),
        query: result.query.to_string(),
        rows: result.hits.iter().map(hit_row).collect(),
        elapsed: format!("{} ms", result.elapsed_ms),
    }
}

pub fn hit_row(hit: &Hit) -> HitRow {
    let title = hit
        .detail
        .get("title")
        .and_then(Value::as_str)
        .map(format_title)
        .unwrap_or_default();

    let authors = hit
        .detail
        .get("authors")
        .map(author_names)
        .map(|names| collapse_authors(&names))
        .unwrap_or_default();

    HitRow {
        id: hit.id.clone(),
        score: hit
            .score
            .map(|s| format!("{s:.4}"))
            .unwrap_or_else(|| "-".to_string()),
        title,
        authors,
    }
}

pub fn comparison_view(report: &ComparisonReport) -> ComparisonView {
    let rows = report
        .phrases
        .iter()
        .map(|row| ComparisonRow {
            phrase: truncate_with_ellipsis(row.phrase.as_str(), TITLE_WIDTH),
            es: stat_cells(row.es.statistics.as_ref()),
            pg: stat_cells(row.pg.statistics.as_ref()),
        })
        .collect();

    let totals = BackendId::ALL
        .iter()
        .map(|&backend| TotalLine {
            label: backend.label().to_string(),
            total: format_millis(report.totals.get(backend)),
        })
        .collect();

    ComparisonView { rows, totals }
}

pub fn stat_cells(stats: Option<&Statistics>) -> StatCells {
    match stats {
        Some(stats) => StatCells {
            min: stats.min.to_string(),
            max: stats.max.to_string(),
            average: format!("{:.2}", stats.average),
        },
        None => StatCells {
            min: MISSING.to_string(),
            max: MISSING.to_string(),
            average: MISSING.to_string(),
        },
    }
}

/// Two-decimal milliseconds, or `n/a` for the insufficient-data sentinel.
pub fn format_millis(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.2}"),
        _ => MISSING.to_string(),
    }
}

/// Normalize a title for single-line display.
///
/// Line breaks collapse to spaces and semicolons become ` - ` separators;
/// anything longer than [`TITLE_WIDTH`] characters is cut and marked with
/// an ellipsis.
pub fn format_title(raw: &str) -> String {
    let single_line = raw
        .split(|c: char| c == '\r' || c == '\n')
        .filter(|part| !part.trim().is_empty())
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(" ");

    let separated = single_line
        .split(';')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" - ");

    truncate_with_ellipsis(&separated, TITLE_WIDTH)
}

/// Keep the first [`MAX_AUTHORS`] names, each reduced to the text before
/// its first comma.
pub fn collapse_authors<S: AsRef<str>>(names: &[S]) -> String {
    names
        .iter()
        .take(MAX_AUTHORS)
        .map(|name| {
            let name = name.as_ref();
            name.split(',').next().unwrap_or(name).trim().to_string()
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Contributor names from an `authors` payload field.
///
/// Accepts either an array of strings or a single `;`-separated string.
fn author_names(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Value::String(joined) => joined
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn truncate_with_ellipsis(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => {
            let mut cut = s[..byte_idx].to_string();
            cut.push(ELLIPSIS);
            cut
        }
        None => s.to_string(),
    }
}
