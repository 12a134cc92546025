//! Shared data models for search results, trial records and comparison
//! reports.
//!
//! These types form the stable JSON API surface emitted by
//! `--format json`. All of them are plain values: created by the component
//! that computes them and handed to the next stage by value.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Schema version for `SearchResult` JSON payloads.
///
/// MAJOR bumps for breaking field changes, MINOR for additive optional
/// fields, PATCH for documentation-only changes.
pub const SEARCH_RESULT_VERSION: &str = "1.0.0";

/// Schema version for `ComparisonReport` JSON payloads.
///
/// Independent from `SEARCH_RESULT_VERSION` since comparison output uses a
/// separate top-level schema.
pub const COMPARISON_REPORT_VERSION: &str = "1.0.0";

/// Identifier of one of the two search backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BackendId {
    /// PostgreSQL full-text index.
    #[serde(rename = "pg")]
    Pg,
    /// Elasticsearch index.
    #[serde(rename = "es")]
    Es,
}

impl BackendId {
    /// All recognized backends, in comparison report order.
    pub const ALL: [BackendId; 2] = [BackendId::Es, BackendId::Pg];

    /// Short identifier accepted on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            BackendId::Pg => "pg",
            BackendId::Es => "es",
        }
    }

    /// Human-readable backend name.
    pub fn label(self) -> &'static str {
        match self {
            BackendId::Pg => "PostgreSQL",
            BackendId::Es => "Elasticsearch",
        }
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pg" => Ok(BackendId::Pg),
            "es" => Ok(BackendId::Es),
            other => Err(Error::InvalidBackend(other.to_string())),
        }
    }
}

/// A single search phrase as read from the command line or a phrase file.
///
/// Empty phrases are allowed and passed through to the backends unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchPhrase(String);

impl SearchPhrase {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SearchPhrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SearchPhrase {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SearchPhrase {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Parse a newline-delimited phrase list.
///
/// Every line is one phrase; interior blank lines are kept. A trailing line
/// terminator does not produce an extra empty phrase.
pub fn parse_phrases(contents: &str) -> Vec<SearchPhrase> {
    contents.lines().map(SearchPhrase::from).collect()
}

/// A normalized search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    /// Identifier, unique within the backend's corpus.
    pub id: String,
    /// Free-form document payload.
    pub detail: serde_json::Value,
    /// Relevance score, when the backend exposes one.
    ///
    /// Only the PostgreSQL adapter fills this in; Elasticsearch ranking is
    /// conveyed by result order alone. Scores from different backends are
    /// not comparable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

/// Outcome of a single dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Schema version for this payload.
    pub version: String,
    /// Backend that produced the hits.
    pub backend: BackendId,
    /// Phrase that was searched.
    pub query: SearchPhrase,
    /// Hits in the backend's ranking order, best first.
    pub hits: Vec<Hit>,
    /// Wall-clock time spent in the adapter, in whole milliseconds.
    pub elapsed_ms: u64,
}

impl SearchResult {
    pub fn new(backend: BackendId, query: SearchPhrase, hits: Vec<Hit>, elapsed_ms: u64) -> Self {
        Self {
            version: SEARCH_RESULT_VERSION.to_string(),
            backend,
            query,
            hits,
            elapsed_ms,
        }
    }
}

/// Elapsed-time samples for one phrase against one backend, one per trial
/// round, in round order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrialRecord {
    samples: Vec<u64>,
}

impl TrialRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, elapsed_ms: u64) {
        self.samples.push(elapsed_ms);
    }

    pub fn samples(&self) -> &[u64] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples remaining after dropping the first `warmup` trials.
    pub fn steady_state(&self, warmup: usize) -> &[u64] {
        self.samples.get(warmup..).unwrap_or(&[])
    }
}

impl From<Vec<u64>> for TrialRecord {
    fn from(samples: Vec<u64>) -> Self {
        Self { samples }
    }
}

/// Latency summary over a non-empty sample sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub min: u64,
    pub max: u64,
    pub average: f64,
}

/// Statistics and raw samples for one backend of one phrase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendComparison {
    /// `None` when no samples remain after warm-up exclusion.
    pub statistics: Option<Statistics>,
    pub trials: TrialRecord,
}

/// Comparison row for a single phrase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhraseComparison {
    pub phrase: SearchPhrase,
    pub es: BackendComparison,
    pub pg: BackendComparison,
}

impl PhraseComparison {
    pub fn backend(&self, backend: BackendId) -> &BackendComparison {
        match backend {
            BackendId::Es => &self.es,
            BackendId::Pg => &self.pg,
        }
    }
}

/// Sum of per-phrase averages for each backend.
///
/// A total is `None` when at least one phrase has no statistics for that
/// backend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrandTotals {
    pub es: Option<f64>,
    pub pg: Option<f64>,
}

impl GrandTotals {
    pub fn get(&self, backend: BackendId) -> Option<f64> {
        match backend {
            BackendId::Es => self.es,
            BackendId::Pg => self.pg,
        }
    }
}

/// Terminal artifact of a comparison run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    /// Schema version for this payload.
    pub version: String,
    /// RFC 3339 timestamp of report creation.
    pub generated_at: String,
    /// Additional rounds beyond the first.
    pub retakes: u32,
    /// Leading samples excluded from statistics.
    pub warmup: usize,
    pub phrases: Vec<PhraseComparison>,
    pub totals: GrandTotals,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_id_round_trips_through_text() {
        for backend in BackendId::ALL {
            let parsed: BackendId = backend.as_str().parse().expect("parse");
            assert_eq!(parsed, backend);
            assert_eq!(backend.to_string(), backend.as_str());
        }
    }

    #[test]
    fn backend_id_rejects_unknown_identifiers() {
        for raw in ["", "PG", "solr", "es "] {
            let err = raw.parse::<BackendId>().expect_err("should reject");
            assert!(matches!(err, Error::InvalidBackend(ref s) if s == raw));
        }
    }

    #[test]
    fn backend_id_serializes_as_short_identifier() {
        let json = serde_json::to_string(&BackendId::Pg).expect("json");
        assert_eq!(json, "\"pg\"");
    }

    #[test]
    fn parse_phrases_keeps_interior_blank_lines() {
        let phrases = parse_phrases("old man and the sea\n\nmoby dick\r\n");
        let texts: Vec<&str> = phrases.iter().map(|p| p.as_str()).collect();
        assert_eq!(texts, vec!["old man and the sea", "", "moby dick"]);
    }

    #[test]
    fn trial_record_steady_state_drops_warmup() {
        let record = TrialRecord::from(vec![90, 12, 14]);
        assert_eq!(record.steady_state(1), &[12, 14]);
        assert_eq!(record.steady_state(0), &[90, 12, 14]);
        assert!(record.steady_state(3).is_empty());
        assert!(record.steady_state(10).is_empty());
    }

    #[test]
    fn hit_without_score_omits_field() {
        let hit = Hit {
            id: "42".to_string(),
            detail: serde_json::json!({"title": "Moby Dick"}),
            score: None,
        };
        let value = serde_json::to_value(&hit).expect("json");
        assert!(value.get("score").is_none());
        assert_eq!(value["id"], "42");
    }
}
