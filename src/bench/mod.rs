//! Performance comparison engine.
//!
//! Runs `retakes + 1` trial rounds over a phrase list. Within a round,
//! phrases are visited in order and each phrase is dispatched to both
//! backends concurrently; the round only advances once both dispatches
//! have completed.
//!
//! After all rounds, the leading warm-up samples of every trial record are
//! dropped and the remainder is reduced to min/max/average statistics.

pub mod stats;

use tracing::info;

use crate::error::Result;
use crate::models::{
    BackendComparison, BackendId, ComparisonReport, GrandTotals, PhraseComparison, SearchPhrase,
    TrialRecord, COMPARISON_REPORT_VERSION,
};
use crate::search::Dispatcher;

/// Knobs for a comparison run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompareOptions {
    /// Additional rounds beyond the first.
    pub retakes: u32,
    /// Leading samples per trial record excluded from statistics.
    pub warmup: usize,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            retakes: 0,
            warmup: 1,
        }
    }
}

/// Run the comparison and build the report.
///
/// The first failing dispatch aborts the run; no partial report is
/// produced and nothing is retried.
pub async fn compare(
    dispatcher: &Dispatcher,
    phrases: Vec<SearchPhrase>,
    options: CompareOptions,
) -> Result<ComparisonReport> {
    let mut records: Vec<(TrialRecord, TrialRecord)> = phrases
        .iter()
        .map(|_| (TrialRecord::new(), TrialRecord::new()))
        .collect();

    let rounds = u64::from(options.retakes) + 1;
    for round in 1..=rounds {
        info!(round, rounds, phrases = phrases.len(), "starting trial round");

        for (phrase, (es, pg)) in phrases.iter().zip(records.iter_mut()) {
            // A failure on either side drops the other, still pending, dispatch.
            let (es_result, pg_result) = tokio::try_join!(
                dispatcher.dispatch_to(BackendId::Es, phrase.clone()),
                dispatcher.dispatch_to(BackendId::Pg, phrase.clone())
            )?;

            es.push(es_result.elapsed_ms);
            pg.push(pg_result.elapsed_ms);
        }
    }

    let phrases: Vec<PhraseComparison> = phrases
        .into_iter()
        .zip(records)
        .map(|(phrase, (es, pg))| PhraseComparison {
            phrase,
            es: summarize_record(es, options.warmup),
            pg: summarize_record(pg, options.warmup),
        })
        .collect();

    let (es_total, pg_total) = stats::totals_for(&phrases);

    Ok(ComparisonReport {
        version: COMPARISON_REPORT_VERSION.to_string(),
        generated_at: current_timestamp(),
        retakes: options.retakes,
        warmup: options.warmup,
        phrases,
        totals: GrandTotals {
            es: es_total,
            pg: pg_total,
        },
    })
}

fn summarize_record(trials: TrialRecord, warmup: usize) -> BackendComparison {
    BackendComparison {
        statistics: stats::summarize(trials.steady_state(warmup)),
        trials,
    }
}

fn current_timestamp() -> String {
    use time::{format_description::well_known::Rfc3339, OffsetDateTime};

    let now = OffsetDateTime::now_utc();
    now.format(&Rfc3339).unwrap_or_else(|_| now.to_string())
}
