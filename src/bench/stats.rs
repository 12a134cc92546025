//! Latency statistics over trial samples.

use crate::models::{PhraseComparison, Statistics};

/// Summarize a sample sequence.
///
/// Returns `None` for an empty sequence, which is what a single-round run
/// leaves after warm-up exclusion.
pub fn summarize(samples: &[u64]) -> Option<Statistics> {
    let (&first, rest) = samples.split_first()?;

    let (min, max, sum) = rest.iter().fold(
        (first, first, u128::from(first)),
        |(min, max, sum), &sample| (min.min(sample), max.max(sample), sum + u128::from(sample)),
    );

    Some(Statistics {
        min,
        max,
        average: sum as f64 / samples.len() as f64,
    })
}

/// Sum per-phrase averages, in phrase order.
///
/// Any phrase without statistics makes the total undefined.
pub fn grand_total<'a, I>(averages: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<&'a Statistics>>,
{
    averages
        .into_iter()
        .try_fold(0.0_f64, |total, stats| stats.map(|s| total + s.average))
}

/// Grand totals for both backends of a finished comparison.
pub(crate) fn totals_for(phrases: &[PhraseComparison]) -> (Option<f64>, Option<f64>) {
    let es = grand_total(phrases.iter().map(|p| p.es.statistics.as_ref()));
    let pg = grand_total(phrases.iter().map(|p| p.pg.statistics.as_ref()));
    (es, pg)
}
