use std::cmp;
use std::io::Write;

use anyhow::Result;
use serde::Serialize;

use crate::models::Hit;
use crate::report::{ComparisonView, ResultView, StatCells};

const MAX_ID_WIDTH: usize = 24;
const MAX_AUTHORS_WIDTH: usize = 40;
const MAX_PHRASE_WIDTH: usize = 40;

/// Render a single-query result as a table.
///
/// Columns:
/// - ID
/// - SCORE
/// - TITLE
/// - AUTHORS
///
/// followed by a summary line with the hit count and elapsed time.
pub fn print_result_table(view: &ResultView) -> Result<()> {
    println!("{}: {}", view.backend, view.query);

    if !view.rows.is_empty() {
        let id_header = "ID";
        let score_header = "SCORE";
        let title_header = "TITLE";
        let authors_header = "AUTHORS";

        let id_width = column_width(id_header, view.rows.iter().map(|r| r.id.as_str()))
            .min(MAX_ID_WIDTH);
        let score_width = column_width(score_header, view.rows.iter().map(|r| r.score.as_str()));
        let title_width = column_width(title_header, view.rows.iter().map(|r| r.title.as_str()));
        let authors_width = cmp::min(
            column_width(authors_header, view.rows.iter().map(|r| r.authors.as_str())),
            MAX_AUTHORS_WIDTH,
        );

        println!(
            "{:<id_width$} {:>score_width$} {:<title_width$} {:<authors_width$}",
            id_header, score_header, title_header, authors_header
        );

        for row in &view.rows {
            println!(
                "{:<id_width$} {:>score_width$} {:<title_width$} {:<authors_width$}",
                truncate(&row.id, id_width),
                row.score,
                row.title,
                truncate(&row.authors, authors_width)
            );
        }
    }

    let noun = if view.rows.len() == 1 { "hit" } else { "hits" };
    println!("{} {noun} in {}", view.rows.len(), view.elapsed);

    Ok(())
}

/// Render a comparison report as a table of min/max/avg per backend,
/// followed by one grand-total line per backend.
pub fn print_comparison_table(view: &ComparisonView) -> Result<()> {
    let phrase_header = "PHRASE";
    let phrase_width = cmp::min(
        column_width(phrase_header, view.rows.iter().map(|r| r.phrase.as_str())),
        MAX_PHRASE_WIDTH,
    );
    let es_width = stat_width("ES", view.rows.iter().map(|r| &r.es));
    let pg_width = stat_width("PG", view.rows.iter().map(|r| &r.pg));

    println!(
        "{:<phrase_width$} {:>es_width$} {:>pg_width$}",
        phrase_header, "ES min/max/avg", "PG min/max/avg"
    );

    for row in &view.rows {
        println!(
            "{:<phrase_width$} {:>es_width$} {:>pg_width$}",
            truncate(&row.phrase, phrase_width),
            stat_triplet(&row.es),
            stat_triplet(&row.pg)
        );
    }

    println!();
    let label_width = view
        .totals
        .iter()
        .map(|t| t.label.chars().count())
        .max()
        .unwrap_or(0);
    for line in &view.totals {
        println!("{:<label_width$} total: {} ms", line.label, line.total);
    }

    Ok(())
}

/// Pretty-print a fetched record, or report that none was found.
pub fn print_record(id: &str, record: Option<&Hit>) -> Result<()> {
    match record {
        Some(hit) => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            serde_json::to_writer_pretty(&mut out, hit)?;
            writeln!(out)?;
        }
        None => println!("{id}: not found"),
    }
    Ok(())
}

/// Compact JSON on a single line, as consumed by scripts.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    serde_json::to_writer(std::io::stdout(), value)?;
    println!();
    Ok(())
}

fn stat_triplet(cells: &StatCells) -> String {
    format!("{}/{}/{}", cells.min, cells.max, cells.average)
}

fn stat_width<'a>(prefix: &str, cells: impl Iterator<Item = &'a StatCells>) -> usize {
    let header = format!("{prefix} min/max/avg");
    cells
        .map(|c| stat_triplet(c).chars().count())
        .fold(header.chars().count(), cmp::max)
}

fn column_width<'a>(header: &str, values: impl Iterator<Item = &'a str>) -> usize {
    values
        .map(|v| v.chars().count())
        .fold(header.len(), cmp::max)
}

fn truncate(s: &str, max_width: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_width {
        s.to_string()
    } else if max_width <= 1 {
        "…".to_string()
    } else {
        s.chars()
            .take(max_width.saturating_sub(1))
            .collect::<String>()
            + "…"
    }
}
