use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use jtlstats_common::{Dimension, StatBlock, SummaryRow};
use jtlstats_summary::rate::bucket_of;
use jtlstats_summary::Summarizer;
use serde::Serialize;

use crate::config::{EMPTY_CELL, END_TS_FILE, START_TS_FILE};
use crate::CliError;

/// Report categories, in output order.
pub const CATEGORIES: [(Dimension, &str); 4] = [
    (Dimension::RouteLabel, "method+uripath"),
    (Dimension::ResponseOutcome, "responseCode"),
    (Dimension::ResponseBytes, "responseSizeInBytes"),
    (Dimension::RequestBodyBytes, "requestBodyInBytes"),
];

const STAT_COLUMNS: [&str; 7] = [
    "Mean",
    "Median",
    "Stdev",
    "Minimum",
    "Maximum",
    "5th Percentile",
    "95th Percentile",
];

pub fn header(include_moving_rate: bool) -> Vec<String> {
    let mut cols: Vec<String> = ["Category", "Key", "Total Requests Made", "Failed Requests"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    cols.extend(STAT_COLUMNS.iter().map(|c| format!("TTFB {c}")));
    cols.extend(STAT_COLUMNS.iter().map(|c| format!("TTLB {c}")));
    cols.push("Overall TPS".to_string());
    if include_moving_rate {
        cols.extend(STAT_COLUMNS.iter().map(|c| format!("Moving TPS {c}")));
    }
    cols
}

fn stat_cells(block: Option<&StatBlock>) -> Vec<String> {
    match block {
        Some(b) => [b.mean, b.median, b.population_stdev, b.min, b.max, b.p5, b.p95]
            .iter()
            .map(|v| format!("{v:.2}"))
            .collect(),
        None => vec![EMPTY_CELL.to_string(); STAT_COLUMNS.len()],
    }
}

fn optional_cell(value: Option<f64>) -> String {
    value.map_or_else(|| EMPTY_CELL.to_string(), |v| format!("{v:.2}"))
}

/// One CSV row. Rate columns are filled only for the aggregate.
pub fn row_cells(category: &str, row: &SummaryRow, include_moving_rate: bool) -> Vec<String> {
    let key = row.key.as_ref().map(ToString::to_string).unwrap_or_default();
    let mut cells = vec![
        category.to_string(),
        key,
        row.total_count.to_string(),
        row.failed_count.to_string(),
    ];
    cells.extend(stat_cells(row.ttfb.as_ref()));
    cells.extend(stat_cells(row.ttlb.as_ref()));
    cells.push(optional_cell(row.overall_rate));
    if include_moving_rate {
        cells.extend(stat_cells(row.moving_rate.as_ref()));
    }
    cells
}

/// Render the aggregate row followed by every category's rows as CSV.
pub fn render_csv(summarizer: &Summarizer, include_moving_rate: bool) -> Result<String, CliError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(header(include_moving_rate))?;
    writer.write_record(row_cells(
        "Aggregate",
        &summarizer.aggregate_summary()?,
        include_moving_rate,
    ))?;
    for (dimension, category) in CATEGORIES {
        for row in summarizer.summaries_for_dimension(dimension)? {
            writer.write_record(row_cells(category, row, include_moving_rate))?;
        }
    }
    let bytes = writer.into_inner().map_err(|e| CliError::Render(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| CliError::Render(e.to_string()))
}

#[derive(Serialize)]
struct JsonReport<'a> {
    aggregate: SummaryRow,
    dimensions: BTreeMap<&'static str, &'a [SummaryRow]>,
    rejected_rows: usize,
}

/// Render the same rows as a pretty-printed JSON document.
pub fn render_json(summarizer: &Summarizer) -> Result<String, CliError> {
    let mut dimensions = BTreeMap::new();
    for (dimension, category) in CATEGORIES {
        dimensions.insert(category, summarizer.summaries_for_dimension(dimension)?);
    }
    let report = JsonReport {
        aggregate: summarizer.aggregate_summary()?,
        dimensions,
        rejected_rows: summarizer.rejected_rows().len(),
    };
    let mut text = serde_json::to_string_pretty(&report)?;
    text.push('\n');
    Ok(text)
}

/// Write `start.ts` and `end.ts` into `dir`: the first and last buckets
/// (whole seconds) of the moving-rate series.
pub fn write_timestamp_files(dir: &Path, summarizer: &Summarizer) -> Result<(), CliError> {
    let start = bucket_of(summarizer.first_timestamp_ms()?);
    let end = bucket_of(summarizer.last_timestamp_ms()?);

    for (name, secs) in [(START_TS_FILE, start), (END_TS_FILE, end)] {
        let path = dir.join(name);
        fs::write(&path, secs.to_string()).map_err(|source| CliError::Write { path, source })?;
    }
    Ok(())
}
