use std::fs::File;
use std::io::{BufReader, Write};
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use jtlstats_common::{Dimension, JtlStatsError, RejectedRow};
use jtlstats_summary::{read_jtl, Summarizer};
use thiserror::Error;

pub mod config;
pub mod logging;
pub mod report;

/// Summary statistics from a JMeter JTL file.
///
/// Produces one aggregate row and one row per distinct method+URI-path,
/// response code, response size and request body size, each with TTFB and
/// TTLB mean, median, population stdev, minimum, maximum, 5th and 95th
/// percentile.
#[derive(Parser, Debug, Clone)]
#[command(name = "jtl-stats-processor", about = "Summary statistics from a JMeter JTL file")]
pub struct Args {
    /// Path to the JTL (CSV) source file
    pub jtl_file: PathBuf,

    /// Path to file for summary output (stdout when omitted)
    #[arg(short = 'o')]
    pub output: Option<PathBuf>,

    /// Directory into which start.ts and end.ts are written
    #[arg(short = 't')]
    pub timestamp_dir: Option<PathBuf>,

    /// Include moving TPS summary statistics
    #[arg(short = 'm')]
    pub moving_tps: bool,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Csv,
    Json,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("on attempt to read ({}): {source}", .path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("on attempt to write to ({}): {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{0}")]
    Summary(#[from] JtlStatsError),

    #[error("failed to render report: {0}")]
    Render(String),
}

impl From<csv::Error> for CliError {
    fn from(e: csv::Error) -> Self {
        CliError::Render(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Render(e.to_string())
    }
}

/// Warn about every row that was dropped during ingestion.
pub fn log_rejected_rows(rejected: &[RejectedRow]) {
    for row in rejected {
        tracing::warn!("ignoring CSV source file line ({}): {}", row.line_number, row.reason);
    }
}

/// Ingest `args.jtl_file`, precompute every dimension, and return the
/// summarizer ready for rendering.
pub fn summarize(args: &Args) -> Result<Summarizer, CliError> {
    let file = File::open(&args.jtl_file).map_err(|source| CliError::Open {
        path: args.jtl_file.clone(),
        source,
    })?;
    let ingested = read_jtl(BufReader::new(file))?;
    log_rejected_rows(&ingested.rejected);

    let mut summarizer = Summarizer::new(ingested);
    summarizer.precompute(&Dimension::ALL, args.moving_tps)?;
    Ok(summarizer)
}

/// Full run: summarize, write timestamp markers, emit the report.
pub fn run(args: &Args) -> Result<(), CliError> {
    let summarizer = summarize(args)?;

    if let Some(dir) = &args.timestamp_dir {
        report::write_timestamp_files(dir, &summarizer)?;
    }

    let text = match args.format {
        OutputFormat::Csv => report::render_csv(&summarizer, args.moving_tps)?,
        OutputFormat::Json => report::render_json(&summarizer)?,
    };

    match &args.output {
        Some(path) => std::fs::write(path, text).map_err(|source| CliError::Write {
            path: path.clone(),
            source,
        }),
        None => std::io::stdout()
            .lock()
            .write_all(text.as_bytes())
            .map_err(|source| CliError::Write {
                path: PathBuf::from("<stdout>"),
                source,
            }),
    }
}
