use std::io::Read;

use jtlstats_common::{columns, JtlStatsError, Record, RejectedRow, Result};

/// One data row as split by the CSV reader, tagged with the 1-based line
/// it starts on (the header is line 1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub line_number: u64,
    pub fields: Vec<String>,
}

impl RawRow {
    pub fn new<S: Into<String>>(line_number: u64, fields: impl IntoIterator<Item = S>) -> Self {
        Self {
            line_number,
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

/// Output of ingestion: valid records in input order, plus one diagnostic
/// per row that could not be parsed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ingested {
    pub records: Vec<Record>,
    pub rejected: Vec<RejectedRow>,
}

/// Column positions resolved from a JTL header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    width: usize,
    timestamp: usize,
    elapsed: usize,
    label: usize,
    response_code: usize,
    success: usize,
    latency: Option<usize>,
    bytes: Option<usize>,
    sent_bytes: Option<usize>,
    failure_message: Option<usize>,
    response_message: Option<usize>,
}

impl ColumnLayout {
    /// Resolve column positions by name. Fails if a required column is absent.
    pub fn from_header<S: AsRef<str>>(header: &[S]) -> Result<Self> {
        if header.is_empty() {
            return Err(JtlStatsError::EmptyInput);
        }
        let find = |name: &str| header.iter().position(|h| h.as_ref().trim() == name);
        let require = |name: &str| find(name).ok_or_else(|| JtlStatsError::MissingColumn(name.to_string()));

        Ok(Self {
            width: header.len(),
            timestamp: require(columns::TIMESTAMP)?,
            elapsed: require(columns::ELAPSED)?,
            label: require(columns::LABEL)?,
            response_code: require(columns::RESPONSE_CODE)?,
            success: require(columns::SUCCESS)?,
            latency: find(columns::LATENCY),
            bytes: find(columns::BYTES),
            sent_bytes: find(columns::SENT_BYTES),
            failure_message: find(columns::FAILURE_MESSAGE),
            response_message: find(columns::RESPONSE_MESSAGE),
        })
    }

    /// Parse one row. The error string is the rejection reason.
    pub fn parse_row(&self, fields: &[String]) -> std::result::Result<Record, String> {
        if fields.len() != self.width {
            return Err(format!("expected {} columns, found {}", self.width, fields.len()));
        }
        let cell = move |idx: usize| fields[idx].trim();

        let timestamp_ms = cell(self.timestamp)
            .parse::<u64>()
            .map_err(|_| format!("{} '{}' is not an integer", columns::TIMESTAMP, cell(self.timestamp)))?;

        let ttlb_ms = parse_latency(columns::ELAPSED, cell(self.elapsed))?;

        let ttfb_ms = match self.latency.map(cell) {
            None | Some("") => None,
            Some(raw) => Some(parse_latency(columns::LATENCY, raw)?),
        };

        let route_label = cell(self.label);
        if route_label.is_empty() {
            return Err(format!("{} is empty", columns::LABEL));
        }

        let response_outcome = [Some(self.response_code), self.failure_message, self.response_message]
            .into_iter()
            .flatten()
            .map(cell)
            .find(|s| !s.is_empty())
            .unwrap_or_default()
            .to_string();

        let succeeded = match cell(self.success) {
            s if s.eq_ignore_ascii_case("true") => true,
            s if s.eq_ignore_ascii_case("false") => false,
            other => return Err(format!("{} '{}' is not true or false", columns::SUCCESS, other)),
        };

        Ok(Record {
            timestamp_ms,
            ttfb_ms,
            ttlb_ms,
            route_label: route_label.to_string(),
            response_outcome,
            request_body_bytes: parse_bytes(columns::SENT_BYTES, self.sent_bytes.map(cell))?,
            response_bytes: parse_bytes(columns::BYTES, self.bytes.map(cell))?,
            succeeded,
        })
    }
}

fn parse_latency(column: &str, raw: &str) -> std::result::Result<f64, String> {
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
        _ => Err(format!("{column} '{raw}' is not a non-negative number")),
    }
}

/// An absent column counts as zero bytes.
fn parse_bytes(column: &str, raw: Option<&str>) -> std::result::Result<u64, String> {
    match raw {
        None => Ok(0),
        Some(raw) => raw
            .parse::<u64>()
            .map_err(|_| format!("{column} '{raw}' is not a non-negative integer")),
    }
}

/// Classify every row independently. A bad row never affects the others.
pub fn ingest(layout: &ColumnLayout, rows: impl IntoIterator<Item = RawRow>) -> Ingested {
    let mut out = Ingested::default();
    for row in rows {
        match layout.parse_row(&row.fields) {
            Ok(record) => out.records.push(record),
            Err(reason) => out.rejected.push(RejectedRow {
                line_number: row.line_number,
                reason,
            }),
        }
    }
    out
}

/// Read a JTL CSV document: header row first, then one row per sample.
///
/// Only a missing or undecodable header, a missing required column, or an
/// I/O failure is fatal; everything else becomes a [`RejectedRow`].
pub fn read_jtl<R: Read>(reader: R) -> Result<Ingested> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut iter = csv_reader.records();
    let header = match iter.next() {
        None => return Err(JtlStatsError::EmptyInput),
        Some(Err(e)) if matches!(e.kind(), csv::ErrorKind::Io(_)) => {
            return Err(JtlStatsError::Io(e.to_string()))
        }
        Some(Err(e)) => return Err(JtlStatsError::MalformedHeader(e.to_string())),
        Some(Ok(h)) => h,
    };
    let header: Vec<&str> = header.iter().collect();
    let layout = ColumnLayout::from_header(&header)?;

    let mut rows = Vec::new();
    let mut rejected = Vec::new();
    // Fallback line tracking for errors that carry no position.
    let mut last_line = 1;
    for result in iter {
        match result {
            Ok(record) => {
                last_line = record.position().map(|p| p.line()).unwrap_or(last_line + 1);
                rows.push(RawRow::new(last_line, record.iter()));
            }
            Err(e) => {
                if matches!(e.kind(), csv::ErrorKind::Io(_)) {
                    return Err(JtlStatsError::Io(e.to_string()));
                }
                last_line = e.position().map(|p| p.line()).unwrap_or(last_line + 1);
                rejected.push(RejectedRow {
                    line_number: last_line,
                    reason: e.to_string(),
                });
            }
        }
    }

    let mut ingested = ingest(&layout, rows);
    if !rejected.is_empty() {
        ingested.rejected.extend(rejected);
        ingested.rejected.sort_by_key(|r| r.line_number);
    }
    tracing::debug!(
        records = ingested.records.len(),
        rejected = ingested.rejected.len(),
        "ingested JTL input"
    );
    Ok(ingested)
}
