use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// JMeter column names understood by the ingestion step.
pub mod columns {
    pub const TIMESTAMP: &str = "timeStamp";
    pub const ELAPSED: &str = "elapsed";
    pub const LABEL: &str = "label";
    pub const RESPONSE_CODE: &str = "responseCode";
    pub const RESPONSE_MESSAGE: &str = "responseMessage";
    pub const FAILURE_MESSAGE: &str = "failureMessage";
    pub const SUCCESS: &str = "success";
    pub const BYTES: &str = "bytes";
    pub const SENT_BYTES: &str = "sentBytes";
    pub const LATENCY: &str = "Latency";
}

/// One request/response observation parsed from a JTL row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Request start, unix epoch milliseconds.
    pub timestamp_ms: u64,
    /// `None` when the log carries no time-to-first-byte for this row.
    pub ttfb_ms: Option<f64>,
    pub ttlb_ms: f64,
    pub route_label: String,
    /// Response code, or the error message when no response code applies.
    pub response_outcome: String,
    pub request_body_bytes: u64,
    pub response_bytes: u64,
    pub succeeded: bool,
}

/// A source row that could not be turned into a [`Record`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedRow {
    pub line_number: u64,
    pub reason: String,
}

/// Grouping axis along which per-key summaries are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    RouteLabel,
    ResponseOutcome,
    ResponseBytes,
    RequestBodyBytes,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::RouteLabel,
        Dimension::ResponseOutcome,
        Dimension::ResponseBytes,
        Dimension::RequestBodyBytes,
    ];

    /// Extract this dimension's key from a record.
    pub fn key_of(&self, record: &Record) -> KeyValue {
        match self {
            Dimension::RouteLabel => KeyValue::Text(record.route_label.clone()),
            Dimension::ResponseOutcome => KeyValue::Text(record.response_outcome.clone()),
            Dimension::ResponseBytes => KeyValue::Bytes(record.response_bytes),
            Dimension::RequestBodyBytes => KeyValue::Bytes(record.request_body_bytes),
        }
    }

    pub fn as_name(&self) -> &'static str {
        match self {
            Dimension::RouteLabel => "route_label",
            Dimension::ResponseOutcome => "response_outcome",
            Dimension::ResponseBytes => "response_bytes",
            Dimension::RequestBodyBytes => "request_body_bytes",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_name())
    }
}

/// Distinct value of a [`Dimension`] for one group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyValue {
    Text(String),
    Bytes(u64),
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Text(s) => f.write_str(s),
            KeyValue::Bytes(n) => write!(f, "{n}"),
        }
    }
}

/// Descriptive statistics over one non-empty multiset of samples.
///
/// Percentiles (including the median) use linear interpolation between the
/// order statistics bracketing rank `p/100 * (n - 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatBlock {
    pub mean: f64,
    pub median: f64,
    pub population_stdev: f64,
    pub min: f64,
    pub max: f64,
    pub p5: f64,
    pub p95: f64,
}

/// Computed result for one group. `key` is `None` only for the aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub dimension: Option<Dimension>,
    pub key: Option<KeyValue>,
    pub total_count: u64,
    pub failed_count: u64,
    /// `None` when no record in the group carries a TTFB.
    pub ttfb: Option<StatBlock>,
    pub ttlb: Option<StatBlock>,
    /// Aggregate only; `None` when the observed time span is zero.
    pub overall_rate: Option<f64>,
    /// Aggregate only, and only when moving-rate statistics were requested.
    pub moving_rate: Option<StatBlock>,
}

impl SummaryRow {
    pub fn is_aggregate(&self) -> bool {
        self.dimension.is_none()
    }
}

/// Error types for JTL summarization
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JtlStatsError {
    #[error("input has no header row")]
    EmptyInput,

    #[error("header is missing required column '{0}'")]
    MissingColumn(String),

    #[error("header row could not be decoded: {0}")]
    MalformedHeader(String),

    #[error("read error: {0}")]
    Io(String),

    #[error("no valid records in input")]
    NoRecords,

    #[error("all records share timestamp {timestamp_ms}; overall rate is undefined")]
    ZeroTimeSpan { timestamp_ms: u64 },

    #[error("summaries for dimension '{0}' were not precomputed")]
    NotComputed(Dimension),

    #[error("moving rate statistics were not precomputed")]
    MovingRateNotComputed,

    #[error("aggregate summary was not precomputed")]
    AggregateNotComputed,
}

/// Result type for JTL summarization
pub type Result<T> = std::result::Result<T, JtlStatsError>;
