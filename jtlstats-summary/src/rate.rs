use std::collections::BTreeMap;

use jtlstats_common::{JtlStatsError, Record, Result, StatBlock};

use crate::config::BUCKET_WIDTH_MS;
use crate::stats::compute_stats_with_zeros;

/// Earliest and latest timestamps (ms) across `records`.
pub fn time_span(records: &[Record]) -> Option<(u64, u64)> {
    let first = records.iter().map(|r| r.timestamp_ms).min()?;
    let last = records.iter().map(|r| r.timestamp_ms).max()?;
    Some((first, last))
}

/// The bucket (whole second) a timestamp falls into.
pub fn bucket_of(timestamp_ms: u64) -> u64 {
    timestamp_ms / BUCKET_WIDTH_MS
}

/// Average records per second over the observed span.
///
/// Fails with [`JtlStatsError::NoRecords`] on empty input and
/// [`JtlStatsError::ZeroTimeSpan`] when every record shares one timestamp.
pub fn overall_rate(records: &[Record]) -> Result<f64> {
    let (first, last) = time_span(records).ok_or(JtlStatsError::NoRecords)?;
    if first == last {
        return Err(JtlStatsError::ZeroTimeSpan { timestamp_ms: first });
    }
    Ok(records.len() as f64 * BUCKET_WIDTH_MS as f64 / (last - first) as f64)
}

/// Per-second record counts from the first to the last observed bucket,
/// inclusive. Only occupied buckets are stored; every other bucket in the
/// span is a quiet second with a count of zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketSeries {
    pub first_bucket: u64,
    pub last_bucket: u64,
    pub counts: BTreeMap<u64, u64>,
}

impl BucketSeries {
    /// Number of buckets in the span, quiet ones included.
    pub fn span(&self) -> u64 {
        self.last_bucket - self.first_bucket + 1
    }

    pub fn quiet_buckets(&self) -> u64 {
        self.span() - self.counts.len() as u64
    }

    pub fn count_at(&self, bucket: u64) -> u64 {
        self.counts.get(&bucket).copied().unwrap_or(0)
    }
}

/// Bucket `records` by second. `None` for empty input.
pub fn bucket_series(records: &[Record]) -> Option<BucketSeries> {
    let (first, last) = time_span(records)?;
    let mut counts = BTreeMap::new();
    for r in records {
        *counts.entry(bucket_of(r.timestamp_ms)).or_insert(0) += 1;
    }
    Some(BucketSeries {
        first_bucket: bucket_of(first),
        last_bucket: bucket_of(last),
        counts,
    })
}

/// Descriptive statistics of the per-second series, quiet seconds
/// counted as zero samples. `None` for empty input.
pub fn moving_rate_stats(records: &[Record]) -> Option<StatBlock> {
    let series = bucket_series(records)?;
    let occupied: Vec<f64> = series.counts.values().map(|&c| c as f64).collect();
    compute_stats_with_zeros(&occupied, series.quiet_buckets())
}
