use std::collections::BTreeMap;

use jtlstats_common::{Dimension, JtlStatsError, Record, RejectedRow, Result, StatBlock, SummaryRow};

use crate::group::{self, Group};
use crate::ingest::Ingested;
use crate::rate;
use crate::stats::compute_stats;

/// Owns one invocation's records and the memo table of computed summaries.
///
/// Every summary is computed at most once and never changed afterwards.
/// Accessors read the cached slots and fail if the requested slot was
/// never filled.
pub struct Summarizer {
    records: Vec<Record>,
    rejected: Vec<RejectedRow>,
    aggregate: Option<SummaryRow>,
    moving_rate: Option<StatBlock>,
    by_dimension: BTreeMap<Dimension, Vec<SummaryRow>>,
}

impl Summarizer {
    pub fn new(ingested: Ingested) -> Self {
        Self {
            records: ingested.records,
            rejected: ingested.rejected,
            aggregate: None,
            moving_rate: None,
            by_dimension: BTreeMap::new(),
        }
    }

    /// Compute the aggregate summary and the per-key summaries of every
    /// requested dimension not already cached. Dimensions are computed on
    /// scoped threads; each one's group order is first-occurrence order.
    pub fn precompute(&mut self, dimensions: &[Dimension], include_moving_rate: bool) -> Result<()> {
        if self.records.is_empty() {
            return Err(JtlStatsError::NoRecords);
        }

        if self.aggregate.is_none() {
            self.aggregate = Some(self.summarize_aggregate());
        }
        if include_moving_rate && self.moving_rate.is_none() {
            self.moving_rate = rate::moving_rate_stats(&self.records);
        }

        let mut pending: Vec<Dimension> = Vec::new();
        for &d in dimensions {
            if !self.by_dimension.contains_key(&d) && !pending.contains(&d) {
                pending.push(d);
            }
        }
        if pending.is_empty() {
            return Ok(());
        }

        let records = &self.records;
        let computed: Vec<(Dimension, Vec<SummaryRow>)> = std::thread::scope(|s| {
            let handles: Vec<_> = pending
                .iter()
                .map(|&d| (d, s.spawn(move || summarize_dimension(records, d))))
                .collect();
            handles
                .into_iter()
                .map(|(d, h)| (d, h.join().unwrap_or_else(|e| std::panic::resume_unwind(e))))
                .collect()
        });

        for (d, rows) in computed {
            tracing::debug!(dimension = %d, groups = rows.len(), "computed dimension summaries");
            self.by_dimension.insert(d, rows);
        }
        Ok(())
    }

    fn summarize_aggregate(&self) -> SummaryRow {
        let mut row = summarize_group(&group::aggregate(&self.records));
        row.overall_rate = match rate::overall_rate(&self.records) {
            Ok(r) => Some(r),
            Err(e) => {
                tracing::warn!(error = %e, "overall rate undefined");
                None
            }
        };
        row
    }

    /// The cached aggregate row, with the moving-rate block attached when
    /// it has been computed.
    pub fn aggregate_summary(&self) -> Result<SummaryRow> {
        let row = self.aggregate.as_ref().ok_or(JtlStatsError::AggregateNotComputed)?;
        Ok(SummaryRow {
            moving_rate: self.moving_rate,
            ..row.clone()
        })
    }

    pub fn summaries_for_dimension(&self, dimension: Dimension) -> Result<&[SummaryRow]> {
        self.by_dimension
            .get(&dimension)
            .map(Vec::as_slice)
            .ok_or(JtlStatsError::NotComputed(dimension))
    }

    /// The aggregate's moving-rate block; fails unless it was requested.
    pub fn moving_rate_stats(&self) -> Result<&StatBlock> {
        self.moving_rate.as_ref().ok_or(JtlStatsError::MovingRateNotComputed)
    }

    /// The aggregate's overall rate, or [`JtlStatsError::ZeroTimeSpan`]
    /// when every record shares one timestamp.
    pub fn overall_rate(&self) -> Result<f64> {
        let row = self.aggregate.as_ref().ok_or(JtlStatsError::AggregateNotComputed)?;
        match row.overall_rate {
            Some(r) => Ok(r),
            None => Err(JtlStatsError::ZeroTimeSpan {
                timestamp_ms: self.first_timestamp_ms()?,
            }),
        }
    }

    pub fn rejected_rows(&self) -> &[RejectedRow] {
        &self.rejected
    }

    pub fn first_timestamp_ms(&self) -> Result<u64> {
        rate::time_span(&self.records)
            .map(|(first, _)| first)
            .ok_or(JtlStatsError::NoRecords)
    }

    pub fn last_timestamp_ms(&self) -> Result<u64> {
        rate::time_span(&self.records)
            .map(|(_, last)| last)
            .ok_or(JtlStatsError::NoRecords)
    }
}

fn summarize_dimension(records: &[Record], dimension: Dimension) -> Vec<SummaryRow> {
    group::group_by_dimension(records, dimension)
        .iter()
        .map(summarize_group)
        .collect()
}

/// Counts and latency blocks for one group. Rates are left unset.
pub fn summarize_group(group: &Group<'_>) -> SummaryRow {
    let ttfb: Vec<f64> = group.records.iter().filter_map(|r| r.ttfb_ms).collect();
    let ttlb: Vec<f64> = group.records.iter().map(|r| r.ttlb_ms).collect();

    SummaryRow {
        dimension: group.dimension,
        key: group.key.clone(),
        total_count: group.records.len() as u64,
        failed_count: group.records.iter().filter(|r| !r.succeeded).count() as u64,
        ttfb: compute_stats(&ttfb),
        ttlb: compute_stats(&ttlb),
        overall_rate: None,
        moving_rate: None,
    }
}
