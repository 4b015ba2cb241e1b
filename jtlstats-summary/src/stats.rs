use jtlstats_common::StatBlock;

use crate::config::{HIGH_PERCENTILE, LOW_PERCENTILE};

/// Compute a [`StatBlock`] over `samples`. Returns `None` for an empty slice.
pub fn compute_stats(samples: &[f64]) -> Option<StatBlock> {
    compute_stats_with_zeros(samples, 0)
}

/// Like [`compute_stats`], over `samples` plus `zeros` implicit samples of
/// value zero. The zeros are never materialized, so a sparse series with a
/// huge span costs only as much as its non-zero entries.
///
/// `samples` must be non-negative when `zeros > 0`.
pub fn compute_stats_with_zeros(samples: &[f64], zeros: u64) -> Option<StatBlock> {
    let len = samples.len() as u64 + zeros;
    if len == 0 {
        return None;
    }

    let n = len as f64;
    let mean = samples.iter().sum::<f64>() / n;
    let squared = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() + zeros as f64 * mean * mean;
    let variance = squared / n;

    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    let order = |i: u64| if i < zeros { 0.0 } else { sorted[(i - zeros) as usize] };

    Some(StatBlock {
        mean,
        median: interpolate(len, 50.0, order),
        population_stdev: variance.sqrt(),
        min: order(0),
        max: order(len - 1),
        p5: interpolate(len, LOW_PERCENTILE, order),
        p95: interpolate(len, HIGH_PERCENTILE, order),
    })
}

/// Percentile `p` (0–100) of an ascending slice, interpolating linearly
/// between the order statistics around rank `p/100 * (n - 1)`.
///
/// `sorted` must be non-empty.
pub fn percentile_of_sorted(sorted: &[f64], p: f64) -> f64 {
    interpolate(sorted.len() as u64, p, |i| sorted[i as usize])
}

/// `order(i)` yields the i-th smallest of `len` values.
fn interpolate(len: u64, p: f64, order: impl Fn(u64) -> f64) -> f64 {
    let last = len - 1;
    let rank = (p / 100.0).clamp(0.0, 1.0) * last as f64;
    let lower = (rank.floor() as u64).min(last);
    let upper = (lower + 1).min(last);
    let fraction = rank - lower as f64;

    let low = order(lower);
    low + fraction * (order(upper) - low)
}
