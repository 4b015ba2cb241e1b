/// Lower percentile reported in every [`StatBlock`](jtlstats_common::StatBlock).
pub const LOW_PERCENTILE: f64 = 5.0;

/// Upper percentile reported in every [`StatBlock`](jtlstats_common::StatBlock).
pub const HIGH_PERCENTILE: f64 = 95.0;

/// Width of one moving-rate bucket (milliseconds).
pub const BUCKET_WIDTH_MS: u64 = 1_000;
