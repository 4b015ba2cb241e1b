/// Marker file holding the first timestamp, in whole seconds.
pub const START_TS_FILE: &str = "start.ts";

/// Marker file holding the last timestamp, in whole seconds.
pub const END_TS_FILE: &str = "end.ts";

/// Log filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Printed for cells that have no value (no samples, or non-aggregate rate columns).
pub const EMPTY_CELL: &str = "-";
