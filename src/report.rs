//! Per-interval report snapshot.

use chrono::{DateTime, Local};

/// One ranked entry: a sensor and its accumulated vehicle count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportEntry {
    pub sensor_id: u16,
    pub total: u64,
}

/// Snapshot of one aggregation interval, immutable once emitted.
///
/// `entries` holds `min(top_n, distinct sensors seen)` entries, descending
/// by total, ties broken by ascending sensor id.
#[derive(Debug, Clone)]
pub struct Report {
    /// Wall-clock time the interval closed.
    pub interval_end: DateTime<Local>,
    pub entries: Vec<ReportEntry>,
}
