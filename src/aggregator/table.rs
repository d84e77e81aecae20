//! Per-interval congestion accumulation.

use std::collections::HashMap;

use crate::report::ReportEntry;

/// Accumulated vehicle counts per sensor for the current interval.
///
/// Owned exclusively by the aggregator task, so it needs no synchronization.
/// Lifecycle is one interval: populated between ticks, ranked and cleared at
/// the tick boundary.
#[derive(Debug, Default)]
pub struct CongestionTable {
    totals: HashMap<u16, u64>,
}

impl CongestionTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one reading into the table, creating the entry if absent.
    pub fn record(&mut self, sensor_id: u16, vehicle_count: u32) {
        *self.totals.entry(sensor_id).or_insert(0) += u64::from(vehicle_count);
    }

    /// Number of distinct sensors seen this interval.
    pub fn distinct_sensors(&self) -> usize {
        self.totals.len()
    }

    /// Sum of all accumulated vehicle counts.
    pub fn total_vehicles(&self) -> u64 {
        self.totals.values().sum()
    }

    /// True when no reading has been recorded since the last reset.
    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    /// Returns the `min(n, distinct sensors)` most congested sensors.
    ///
    /// Descending by total; equal totals rank by ascending sensor id so the
    /// ordering is deterministic rather than an accident of map iteration.
    pub fn ranked_top(&self, n: usize) -> Vec<ReportEntry> {
        let mut ranked: Vec<ReportEntry> = self
            .totals
            .iter()
            .map(|(&sensor_id, &total)| ReportEntry { sensor_id, total })
            .collect();

        ranked.sort_unstable_by(|a, b| {
            b.total
                .cmp(&a.total)
                .then_with(|| a.sensor_id.cmp(&b.sensor_id))
        });
        ranked.truncate(n);
        ranked
    }

    /// Resets the table for the next interval.
    pub fn clear(&mut self) {
        self.totals.clear();
    }
}
