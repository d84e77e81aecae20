//! Interval-driven aggregation: drain, fold, rank, report, reset.

pub mod table;

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::buffer::EventBuffer;
use crate::report::Report;
use crate::sink::ReportSink;

use self::table::CongestionTable;

/// Sole consumer of the event buffer and sole owner of the congestion table.
///
/// Each tick of the fixed interval drains the buffer, folds the readings
/// into the table, emits a ranked report, and resets the table. Emission is
/// fire-and-forget per tick: a failed emission is logged and never retried.
pub struct Aggregator {
    buffer: Arc<EventBuffer>,
    sink: ReportSink,
    table: CongestionTable,
    interval: Duration,
    top_n: usize,
    emit_empty: bool,
}

impl Aggregator {
    pub fn new(
        buffer: Arc<EventBuffer>,
        sink: ReportSink,
        interval: Duration,
        top_n: usize,
        emit_empty: bool,
    ) -> Self {
        Self {
            buffer,
            sink,
            table: CongestionTable::new(),
            interval,
            top_n,
            emit_empty,
        }
    }

    /// Runs the tick loop until cancelled, then performs one final
    /// partial-interval flush so drained-but-unreported data is not lost.
    pub async fn run(mut self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // Consume the immediate first tick so the first report covers a
        // full interval.
        ticker.tick().await;

        info!(
            interval = ?self.interval,
            top_n = self.top_n,
            sink = self.sink.name(),
            "aggregator started",
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    self.flush_interval(true);
                    debug!("aggregator stopped");
                    break;
                }
                _ = ticker.tick() => {
                    self.flush_interval(false);
                }
            }
        }
    }

    /// One Draining → Ranking → Reporting → Reset cycle.
    ///
    /// The final flush and intervals with `emit_empty` disabled skip
    /// emission when no sensor reported data; the table is reset either way.
    fn flush_interval(&mut self, is_final: bool) {
        let drained = self.buffer.drain_all();
        let drained_len = drained.len();

        for reading in drained {
            self.table.record(reading.sensor_id, reading.vehicle_count);
        }

        if self.table.is_empty() && (is_final || !self.emit_empty) {
            debug!(is_final, "no data this interval, report skipped");
            return;
        }

        let report = Report {
            interval_end: Local::now(),
            entries: self.table.ranked_top(self.top_n),
        };

        info!(
            drained = drained_len,
            distinct = self.table.distinct_sensors(),
            vehicles = self.table.total_vehicles(),
            entries = report.entries.len(),
            is_final,
            "interval closed",
        );

        if let Err(e) = self.sink.emit(&report) {
            error!(sink = self.sink.name(), error = %e, "report emission failed");
        }

        self.table.clear();
    }
}
