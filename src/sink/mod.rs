//! Report sinks: where rendered interval reports go.
//!
//! The aggregator produces the ranked entries; the sink owns the textual
//! framing. Sinks are opened once at startup; an unopenable destination is
//! a fatal startup error, never a mid-run retry.

pub mod file;
pub mod stdout;

use std::fmt::Write as _;

use anyhow::Result;

use crate::report::Report;

use self::file::FileSink;
use self::stdout::StdoutSink;

/// Dispatches emitted reports to the configured backend.
///
/// Enum dispatch rather than trait objects, so emission is a direct call.
pub enum ReportSink {
    Stdout(StdoutSink),
    File(FileSink),
}

impl ReportSink {
    /// Returns the sink name for logging.
    pub fn name(&self) -> &str {
        match self {
            Self::Stdout(s) => s.name(),
            Self::File(s) => s.name(),
        }
    }

    /// Append one rendered report block to the destination.
    pub fn emit(&mut self, report: &Report) -> Result<()> {
        match self {
            Self::Stdout(s) => s.emit(report),
            Self::File(s) => s.emit(report),
        }
    }
}

/// Render a report into its textual block form.
///
/// The framing is fixed: header line with the interval-end wall-clock time,
/// entry count line, one `Traffic Light <id>:` / `<count> cars` pair per
/// entry, and a trailing blank line after the footer rule.
pub fn render_report(report: &Report) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{}",
        report.interval_end.format("Hour %d-%m-%Y on %H:%M:%S"),
    );
    let _ = writeln!(
        out,
        "Top {} Congested Traffic Lights:",
        report.entries.len(),
    );
    out.push_str("**********************************\n");

    for entry in &report.entries {
        let _ = writeln!(out, "Traffic Light {}:", entry.sensor_id);
        let _ = writeln!(out, "{} cars", entry.total);
    }

    out.push_str("****************************\n\n");
    out
}
