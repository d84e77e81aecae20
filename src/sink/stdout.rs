//! Console sink.

use std::io::Write;

use anyhow::{Context, Result};

use crate::report::Report;

use super::render_report;

/// Writes rendered report blocks to standard output.
#[derive(Default)]
pub struct StdoutSink;

impl StdoutSink {
    pub fn new() -> Self {
        Self
    }

    pub fn name(&self) -> &str {
        "stdout"
    }

    pub fn emit(&mut self, report: &Report) -> Result<()> {
        let block = render_report(report);

        let mut out = std::io::stdout().lock();
        out.write_all(block.as_bytes())
            .context("writing report to stdout")?;
        out.flush().context("flushing stdout")?;

        Ok(())
    }
}
