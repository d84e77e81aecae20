//! Append-only file sink.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::report::Report;

use super::render_report;

/// Appends rendered report blocks to a file.
pub struct FileSink {
    path: PathBuf,
    file: File,
}

impl FileSink {
    /// Open (or create) the destination in append mode.
    ///
    /// Failure here is fatal to startup.
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening report file {}", path.display()))?;

        info!(path = %path.display(), "report file opened");

        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn name(&self) -> &str {
        "file"
    }

    pub fn emit(&mut self, report: &Report) -> Result<()> {
        let block = render_report(report);

        self.file
            .write_all(block.as_bytes())
            .with_context(|| format!("appending report to {}", self.path.display()))?;
        self.file
            .flush()
            .with_context(|| format!("flushing report file {}", self.path.display()))?;

        Ok(())
    }
}
