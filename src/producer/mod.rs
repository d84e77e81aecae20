//! Event producers: synthetic generation and file replay.
//!
//! Producers push readings into the shared [`EventBuffer`] and never touch
//! aggregation state. Both variants pace themselves with a uniformly random
//! inter-arrival delay.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::buffer::EventBuffer;
use crate::reading::{self, SensorReading};

/// Upper bound (inclusive) for synthetic vehicle counts.
const MAX_VEHICLE_COUNT: u32 = 50;

/// Timestamp format carried in generated readings.
const TIMESTAMP_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

fn random_delay(rng: &mut StdRng, min: Duration, max: Duration) -> Duration {
    let min_ms = min.as_millis() as u64;
    let max_ms = max.as_millis() as u64;
    if min_ms >= max_ms {
        return min;
    }
    Duration::from_millis(rng.gen_range(min_ms..max_ms))
}

/// Generates random readings until cancelled.
pub struct SyntheticProducer {
    id: usize,
    buffer: Arc<EventBuffer>,
    sensor_count: u16,
    min_delay: Duration,
    max_delay: Duration,
}

impl SyntheticProducer {
    pub fn new(
        id: usize,
        buffer: Arc<EventBuffer>,
        sensor_count: u16,
        min_delay: Duration,
        max_delay: Duration,
    ) -> Self {
        Self {
            id,
            buffer,
            sensor_count,
            min_delay,
            max_delay,
        }
    }

    /// Produce one reading per randomized delay until cancellation.
    pub async fn run(self, cancel: CancellationToken) {
        let mut rng = StdRng::from_entropy();

        info!(
            producer = self.id,
            sensors = self.sensor_count,
            "synthetic producer started",
        );

        loop {
            let delay = random_delay(&mut rng, self.min_delay, self.max_delay);

            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(producer = self.id, "synthetic producer stopped");
                    break;
                }
                _ = tokio::time::sleep(delay) => {}
            }

            let sensor_id = rng.gen_range(1..=self.sensor_count);
            let vehicle_count = rng.gen_range(1..=MAX_VEHICLE_COUNT);
            let reading = SensorReading {
                timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
                sensor_id,
                vehicle_count,
            };

            debug!(
                producer = self.id,
                sensor_id, vehicle_count, "produced reading",
            );

            self.buffer.push(reading).await;
        }
    }
}

/// Replays readings from a line-oriented input file, one record per line.
pub struct ReplayProducer {
    buffer: Arc<EventBuffer>,
    path: PathBuf,
    file: std::fs::File,
    min_delay: Duration,
    max_delay: Duration,
}

impl ReplayProducer {
    /// Open the replay input. Failure is a startup error.
    pub fn open(
        path: &Path,
        buffer: Arc<EventBuffer>,
        min_delay: Duration,
        max_delay: Duration,
    ) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("opening replay input {}", path.display()))?;

        Ok(Self {
            buffer,
            path: path.to_path_buf(),
            file,
            min_delay,
            max_delay,
        })
    }

    /// Push one reading per input record until EOF or cancellation.
    ///
    /// Malformed records are skipped with a warning. Exhausting the input is
    /// not an error: the task ends and the rest of the pipeline keeps
    /// running on an empty buffer.
    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        let mut lines = BufReader::new(tokio::fs::File::from_std(self.file)).lines();
        let mut rng = StdRng::from_entropy();
        let mut produced = 0u64;
        let mut skipped = 0u64;

        info!(path = %self.path.display(), "replay producer started");

        loop {
            let line = tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(produced, "replay producer stopped");
                    return Ok(());
                }
                line = lines.next_line() => {
                    line.with_context(|| format!("reading replay input {}", self.path.display()))?
                }
            };

            let Some(line) = line else {
                info!(produced, skipped, "replay input exhausted");
                return Ok(());
            };

            if line.trim().is_empty() {
                continue;
            }

            let reading = match reading::parse_line(&line) {
                Ok(reading) => reading,
                Err(e) => {
                    warn!(error = %e, line = %line, "skipping malformed replay record");
                    skipped += 1;
                    continue;
                }
            };

            debug!(
                sensor_id = reading.sensor_id,
                vehicle_count = reading.vehicle_count,
                "replayed reading",
            );

            self.buffer.push(reading).await;
            produced += 1;

            let delay = random_delay(&mut rng, self.min_delay, self.max_delay);
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(produced, "replay producer stopped");
                    return Ok(());
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}
