//! Agent orchestrates the pipeline: event buffer, producers, aggregator, sink.
//!
//! All components are constructed here and handed their dependencies
//! explicitly; nothing in the pipeline is process-global.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::aggregator::Aggregator;
use crate::buffer::EventBuffer;
use crate::config::{Config, SinkKind, SourceMode};
use crate::producer::{ReplayProducer, SyntheticProducer};
use crate::sink::file::FileSink;
use crate::sink::stdout::StdoutSink;
use crate::sink::ReportSink;

/// Owns the pipeline tasks and their shared cancellation token.
pub struct Agent {
    cfg: Config,
    cancel: CancellationToken,
    producer_tasks: Vec<JoinHandle<()>>,
    aggregator_task: Option<JoinHandle<()>>,
}

impl Agent {
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            cancel: CancellationToken::new(),
            producer_tasks: Vec::new(),
            aggregator_task: None,
        }
    }

    /// Start all components and begin the pipeline.
    pub async fn start(&mut self) -> Result<()> {
        // 1. Open the report sink. An unopenable destination is fatal.
        let sink = match self.cfg.sink.output {
            SinkKind::Stdout => ReportSink::Stdout(StdoutSink::new()),
            SinkKind::File => ReportSink::File(
                FileSink::open(&self.cfg.sink.path).context("opening report sink")?,
            ),
        };
        info!(sink = sink.name(), "report sink ready");

        // 2. Construct the shared event buffer.
        let buffer = Arc::new(EventBuffer::new(
            self.cfg.buffer.capacity,
            self.cfg.buffer.overflow,
        ));
        info!(
            capacity = self.cfg.buffer.capacity,
            overflow = self.cfg.buffer.overflow.as_str(),
            "event buffer created",
        );

        // 3. Spawn producers.
        match self.cfg.source.mode {
            SourceMode::Synthetic => {
                for id in 0..self.cfg.source.producers {
                    let producer = SyntheticProducer::new(
                        id,
                        Arc::clone(&buffer),
                        self.cfg.sensors.count,
                        self.cfg.source.min_delay,
                        self.cfg.source.max_delay,
                    );
                    self.producer_tasks
                        .push(tokio::spawn(producer.run(self.cancel.child_token())));
                }
                info!(producers = self.cfg.source.producers, "synthetic producers started");
            }
            SourceMode::Replay => {
                let producer = ReplayProducer::open(
                    &self.cfg.source.replay_path,
                    Arc::clone(&buffer),
                    self.cfg.source.min_delay,
                    self.cfg.source.max_delay,
                )
                .context("opening replay source")?;

                let token = self.cancel.child_token();
                self.producer_tasks.push(tokio::spawn(async move {
                    if let Err(e) = producer.run(token).await {
                        error!(error = %e, "replay producer failed");
                    }
                }));
            }
        }

        // 4. Spawn the aggregator, the sole consumer of the buffer.
        let aggregator = Aggregator::new(
            buffer,
            sink,
            self.cfg.aggregation.interval,
            self.cfg.aggregation.top_n,
            self.cfg.aggregation.emit_empty,
        );
        self.aggregator_task = Some(tokio::spawn(aggregator.run(self.cancel.child_token())));

        Ok(())
    }

    /// Graceful shutdown: cancel every task, then join them.
    ///
    /// The aggregator performs its final partial-interval flush before its
    /// task completes, so joining it last guarantees the flush happened.
    pub async fn stop(&mut self) -> Result<()> {
        self.cancel.cancel();

        for task in self.producer_tasks.drain(..) {
            if let Err(e) = task.await {
                warn!(error = %e, "producer task join failed");
            }
        }

        if let Some(task) = self.aggregator_task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "aggregator task join failed");
            }
        }

        info!("agent stopped");

        Ok(())
    }
}
