//! Shared event buffer between producers and the aggregator.
//!
//! A mutex-guarded FIFO queue with a soft capacity and an explicit overflow
//! policy. Producers only ever `push`; the aggregator is the sole caller of
//! `drain_all`. The mutex makes the two appear atomic with respect to each
//! other: a reading lands entirely before or entirely after a drain boundary.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::Deserialize;
use tokio::sync::Notify;
use tracing::warn;

use crate::reading::SensorReading;

/// What `push` does when the buffer is at or above capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Log a warning and enqueue anyway. Capacity is advisory only.
    Warn,
    /// Evict the oldest buffered reading to make room.
    DropOldest,
    /// Suspend the producer until a drain frees space.
    Block,
}

impl Default for OverflowPolicy {
    fn default() -> Self {
        Self::Warn
    }
}

impl OverflowPolicy {
    /// Returns the canonical config/log label.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Warn => "warn",
            Self::DropOldest => "drop_oldest",
            Self::Block => "block",
        }
    }
}

/// Bounded FIFO queue of not-yet-aggregated readings.
pub struct EventBuffer {
    inner: Mutex<VecDeque<SensorReading>>,
    capacity: usize,
    policy: OverflowPolicy,
    /// Signalled by `drain_all` so blocked producers re-check for space.
    space: Notify,
    /// Total readings evicted under `DropOldest`.
    dropped: AtomicU64,
}

impl EventBuffer {
    /// Creates an empty buffer with the given soft capacity and policy.
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            policy,
            space: Notify::new(),
            dropped: AtomicU64::new(0),
        }
    }

    /// Appends a reading to the tail, subject to the overflow policy.
    ///
    /// Only the `Block` policy ever suspends; `Warn` and `DropOldest`
    /// complete without waiting.
    pub async fn push(&self, reading: SensorReading) {
        match self.policy {
            OverflowPolicy::Warn => {
                let mut queue = self.inner.lock();
                if queue.len() >= self.capacity {
                    warn!(
                        len = queue.len(),
                        capacity = self.capacity,
                        "buffer over soft capacity, enqueueing anyway",
                    );
                }
                queue.push_back(reading);
            }
            OverflowPolicy::DropOldest => {
                let mut queue = self.inner.lock();
                if queue.len() >= self.capacity {
                    queue.pop_front();
                    let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                    warn!(
                        capacity = self.capacity,
                        dropped_total = dropped,
                        "buffer full, evicted oldest reading",
                    );
                }
                queue.push_back(reading);
            }
            OverflowPolicy::Block => {
                let mut reading = Some(reading);
                loop {
                    // Register on the wait list before checking capacity.
                    // `notify_waiters` stores no permit, so a waiter that is
                    // not yet registered when a drain fires would miss it.
                    let notified = self.space.notified();
                    tokio::pin!(notified);
                    notified.as_mut().enable();
                    {
                        let mut queue = self.inner.lock();
                        if queue.len() < self.capacity {
                            queue.push_back(reading.take().expect("reading consumed once"));
                            return;
                        }
                    }
                    warn!(capacity = self.capacity, "buffer full, producer waiting");
                    notified.await;
                }
            }
        }
    }

    /// Atomically removes and returns every buffered reading in FIFO order.
    ///
    /// Safe to call concurrently with any number of `push` calls. Wakes
    /// producers blocked on a full buffer.
    pub fn drain_all(&self) -> Vec<SensorReading> {
        let drained: Vec<SensorReading> = {
            let mut queue = self.inner.lock();
            queue.drain(..).collect()
        };

        if !drained.is_empty() {
            self.space.notify_waiters();
        }

        drained
    }

    /// Current number of buffered readings.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// True when nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Total readings evicted under the `DropOldest` policy.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
