//! Per-reference status polling.
//!
//! Every active poll is a tokio task ticking on a fixed interval. Its join
//! handle lives in a map keyed by reference, which is what makes `start`
//! idempotent and lets `stop`/`stop_all` cancel it. A task removes its own
//! entry once it sees a terminal status.
//!
//! When a [`StatusSink`] is attached, every status is written to it and the
//! write is awaited before the caller's callback runs.

use crate::config::PollerConfig;
use crate::error::{PaymentError, Result};
use crate::gateway::PaymentGateway;
use crate::types::{TransactionReference, TransactionStatus};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Durable record of the statuses a poll observes.
#[async_trait]
pub trait StatusSink: Send + Sync {
    async fn record_status(&self, reference: &TransactionReference, status: TransactionStatus);
}

struct PollEntry {
    /// Distinguishes this poll from a later one for the same reference.
    id: u64,
    handle: JoinHandle<()>,
    last_status: Option<TransactionStatus>,
    started_at: Instant,
}

type PollEntries = Arc<Mutex<HashMap<TransactionReference, PollEntry>>>;

pub struct StatusPoller {
    gateway: Arc<dyn PaymentGateway>,
    sink: Option<Arc<dyn StatusSink>>,
    config: PollerConfig,
    entries: PollEntries,
    next_id: AtomicU64,
}

impl StatusPoller {
    pub fn new(gateway: Arc<dyn PaymentGateway>, config: PollerConfig) -> Self {
        Self {
            gateway,
            sink: None,
            config,
            entries: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(0),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn StatusSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    /// Begin polling `reference`, calling `on_status` with every status the
    /// provider reports, `QUEUED` repeats included.
    ///
    /// Returns `Ok(false)` without doing anything if a poll for this
    /// reference is already running. Must be called from within a tokio
    /// runtime.
    pub fn start<F>(&self, reference: TransactionReference, on_status: F) -> Result<bool>
    where
        F: Fn(TransactionStatus) + Send + 'static,
    {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| PaymentError::internal("Status polling requires a tokio runtime"))?;

        let mut entries = self.entries.lock();
        if entries.contains_key(&reference) {
            tracing::debug!("Status check already running for {}", reference);
            return Ok(false);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let handle = runtime.spawn(poll_loop(
            self.gateway.clone(),
            self.sink.clone(),
            self.entries.clone(),
            self.config.clone(),
            reference.clone(),
            id,
            on_status,
        ));

        tracing::info!("Starting status check for reference: {}", reference);
        entries.insert(
            reference,
            PollEntry {
                id,
                handle,
                last_status: None,
                started_at: Instant::now(),
            },
        );

        Ok(true)
    }

    /// Cancel the poll for `reference`. Returns false if none was running.
    pub fn stop(&self, reference: &TransactionReference) -> bool {
        let entry = self.entries.lock().remove(reference);
        match entry {
            Some(entry) => {
                entry.handle.abort();
                tracing::info!("Stopped status check for {}", reference);
                true
            }
            None => false,
        }
    }

    pub fn stop_all(&self) -> usize {
        let drained: Vec<_> = self.entries.lock().drain().collect();
        for (_, entry) in &drained {
            entry.handle.abort();
        }
        if !drained.is_empty() {
            tracing::info!("Stopped all status checks ({})", drained.len());
        }
        drained.len()
    }

    pub fn is_active(&self, reference: &TransactionReference) -> bool {
        self.entries.lock().contains_key(reference)
    }

    pub fn active_count(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn active_references(&self) -> Vec<TransactionReference> {
        self.entries.lock().keys().cloned().collect()
    }

    /// Most recent status seen by a still-running poll.
    pub fn last_status(&self, reference: &TransactionReference) -> Option<TransactionStatus> {
        self.entries
            .lock()
            .get(reference)
            .and_then(|entry| entry.last_status)
    }

    pub fn elapsed(&self, reference: &TransactionReference) -> Option<std::time::Duration> {
        self.entries
            .lock()
            .get(reference)
            .map(|entry| entry.started_at.elapsed())
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        self.stop_all();
    }
}

async fn poll_loop<F>(
    gateway: Arc<dyn PaymentGateway>,
    sink: Option<Arc<dyn StatusSink>>,
    entries: PollEntries,
    config: PollerConfig,
    reference: TransactionReference,
    id: u64,
    on_status: F,
) where
    F: Fn(TransactionStatus) + Send + 'static,
{
    let started = Instant::now();
    let mut ticker = interval_at(started + config.interval, config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        if let Some(max) = config.max_duration {
            if started.elapsed() >= max {
                tracing::warn!(
                    "Status check for {} gave up after {:?} without a final status",
                    reference,
                    max
                );
                record(&sink, &reference, TransactionStatus::TimedOut).await;
                release(&entries, &reference, id);
                on_status(TransactionStatus::TimedOut);
                return;
            }
        }

        match gateway.query_status(&reference).await {
            Ok(status) => {
                tracing::debug!("Status for {}: {}", reference, status);
                record(&sink, &reference, status).await;

                if status.is_terminal() {
                    release(&entries, &reference, id);
                    on_status(status);
                    tracing::info!("Status check for {} finished with {}", reference, status);
                    return;
                }

                if let Some(entry) = entries.lock().get_mut(&reference) {
                    if entry.id == id {
                        entry.last_status = Some(status);
                    }
                }
                on_status(status);
            }
            Err(e) => {
                tracing::warn!("Error checking status for {}: {}", reference, e);
            }
        }
    }
}

async fn record(
    sink: &Option<Arc<dyn StatusSink>>,
    reference: &TransactionReference,
    status: TransactionStatus,
) {
    if let Some(sink) = sink {
        sink.record_status(reference, status).await;
    }
}

/// Drop this poll's bookkeeping, leaving a newer poll for the same
/// reference alone.
fn release(entries: &PollEntries, reference: &TransactionReference, id: u64) {
    let mut entries = entries.lock();
    if entries.get(reference).map(|entry| entry.id) == Some(id) {
        entries.remove(reference);
    }
}
