//! Jittered polling of the inbox

use chrono::{DateTime, Utc};
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::PollConfig;
use crate::responder::{AutoResponder, ReplyOutcome};

/// Inclusive range a wait between polls is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollInterval {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl PollInterval {
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    /// Uniform whole-millisecond wait in `[min_ms, max_ms]`
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let ms = if self.min_ms >= self.max_ms {
            self.min_ms
        } else {
            rng.gen_range(self.min_ms..=self.max_ms)
        };
        Duration::from_millis(ms)
    }
}

impl Default for PollInterval {
    fn default() -> Self {
        Self::new(45_000, 120_000)
    }
}

impl From<&PollConfig> for PollInterval {
    fn from(config: &PollConfig) -> Self {
        Self::new(config.min_interval_ms, config.max_interval_ms)
    }
}

/// Log line for the wait before the next poll, in fractional seconds
pub fn wait_message(wait: Duration) -> String {
    format!("Waiting for {} seconds ...", wait.as_secs_f64())
}

/// What one poll did
#[derive(Debug, Clone)]
pub struct PollReport {
    pub poll_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub listed: usize,
    pub replied: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl PollReport {
    fn new(poll_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            poll_id,
            started_at: now,
            finished_at: now,
            listed: 0,
            replied: 0,
            skipped: 0,
            failed: 0,
        }
    }

    fn record(&mut self, outcome: &ReplyOutcome) {
        match outcome {
            ReplyOutcome::Replied { .. } => self.replied += 1,
            ReplyOutcome::Skipped(_) => self.skipped += 1,
            ReplyOutcome::DeliveryFailed { .. } => self.failed += 1,
        }
    }
}

/// Drives the responder over the newest inbox messages at random intervals
pub struct Poller<R> {
    responder: AutoResponder,
    interval: PollInterval,
    label_filter: Vec<String>,
    batch_size: u32,
    rng: R,
}

impl<R: Rng + Send> Poller<R> {
    pub fn new(responder: AutoResponder, config: &PollConfig, rng: R) -> Self {
        Self {
            responder,
            interval: PollInterval::from(config),
            label_filter: config.label_filter.clone(),
            batch_size: config.batch_size,
            rng,
        }
    }

    /// List the newest messages and process each one.
    ///
    /// Never fails: a listing error is logged and treated as an empty inbox,
    /// and each message's error is logged and counted without stopping the
    /// rest of the batch.
    pub async fn run_once(&mut self) -> PollReport {
        let poll_id = Uuid::new_v4();
        let span = info_span!("poll", poll_id = %poll_id);
        let mut report = PollReport::new(poll_id);

        async {
            let ids = match self
                .responder
                .client()
                .list_message_ids(&self.label_filter, self.batch_size)
                .await
            {
                Ok(ids) => ids,
                Err(e) if e.is_transient() => {
                    warn!("Listing messages failed, retrying next poll: {}", e);
                    Vec::new()
                }
                Err(e) => {
                    error!("Listing messages failed: {}", e);
                    Vec::new()
                }
            };
            report.listed = ids.len();

            for id in &ids {
                match self.responder.execute(id).await {
                    Ok(outcome) => report.record(&outcome),
                    Err(e) => {
                        error!("Error processing message {}: {}", id, e);
                        report.failed += 1;
                    }
                }
            }
        }
        .instrument(span)
        .await;

        report.finished_at = Utc::now();
        info!(
            "Poll {} done: {} listed, {} replied, {} skipped, {} failed",
            report.poll_id, report.listed, report.replied, report.skipped, report.failed
        );
        report
    }

    /// Poll immediately, then again after each sampled wait, until `shutdown`
    /// completes. Returns the number of polls run.
    pub async fn run_until<F>(&mut self, shutdown: F) -> usize
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut polls = 0;

        loop {
            self.run_once().await;
            polls += 1;

            let wait = self.interval.sample(&mut self.rng);
            info!("{}", wait_message(wait));

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping after {} poll(s)", polls);
                    return polls;
                }
            }
        }
    }
}
