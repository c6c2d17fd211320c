//! Background applier for the sync outbox

use super::outbox::now_millis;
use super::{Outbox, OutboxEntry, Synchronizer};
use crate::config::SyncConfig;
use crate::Result;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Outcome of one [`SyncWorker::drain_once`] pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub applied: u64,
    pub retried: u64,
    pub dead: u64,
}

impl DrainReport {
    pub fn is_empty(&self) -> bool {
        self.applied == 0 && self.retried == 0 && self.dead == 0
    }
}

#[derive(Debug, Clone)]
pub struct SyncWorker {
    synchronizer: Synchronizer,
    outbox: Outbox,
    config: SyncConfig,
}

impl SyncWorker {
    pub fn new(synchronizer: Synchronizer, outbox: Outbox, config: SyncConfig) -> Self {
        Self {
            synchronizer,
            outbox,
            config,
        }
    }

    /// Apply every entry that is due now.
    ///
    /// Failed entries are rescheduled into the future, so a single pass
    /// always terminates.
    pub async fn drain_once(&self) -> Result<DrainReport> {
        let now = now_millis();
        let mut report = DrainReport::default();

        loop {
            let batch = self.outbox.due(now, self.config.batch_size.max(1)).await?;
            if batch.is_empty() {
                break;
            }
            for entry in batch {
                self.process(entry, now, &mut report).await?;
            }
        }

        if !report.is_empty() {
            info!(
                applied = report.applied,
                retried = report.retried,
                dead = report.dead,
                "Sync outbox drained"
            );
        }
        Ok(report)
    }

    async fn process(&self, entry: OutboxEntry, now: i64, report: &mut DrainReport) -> Result<()> {
        let OutboxEntry { seq, intent, attempts } = entry;

        let err = match self.synchronizer.apply(&intent).await {
            Ok(_) => {
                self.outbox.complete(seq).await?;
                report.applied += 1;
                return Ok(());
            }
            Err(e) => e.to_string(),
        };

        let attempts = attempts.saturating_add(1);
        let (collection, id) = intent.target();

        if attempts >= self.config.max_attempts {
            error!(
                collection = %collection,
                id,
                operation = intent.operation(),
                attempts,
                error = %err,
                "Sync intent failed permanently"
            );
            self.outbox.bury(seq, attempts, &err).await?;
            report.dead += 1;
        } else {
            let delay = self.config.backoff_ms(attempts);
            warn!(
                collection = %collection,
                id,
                operation = intent.operation(),
                attempts,
                retry_in_ms = delay,
                error = %err,
                "Sync intent failed, will retry"
            );
            let next = now.saturating_add(i64::try_from(delay).unwrap_or(i64::MAX));
            self.outbox.reschedule(seq, attempts, next, &err).await?;
            report.retried += 1;
        }
        Ok(())
    }

    /// Run until `shutdown` is cancelled, then drain once more
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            poll_interval_ms = self.config.poll_interval_ms,
            max_attempts = self.config.max_attempts,
            "Sync worker started"
        );

        loop {
            if let Err(e) = self.drain_once().await {
                error!("Sync outbox drain failed: {}", e);
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = self.outbox.notified() => {}
                _ = tokio::time::sleep(self.config.poll_interval()) => {}
            }
        }

        if let Err(e) = self.drain_once().await {
            error!("Final sync outbox drain failed: {}", e);
        }
        info!("Sync worker stopped");
    }
}
