//! Durable queue of pending sync intents
//!
//! Rows live in the `sync_outbox` table. A row is `pending` until the worker
//! applies it (then it is deleted) or gives up on it (then it becomes
//! `dead`). Dead rows stay for inspection and can be requeued.

use super::SyncIntent;
use crate::db::begin_immediate;
use crate::Result;
use chrono::Utc;
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{debug, error};

const STATUS_PENDING: &str = "pending";
const STATUS_DEAD: &str = "dead";

/// Current time in milliseconds since the Unix epoch
pub(crate) fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// A pending intent handed to the worker
#[derive(Debug, Clone, PartialEq)]
pub struct OutboxEntry {
    pub seq: i64,
    pub intent: SyncIntent,
    /// Failed attempts so far
    pub attempts: u32,
}

/// Queue depth by status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutboxStatus {
    pub pending: u64,
    pub dead: u64,
}

/// An intent the worker gave up on
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct DeadLetter {
    pub seq: i64,
    /// Stored intent JSON, kept verbatim in case it no longer decodes
    pub intent: String,
    pub attempts: i64,
    pub last_error: Option<String>,
    pub created_at: String,
}

#[derive(FromRow)]
struct PendingRow {
    seq: i64,
    intent: String,
    attempts: i64,
}

#[derive(Debug, Clone)]
pub struct Outbox {
    pool: SqlitePool,
    wake: Arc<Notify>,
}

impl Outbox {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            wake: Arc::new(Notify::new()),
        }
    }

    /// Persist `intents` (all or none) and wake the worker
    pub async fn enqueue(&self, intents: &[SyncIntent]) -> Result<()> {
        if intents.is_empty() {
            return Ok(());
        }

        let now = now_millis();
        let mut tx = begin_immediate(&self.pool).await?;
        for intent in intents {
            sqlx::query("INSERT INTO sync_outbox (intent, status, next_attempt_at) VALUES (?, ?, ?)")
                .bind(serde_json::to_string(intent)?)
                .bind(STATUS_PENDING)
                .bind(now)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        debug!(count = intents.len(), "Enqueued sync intents");
        self.wake.notify_one();
        Ok(())
    }

    /// Pending entries due at `now_ms`, oldest first
    ///
    /// Rows whose intent no longer decodes are moved to the dead letters.
    pub async fn due(&self, now_ms: i64, limit: u32) -> Result<Vec<OutboxEntry>> {
        let rows: Vec<PendingRow> = sqlx::query_as(
            "SELECT seq, intent, attempts FROM sync_outbox
             WHERE status = ? AND next_attempt_at <= ?
             ORDER BY seq
             LIMIT ?",
        )
        .bind(STATUS_PENDING)
        .bind(now_ms)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let attempts = u32::try_from(row.attempts).unwrap_or(u32::MAX);
            match serde_json::from_str(&row.intent) {
                Ok(intent) => entries.push(OutboxEntry {
                    seq: row.seq,
                    intent,
                    attempts,
                }),
                Err(e) => {
                    error!(seq = row.seq, error = %e, "Undecodable sync intent moved to dead letters");
                    self.bury(row.seq, attempts, &format!("undecodable intent: {e}"))
                        .await?;
                }
            }
        }
        Ok(entries)
    }

    /// Remove an applied entry
    pub async fn complete(&self, seq: i64) -> Result<()> {
        sqlx::query("DELETE FROM sync_outbox WHERE seq = ?")
            .bind(seq)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Record a failed attempt and schedule the next one
    pub async fn reschedule(
        &self,
        seq: i64,
        attempts: u32,
        next_attempt_at: i64,
        last_error: &str,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE sync_outbox SET attempts = ?, next_attempt_at = ?, last_error = ? WHERE seq = ?",
        )
        .bind(i64::from(attempts))
        .bind(next_attempt_at)
        .bind(last_error)
        .bind(seq)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Give up on an entry
    pub async fn bury(&self, seq: i64, attempts: u32, last_error: &str) -> Result<()> {
        sqlx::query("UPDATE sync_outbox SET status = ?, attempts = ?, last_error = ? WHERE seq = ?")
            .bind(STATUS_DEAD)
            .bind(i64::from(attempts))
            .bind(last_error)
            .bind(seq)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn status(&self) -> Result<OutboxStatus> {
        let counts: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM sync_outbox GROUP BY status")
                .fetch_all(&self.pool)
                .await?;

        let mut status = OutboxStatus::default();
        for (name, count) in counts {
            let count = u64::try_from(count).unwrap_or(0);
            match name.as_str() {
                STATUS_PENDING => status.pending = count,
                STATUS_DEAD => status.dead = count,
                _ => {}
            }
        }
        Ok(status)
    }

    pub async fn dead_letters(&self) -> Result<Vec<DeadLetter>> {
        let letters = sqlx::query_as(
            "SELECT seq, intent, attempts, last_error, CAST(created_at AS TEXT) AS created_at
             FROM sync_outbox WHERE status = ? ORDER BY seq",
        )
        .bind(STATUS_DEAD)
        .fetch_all(&self.pool)
        .await?;
        Ok(letters)
    }

    /// Move every dead entry back to pending with a fresh attempt budget.
    /// Returns the number requeued.
    pub async fn requeue_dead(&self) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE sync_outbox SET status = ?, attempts = 0, next_attempt_at = ? WHERE status = ?",
        )
        .bind(STATUS_PENDING)
        .bind(now_millis())
        .bind(STATUS_DEAD)
        .execute(&self.pool)
        .await?;

        let requeued = result.rows_affected();
        if requeued > 0 {
            self.wake.notify_one();
        }
        Ok(requeued)
    }

    /// Resolves after the next successful enqueue or requeue
    pub async fn notified(&self) {
        self.wake.notified().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_database;

    fn intent(n: u32) -> SyncIntent {
        SyncIntent::AddFilmRefToActor {
            actor_id: format!("a{n}"),
            film_ids: vec!["f1".to_string()],
        }
    }

    async fn outbox() -> Outbox {
        Outbox::new(init_memory_database().await.unwrap())
    }

    #[tokio::test]
    async fn enqueued_intents_come_back_in_order() {
        let outbox = outbox().await;
        outbox.enqueue(&[intent(1), intent(2)]).await.unwrap();

        let due = outbox.due(now_millis(), 10).await.unwrap();
        assert_eq!(due.len(), 2);
        assert_eq!(due[0].intent, intent(1));
        assert_eq!(due[1].intent, intent(2));
        assert!(due[0].seq < due[1].seq);
        assert_eq!(due[0].attempts, 0);
    }

    #[tokio::test]
    async fn rescheduled_entries_wait() {
        let outbox = outbox().await;
        outbox.enqueue(&[intent(1)]).await.unwrap();
        let now = now_millis();
        let entry = outbox.due(now, 10).await.unwrap().remove(0);

        outbox.reschedule(entry.seq, 1, now + 60_000, "boom").await.unwrap();
        assert!(outbox.due(now, 10).await.unwrap().is_empty());

        let later = outbox.due(now + 60_000, 10).await.unwrap();
        assert_eq!(later[0].attempts, 1);
    }

    #[tokio::test]
    async fn buried_entries_can_be_requeued() {
        let outbox = outbox().await;
        outbox.enqueue(&[intent(1), intent(2)]).await.unwrap();
        let due = outbox.due(now_millis(), 10).await.unwrap();

        outbox.complete(due[0].seq).await.unwrap();
        outbox.bury(due[1].seq, 8, "gone").await.unwrap();
        assert_eq!(outbox.status().await.unwrap(), OutboxStatus { pending: 0, dead: 1 });

        let dead = outbox.dead_letters().await.unwrap();
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].last_error.as_deref(), Some("gone"));

        assert_eq!(outbox.requeue_dead().await.unwrap(), 1);
        let due = outbox.due(now_millis(), 10).await.unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].attempts, 0);
    }

    #[tokio::test]
    async fn undecodable_rows_are_buried() {
        let outbox = outbox().await;
        sqlx::query("INSERT INTO sync_outbox (intent, next_attempt_at) VALUES ('{\"op\":\"nope\"}', 0)")
            .execute(&outbox.pool)
            .await
            .unwrap();

        assert!(outbox.due(now_millis(), 10).await.unwrap().is_empty());
        assert_eq!(outbox.status().await.unwrap().dead, 1);
    }

    #[tokio::test]
    async fn empty_enqueue_is_noop() {
        let outbox = outbox().await;
        outbox.enqueue(&[]).await.unwrap();
        assert_eq!(outbox.status().await.unwrap(), OutboxStatus::default());
    }
}
