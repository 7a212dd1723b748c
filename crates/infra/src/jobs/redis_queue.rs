//! Redis list-backed report queue (optional).
//!
//! Pushes a small JSON message onto a Redis list for an out-of-process worker
//! (which pops with `BRPOP`, giving FIFO order). The worker is responsible for
//! writing `Complete`/`Failed` back to the shared report store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::Commands;
use serde::{Deserialize, Serialize};

use storewatch_core::ReportId;

use super::queue::{DispatchOutcome, ReportQueue};

pub const DEFAULT_QUEUE_KEY: &str = "storewatch:reports";

/// Message placed on the Redis list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedReport {
    pub report_id: ReportId,
    pub enqueued_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum RedisQueueError {
    #[error("redis: {0}")]
    Redis(String),
}

/// Producer side of the Redis report queue.
#[derive(Debug, Clone)]
pub struct RedisReportQueue {
    client: redis::Client,
    key: String,
}

impl RedisReportQueue {
    pub fn new(redis_url: impl AsRef<str>, key: impl Into<String>) -> Result<Self, RedisQueueError> {
        let client = redis::Client::open(redis_url.as_ref())
            .map_err(|e| RedisQueueError::Redis(e.to_string()))?;
        Ok(Self {
            client,
            key: key.into(),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    fn push(&self, message: &QueuedReport) -> Result<(), String> {
        let payload = serde_json::to_string(message).map_err(|e| e.to_string())?;
        let mut conn = self.client.get_connection().map_err(|e| e.to_string())?;
        let _: i64 = conn.lpush(&self.key, payload).map_err(|e| e.to_string())?;
        Ok(())
    }
}

#[async_trait]
impl ReportQueue for RedisReportQueue {
    async fn enqueue(&self, id: ReportId) -> DispatchOutcome {
        let queue = self.clone();
        let message = QueuedReport {
            report_id: id,
            enqueued_at: Utc::now(),
        };

        // The redis client is blocking; keep it off the async workers.
        let pushed = tokio::task::spawn_blocking(move || queue.push(&message)).await;

        match pushed {
            Ok(Ok(())) => DispatchOutcome::Accepted,
            Ok(Err(e)) => {
                tracing::warn!(report_id = %id, error = %e, "redis enqueue failed");
                DispatchOutcome::rejected(e)
            }
            Err(e) => DispatchOutcome::rejected(format!("enqueue task aborted: {e}")),
        }
    }
}
