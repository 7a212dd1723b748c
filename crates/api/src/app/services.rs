use std::sync::Arc;

use anyhow::Context;

use storewatch_core::BaseUrl;
use storewatch_infra::jobs::{
    InMemoryReportStore, LocalReportQueue, PlaceholderReportBuilder, PostgresReportStore,
    ReportQueue, ReportStore, ReportWorker,
};
use storewatch_infra::reports::{StatusService, SubmissionService};

use crate::config::ApiConfig;

/// Everything the handlers need, shared behind an `Arc` extension.
#[derive(Clone)]
pub struct AppServices {
    pub submission: SubmissionService,
    pub status: StatusService,
    pub store: Arc<dyn ReportStore>,
    /// Fixed base for report URLs; `None` derives it per request.
    pub public_base_url: Option<BaseUrl>,
}

impl AppServices {
    pub fn new(
        store: Arc<dyn ReportStore>,
        queue: Arc<dyn ReportQueue>,
        public_base_url: Option<BaseUrl>,
    ) -> Self {
        Self {
            submission: SubmissionService::new(store.clone(), queue),
            status: StatusService::new(store.clone()),
            store,
            public_base_url,
        }
    }
}

/// Wire store, queue and (for the in-process queue) a worker from configuration.
///
/// Must be called inside a tokio runtime: the local worker is spawned onto it
/// and runs until the queue is dropped with the returned services.
pub async fn build_services(config: &ApiConfig) -> anyhow::Result<AppServices> {
    let store: Arc<dyn ReportStore> = match &config.database_url {
        Some(url) => {
            let store = PostgresReportStore::connect(url)
                .await
                .context("failed to connect report store")?;
            tracing::info!("report store: postgres");
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; reports are kept in memory and lost on restart");
            Arc::new(InMemoryReportStore::new())
        }
    };

    let queue = match redis_queue(config)? {
        Some(queue) => queue,
        None => spawn_local_worker(store.clone(), config.queue_capacity),
    };

    Ok(AppServices::new(store, queue, config.public_base_url.clone()))
}

/// In-process queue drained by a [`ReportWorker`] using the placeholder builder.
pub fn spawn_local_worker(store: Arc<dyn ReportStore>, capacity: usize) -> Arc<dyn ReportQueue> {
    let (queue, receiver) = LocalReportQueue::channel(capacity);
    ReportWorker::new(receiver, store, Arc::new(PlaceholderReportBuilder::default())).spawn();
    tracing::info!(capacity, "report queue: in-process worker");
    Arc::new(queue)
}

#[cfg(feature = "redis")]
fn redis_queue(config: &ApiConfig) -> anyhow::Result<Option<Arc<dyn ReportQueue>>> {
    let Some(url) = &config.redis_url else {
        return Ok(None);
    };
    let queue = storewatch_infra::jobs::RedisReportQueue::new(url.as_str(), config.redis_queue_key.clone())
        .context("invalid REDIS_URL")?;
    tracing::info!(key = %config.redis_queue_key, "report queue: redis");
    Ok(Some(Arc::new(queue)))
}

#[cfg(not(feature = "redis"))]
fn redis_queue(config: &ApiConfig) -> anyhow::Result<Option<Arc<dyn ReportQueue>>> {
    if config.redis_url.is_some() {
        tracing::warn!("REDIS_URL is set but the `redis` feature is disabled; using the in-process queue");
    }
    Ok(None)
}
