//! Report job plumbing: storage, dispatch and the in-process worker.
//!
//! ## Components
//!
//! - `ReportStore`: persistence for jobs (in-memory or Postgres)
//! - `ReportQueue`: fire-and-forget dispatch (in-process channel or Redis list)
//! - `ReportWorker`: consumes the in-process queue and records outcomes

pub mod postgres;
pub mod queue;
#[cfg(feature = "redis")]
pub mod redis_queue;
pub mod store;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod worker;

pub use postgres::PostgresReportStore;
pub use queue::{DispatchOutcome, LocalReportQueue, ReportQueue};
#[cfg(feature = "redis")]
pub use redis_queue::{RedisQueueError, RedisReportQueue, DEFAULT_QUEUE_KEY};
pub use store::{InMemoryReportStore, ReportStore, StoreError};
pub use worker::{BuildError, PlaceholderReportBuilder, ReportBuilder, ReportWorker, WorkerError};
