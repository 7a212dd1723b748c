//! Test doubles for the store and queue seams.
//!
//! Compiled for this crate's tests and, through the `testing` feature, for the
//! API crate's black-box tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use storewatch_core::{ReportId, ReportJob, ReportStatus};

use super::queue::{DispatchOutcome, ReportQueue};
use super::store::{ReportStore, StoreError};

/// Queue that refuses every job with the same reason.
#[derive(Debug, Clone)]
pub struct RejectingQueue {
    reason: String,
}

impl RejectingQueue {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl ReportQueue for RejectingQueue {
    async fn enqueue(&self, _id: ReportId) -> DispatchOutcome {
        DispatchOutcome::rejected(self.reason.clone())
    }
}

/// Queue that accepts everything and remembers what it was given.
#[derive(Debug, Default)]
pub struct RecordingQueue {
    accepted: Mutex<Vec<ReportId>>,
}

impl RecordingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accepted(&self) -> Vec<ReportId> {
        self.accepted.lock().map(|ids| ids.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ReportQueue for RecordingQueue {
    async fn enqueue(&self, id: ReportId) -> DispatchOutcome {
        match self.accepted.lock() {
            Ok(mut ids) => {
                ids.push(id);
                DispatchOutcome::Accepted
            }
            Err(_) => DispatchOutcome::rejected("recording queue poisoned"),
        }
    }
}

/// Store wrapper that counts calls per operation.
#[derive(Debug, Default)]
pub struct CountingStore<S> {
    inner: S,
    creates: AtomicUsize,
    gets: AtomicUsize,
    updates: AtomicUsize,
    deletes: AtomicUsize,
}

impl<S: ReportStore> CountingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            creates: AtomicUsize::new(0),
            gets: AtomicUsize::new(0),
            updates: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
        }
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    /// Total calls that touched the store (reads and writes).
    pub fn calls(&self) -> usize {
        self.creates() + self.gets() + self.updates() + self.deletes()
    }
}

#[async_trait]
impl<S: ReportStore> ReportStore for CountingStore<S> {
    async fn create(&self) -> Result<ReportJob, StoreError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.inner.create().await
    }

    async fn get(&self, id: ReportId) -> Result<Option<ReportJob>, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(id).await
    }

    async fn update(&self, job: &ReportJob) -> Result<(), StoreError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.inner.update(job).await
    }

    async fn finish(&self, id: ReportId, outcome: ReportStatus) -> Result<ReportJob, StoreError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.inner.finish(id, outcome).await
    }

    async fn delete(&self, id: ReportId) -> Result<(), StoreError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(id).await
    }

    async fn count(&self) -> Result<usize, StoreError> {
        self.inner.count().await
    }
}

/// Store whose every operation fails, as if the database were down.
#[derive(Debug, Clone)]
pub struct UnavailableStore {
    message: String,
}

impl UnavailableStore {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    fn err(&self) -> StoreError {
        StoreError::Storage(self.message.clone())
    }
}

#[async_trait]
impl ReportStore for UnavailableStore {
    async fn create(&self) -> Result<ReportJob, StoreError> {
        Err(self.err())
    }

    async fn get(&self, _id: ReportId) -> Result<Option<ReportJob>, StoreError> {
        Err(self.err())
    }

    async fn update(&self, _job: &ReportJob) -> Result<(), StoreError> {
        Err(self.err())
    }

    async fn finish(&self, _id: ReportId, _outcome: ReportStatus) -> Result<ReportJob, StoreError> {
        Err(self.err())
    }

    async fn delete(&self, _id: ReportId) -> Result<(), StoreError> {
        Err(self.err())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Err(self.err())
    }
}
