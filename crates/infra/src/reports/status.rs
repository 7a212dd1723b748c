//! Read-only report status lookup.

use std::sync::Arc;

use serde::Serialize;
use tracing::instrument;

use storewatch_core::{validate_report_id, BaseUrl, ReportIdInput, ReportStatus};

use crate::jobs::ReportStore;

use super::error::ReportServiceError;

/// Client-facing projection of a job.
///
/// Serializes as `{"status": "Running"}`,
/// `{"status": "Complete", "report": "<absolute url>"}` or
/// `{"status": "Failed", "error": "<message>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status")]
pub enum StatusView {
    Running,
    Complete { report: String },
    Failed { error: String },
}

#[derive(Clone)]
pub struct StatusService {
    store: Arc<dyn ReportStore>,
}

impl StatusService {
    pub fn new(store: Arc<dyn ReportStore>) -> Self {
        Self { store }
    }

    /// Validate `raw_id`, look the job up and project it.
    ///
    /// Missing or malformed ids are rejected before the store is touched.
    /// Completed artifacts are resolved against `base` so the returned URL is
    /// usable without any session state.
    pub async fn status(
        &self,
        raw_id: Option<&str>,
        base: &BaseUrl,
    ) -> Result<StatusView, ReportServiceError> {
        self.status_with_base(raw_id, || Some(base.clone())).await
    }

    /// Like [`status`](Self::status), but `base` is only asked for once the job
    /// is known to be `Complete`. A `None` base then yields
    /// [`ReportServiceError::UnresolvableUrl`].
    #[instrument(skip(self, base), err(level = "debug"))]
    pub async fn status_with_base<F>(
        &self,
        raw_id: Option<&str>,
        base: F,
    ) -> Result<StatusView, ReportServiceError>
    where
        F: FnOnce() -> Option<BaseUrl> + Send,
    {
        let id = match validate_report_id(raw_id) {
            ReportIdInput::Valid(id) => id,
            ReportIdInput::Missing => return Err(ReportServiceError::MissingId),
            ReportIdInput::Malformed(reason) => return Err(ReportServiceError::InvalidId(reason)),
        };

        let job = self
            .store
            .get(id)
            .await?
            .ok_or(ReportServiceError::NotFound(id))?;

        Ok(match job.status() {
            ReportStatus::Running => StatusView::Running,
            ReportStatus::Complete { location } => {
                let base = base().ok_or(ReportServiceError::UnresolvableUrl(id))?;
                StatusView::Complete {
                    report: location.resolve(&base),
                }
            }
            ReportStatus::Failed { error } => StatusView::Failed {
                error: error.clone(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::testing::CountingStore;
    use crate::jobs::InMemoryReportStore;
    use crate::reports::ErrorCategory;
    use storewatch_core::{ArtifactLocation, ReportId};

    fn base() -> BaseUrl {
        BaseUrl::parse("http://testserver").unwrap()
    }

    fn counting() -> Arc<CountingStore<InMemoryReportStore>> {
        Arc::new(CountingStore::new(InMemoryReportStore::new()))
    }

    #[tokio::test]
    async fn missing_id_never_reaches_store() {
        let store = counting();
        let service = StatusService::new(store.clone());

        for raw in [None, Some("")] {
            let err = service.status(raw, &base()).await.unwrap_err();
            assert!(matches!(err, ReportServiceError::MissingId));
            assert_eq!(err.category(), ErrorCategory::ClientInput);
        }
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn malformed_id_never_reaches_store() {
        let store = counting();
        let service = StatusService::new(store.clone());

        let err = service.status(Some("not-a-uuid"), &base()).await.unwrap_err();

        assert!(matches!(err, ReportServiceError::InvalidId(_)));
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let store = counting();
        let service = StatusService::new(store.clone());
        let id = ReportId::new().to_string();

        let err = service.status(Some(&id), &base()).await.unwrap_err();

        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert_eq!(store.gets(), 1);
    }

    #[tokio::test]
    async fn running_job_has_no_report() {
        let store = InMemoryReportStore::arc();
        let id = store.create().await.unwrap().report_id().to_string();
        let service = StatusService::new(store);

        assert_eq!(
            service.status(Some(&id), &base()).await.unwrap(),
            StatusView::Running
        );
    }

    #[tokio::test]
    async fn complete_job_resolves_to_absolute_url() {
        let store = InMemoryReportStore::arc();
        let id = store.create().await.unwrap().report_id();
        store
            .complete(id, ArtifactLocation::new("/files/r1.csv").unwrap())
            .await
            .unwrap();
        let service = StatusService::new(store);

        let view = service.status(Some(&id.to_string()), &base()).await.unwrap();
        assert_eq!(
            view,
            StatusView::Complete {
                report: "http://testserver/files/r1.csv".to_string()
            }
        );
        assert_eq!(
            serde_json::to_value(&view).unwrap(),
            serde_json::json!({"status": "Complete", "report": "http://testserver/files/r1.csv"})
        );
    }

    #[tokio::test]
    async fn failed_job_exposes_error() {
        let store = InMemoryReportStore::arc();
        let id = store.create().await.unwrap().report_id();
        store.fail(id, "timezone data missing".to_string()).await.unwrap();
        let service = StatusService::new(store);

        let view = service.status(Some(&id.to_string()), &base()).await.unwrap();
        assert_eq!(
            serde_json::to_value(&view).unwrap(),
            serde_json::json!({"status": "Failed", "error": "timezone data missing"})
        );
    }

    #[tokio::test]
    async fn repeated_queries_are_identical_and_side_effect_free() {
        let store = counting();
        let id = store.create().await.unwrap().report_id().to_string();
        let service = StatusService::new(store.clone());

        let first = service.status(Some(&id), &base()).await.unwrap();
        let second = service.status(Some(&id), &base()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.updates(), 0);
        assert_eq!(store.deletes(), 0);
    }

    #[tokio::test]
    async fn base_is_only_needed_for_complete_jobs() {
        let store = InMemoryReportStore::arc();
        let running = store.create().await.unwrap().report_id();
        let failed = store.create().await.unwrap().report_id();
        store.fail(failed, "boom".to_string()).await.unwrap();
        let done = store.create().await.unwrap().report_id();
        store
            .complete(done, ArtifactLocation::new("/files/r1.csv").unwrap())
            .await
            .unwrap();
        let service = StatusService::new(store);

        let view = service
            .status_with_base(Some(&running.to_string()), || None)
            .await
            .unwrap();
        assert_eq!(view, StatusView::Running);

        let view = service
            .status_with_base(Some(&failed.to_string()), || None)
            .await
            .unwrap();
        assert!(matches!(view, StatusView::Failed { .. }));

        let err = service
            .status_with_base(Some(&done.to_string()), || None)
            .await
            .unwrap_err();
        assert!(matches!(err, ReportServiceError::UnresolvableUrl(id) if id == done));
        assert_eq!(err.category(), ErrorCategory::ClientInput);
    }

    #[tokio::test]
    async fn client_errors_do_not_need_a_base() {
        let service = StatusService::new(InMemoryReportStore::arc());

        let err = service.status_with_base(None, || None).await.unwrap_err();
        assert!(matches!(err, ReportServiceError::MissingId));

        let err = service
            .status_with_base(Some(&ReportId::new().to_string()), || None)
            .await
            .unwrap_err();
        assert!(matches!(err, ReportServiceError::NotFound(_)));
    }
}
