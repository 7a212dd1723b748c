//! Postgres-backed report store.
//!
//! One row per job in `report_jobs`. The status column holds the lowercase
//! label; `result_location` is set only for `complete` rows and `error` only for
//! `failed` rows (enforced by a CHECK constraint).
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `AlreadyExists` |
//! | Database (other) | Any other | `Storage` |
//! | PoolClosed / other | N/A | `Storage` |

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use storewatch_core::{ArtifactLocation, DomainError, ReportId, ReportJob, ReportStatus};

use super::store::{ReportStore, StoreError};

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS report_jobs (
        report_id       UUID PRIMARY KEY,
        status          TEXT NOT NULL,
        result_location TEXT,
        error           TEXT,
        created_at      TIMESTAMPTZ NOT NULL,
        updated_at      TIMESTAMPTZ NOT NULL,
        CONSTRAINT report_jobs_status_shape CHECK (
            (status = 'running'  AND result_location IS NULL     AND error IS NULL) OR
            (status = 'complete' AND result_location IS NOT NULL AND error IS NULL) OR
            (status = 'failed'   AND result_location IS NULL     AND error IS NOT NULL)
        )
    )
"#;

/// Postgres-backed report store.
///
/// Uses the SQLx connection pool (thread-safe). Every operation is a single
/// statement, so no explicit transactions are needed.
#[derive(Debug, Clone)]
pub struct PostgresReportStore {
    pool: Arc<PgPool>,
}

impl PostgresReportStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Connect and make sure the `report_jobs` table exists.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_TABLE)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }

    async fn insert(&self, job: &ReportJob) -> Result<(), StoreError> {
        let (status, location, error) = status_columns(job.status());
        sqlx::query(
            r#"
            INSERT INTO report_jobs (report_id, status, result_location, error, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(*job.report_id().as_uuid())
        .bind(status)
        .bind(location)
        .bind(error)
        .bind(job.created_at())
        .bind(job.updated_at())
        .execute(&*self.pool)
        .await
        .map_err(|e| match map_sqlx_error("insert", e) {
            StoreError::AlreadyExists(_) => StoreError::AlreadyExists(job.report_id()),
            other => other,
        })?;
        Ok(())
    }
}

#[async_trait]
impl ReportStore for PostgresReportStore {
    #[instrument(skip(self), err)]
    async fn create(&self) -> Result<ReportJob, StoreError> {
        let job = ReportJob::new();
        self.insert(&job).await?;
        Ok(job)
    }

    #[instrument(skip(self), fields(report_id = %id), err)]
    async fn get(&self, id: ReportId) -> Result<Option<ReportJob>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT report_id, status, result_location, error, created_at, updated_at
            FROM report_jobs
            WHERE report_id = $1
            "#,
        )
        .bind(*id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get", e))?;

        row.map(|row| job_from_row(&row)).transpose()
    }

    #[instrument(skip(self, job), fields(report_id = %job.report_id()), err)]
    async fn update(&self, job: &ReportJob) -> Result<(), StoreError> {
        let (status, location, error) = status_columns(job.status());
        let result = sqlx::query(
            r#"
            UPDATE report_jobs
            SET status = $2, result_location = $3, error = $4, updated_at = $5
            WHERE report_id = $1
            "#,
        )
        .bind(*job.report_id().as_uuid())
        .bind(status)
        .bind(location)
        .bind(error)
        .bind(job.updated_at())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(job.report_id()));
        }
        Ok(())
    }

    /// `UPDATE .. WHERE status = 'running'`, so only one terminal write can land.
    #[instrument(skip(self, outcome), fields(report_id = %id), err)]
    async fn finish(&self, id: ReportId, outcome: ReportStatus) -> Result<ReportJob, StoreError> {
        if !outcome.is_terminal() {
            return Err(StoreError::InvalidTransition(DomainError::invariant(format!(
                "cannot move report {id} back to Running"
            ))));
        }

        let (status, location, error) = status_columns(&outcome);
        let row = sqlx::query(
            r#"
            UPDATE report_jobs
            SET status = $2, result_location = $3, error = $4, updated_at = $5
            WHERE report_id = $1 AND status = 'running'
            RETURNING report_id, status, result_location, error, created_at, updated_at
            "#,
        )
        .bind(*id.as_uuid())
        .bind(status)
        .bind(location)
        .bind(error)
        .bind(Utc::now())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("finish", e))?;

        if let Some(row) = row {
            return job_from_row(&row);
        }

        match self.get(id).await? {
            None => Err(StoreError::NotFound(id)),
            Some(current) => Err(StoreError::InvalidTransition(DomainError::invariant(format!(
                "cannot finish report {id}: already {}",
                current.status().as_str()
            )))),
        }
    }

    #[instrument(skip(self), fields(report_id = %id), err)]
    async fn delete(&self, id: ReportId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM report_jobs WHERE report_id = $1")
            .bind(*id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete", e))?;
        Ok(())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM report_jobs")
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("count", e))?;
        Ok(n.max(0) as usize)
    }
}

fn status_columns(status: &ReportStatus) -> (&'static str, Option<&str>, Option<&str>) {
    match status {
        ReportStatus::Running => ("running", None, None),
        ReportStatus::Complete { location } => ("complete", Some(location.as_str()), None),
        ReportStatus::Failed { error } => ("failed", None, Some(error.as_str())),
    }
}

fn job_from_row(row: &PgRow) -> Result<ReportJob, StoreError> {
    let decode = |e: sqlx::Error| StoreError::Storage(format!("failed to decode report row: {e}"));

    let id: Uuid = row.try_get("report_id").map_err(decode)?;
    let status: String = row.try_get("status").map_err(decode)?;
    let location: Option<String> = row.try_get("result_location").map_err(decode)?;
    let error: Option<String> = row.try_get("error").map_err(decode)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(decode)?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(decode)?;

    let status = match (status.as_str(), location, error) {
        ("running", _, _) => ReportStatus::Running,
        ("complete", Some(location), _) => ReportStatus::Complete {
            location: ArtifactLocation::new(location)?,
        },
        ("complete", None, _) => {
            return Err(StoreError::Storage(format!(
                "complete report {id} has no result location"
            )));
        }
        ("failed", _, error) => ReportStatus::Failed {
            error: error.unwrap_or_default(),
        },
        (other, _, _) => {
            return Err(StoreError::Storage(format!(
                "unexpected report status in row {id}: {other}"
            )));
        }
    };

    Ok(ReportJob::restore(
        ReportId::from_uuid(id),
        status,
        created_at,
        updated_at,
    ))
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            if db_err.code().as_deref() == Some("23505") {
                // Caller substitutes the real id; the driver error doesn't carry it.
                return StoreError::AlreadyExists(ReportId::from_uuid(Uuid::nil()));
            }
            StoreError::Storage(format!("database error in {operation}: {}", db_err.message()))
        }
        sqlx::Error::PoolClosed => {
            StoreError::Storage(format!("connection pool closed in {operation}"))
        }
        other => StoreError::Storage(format!("sqlx error in {operation}: {other}")),
    }
}
