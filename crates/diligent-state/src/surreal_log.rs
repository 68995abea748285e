//! SurrealDB-backed ReportLog implementation
//!
//! Uses a private row type for persistence, converting to/from
//! [`LogRecord`] at the boundary.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::sql::Datetime as SurrealDatetime;
use tracing::debug;

use crate::error::StorageError;
use crate::handle::SurrealHandle;
use crate::migrations::REPORT_LOGS_TABLE;
use crate::storage_traits::{ContentDigest, LogRecord, ReportLog, StorageResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DbLogRow {
    log_id: String,
    date: String,
    content: String,
    digest: String,
    created_at: SurrealDatetime,
}

impl DbLogRow {
    fn from_record(record: &LogRecord) -> Self {
        Self {
            log_id: record.id.clone(),
            date: record.date.clone(),
            content: record.content.clone(),
            digest: record.digest.as_str().to_string(),
            created_at: SurrealDatetime::from(record.created_at),
        }
    }

    fn into_record(self) -> StorageResult<LogRecord> {
        Ok(LogRecord {
            id: self.log_id,
            date: self.date,
            content: self.content,
            digest: ContentDigest::try_from(self.digest)?,
            created_at: DateTime::<Utc>::from(self.created_at),
        })
    }
}

/// SurrealDB-backed implementation of [`ReportLog`].
#[derive(Clone)]
pub struct SurrealReportLog {
    handle: SurrealHandle,
}

impl SurrealReportLog {
    pub fn new(handle: SurrealHandle) -> Self {
        Self { handle }
    }

    /// Create an in-memory instance for testing.
    pub async fn in_memory() -> crate::Result<Self> {
        Ok(Self::new(SurrealHandle::setup_db().await?))
    }

    /// Connect to an explicit engine URL.
    pub async fn connect(url: &str) -> crate::Result<Self> {
        Ok(Self::new(SurrealHandle::connect(url).await?))
    }

    /// Create from environment variables.
    ///
    /// Uses the same env-var chain as [`SurrealHandle::setup_from_env`].
    pub async fn from_env() -> crate::Result<Self> {
        Ok(Self::new(SurrealHandle::setup_from_env().await?))
    }
}

#[async_trait]
impl ReportLog for SurrealReportLog {
    async fn append(&self, date: &str, content: &str) -> StorageResult<LogRecord> {
        let record = LogRecord::new(date, content);
        debug!(log_id = %record.id, digest = %record.digest.short(), "appending report");

        let _created: Option<DbLogRow> = self
            .handle
            .db()
            .create(REPORT_LOGS_TABLE)
            .content(DbLogRow::from_record(&record))
            .await?;

        Ok(record)
    }

    async fn recent(&self, limit: usize) -> StorageResult<Vec<LogRecord>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT * FROM {} ORDER BY created_at DESC LIMIT {}",
            REPORT_LOGS_TABLE, limit
        );
        let mut res = self.handle.db().query(sql).await?;
        let rows: Vec<DbLogRow> = res.take(0)?;

        rows.into_iter().map(DbLogRow::into_record).collect()
    }

    async fn get(&self, id: &str) -> StorageResult<LogRecord> {
        let sql = format!("SELECT * FROM {} WHERE log_id = $id", REPORT_LOGS_TABLE);
        let mut res = self
            .handle
            .db()
            .query(sql)
            .bind(("id", id.to_string()))
            .await?;
        let rows: Vec<DbLogRow> = res.take(0)?;

        rows.into_iter()
            .next()
            .ok_or_else(|| StorageError::RecordNotFound { id: id.to_string() })?
            .into_record()
    }
}
