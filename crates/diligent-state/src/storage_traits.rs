//! Storage trait for persisted reports
//!
//! `ReportLog` is the seam between the CLI and the backing store. Both the
//! SurrealDB implementation and the in-memory fake satisfy the same contract:
//!
//! - `append` stores the content verbatim and returns the new record, whose
//!   digest is the SHA-256 of the content.
//! - `recent` returns records newest first, at most `limit` of them.
//! - `get` returns `StorageError::RecordNotFound` for an unknown id.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::StorageError;

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Format of the `date` column.
pub const LOG_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format a timestamp for the `date` column.
pub fn format_log_date(at: &DateTime<Utc>) -> String {
    at.format(LOG_DATE_FORMAT).to_string()
}

// ---------------------------------------------------------------------------
// ContentDigest
// ---------------------------------------------------------------------------

/// Content digest (SHA-256 hex string).
///
/// The inner field is private to guarantee the string is always valid
/// lowercase hex produced by `from_bytes` or validated via `TryFrom<String>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentDigest(String);

impl ContentDigest {
    /// Compute the SHA-256 digest of the given bytes.
    pub fn from_bytes(data: &[u8]) -> Self {
        use sha2::Digest;
        let mut hasher = Sha256::new();
        hasher.update(data);
        ContentDigest(hex::encode(hasher.finalize()))
    }

    /// Return the full hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form (first 12 hex chars).
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl TryFrom<String> for ContentDigest {
    type Error = StorageError;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        if s.len() != 64 || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(StorageError::InvalidDigest { digest: s });
        }
        Ok(ContentDigest(s.to_ascii_lowercase()))
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ReportLog
// ---------------------------------------------------------------------------

/// One persisted report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Random identifier assigned on append.
    pub id: String,

    /// Run timestamp, formatted with [`LOG_DATE_FORMAT`].
    pub date: String,

    /// The indented JSON report.
    pub content: String,

    pub digest: ContentDigest,

    pub created_at: DateTime<Utc>,
}

impl LogRecord {
    /// Build a record for freshly appended content.
    pub fn new(date: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            date: date.into(),
            digest: ContentDigest::from_bytes(content.as_bytes()),
            content,
            created_at: Utc::now(),
        }
    }
}

/// Append-only log of run reports.
#[async_trait]
pub trait ReportLog: Send + Sync {
    /// Store a report and return the new record.
    async fn append(&self, date: &str, content: &str) -> StorageResult<LogRecord>;

    /// Most recent records, newest first.
    async fn recent(&self, limit: usize) -> StorageResult<Vec<LogRecord>>;

    /// Fetch one record by id.
    async fn get(&self, id: &str) -> StorageResult<LogRecord>;
}
