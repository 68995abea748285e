//! In-memory fakes for storage traits (testing and `--no-store` runs)
//!
//! `MemoryReportLog` satisfies the [`ReportLog`] contract without any
//! external dependencies.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::StorageError;
use crate::storage_traits::*;

/// In-memory report log backed by a `Vec` in append order.
#[derive(Debug, Default)]
pub struct MemoryReportLog {
    records: Mutex<Vec<LogRecord>>,
}

impl MemoryReportLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StorageResult<std::sync::MutexGuard<'_, Vec<LogRecord>>> {
        self.records
            .lock()
            .map_err(|e| StorageError::Backend(format!("lock poisoned: {e}")))
    }
}

#[async_trait]
impl ReportLog for MemoryReportLog {
    async fn append(&self, date: &str, content: &str) -> StorageResult<LogRecord> {
        let record = LogRecord::new(date, content);
        self.lock()?.push(record.clone());
        Ok(record)
    }

    async fn recent(&self, limit: usize) -> StorageResult<Vec<LogRecord>> {
        Ok(self.lock()?.iter().rev().take(limit).cloned().collect())
    }

    async fn get(&self, id: &str) -> StorageResult<LogRecord> {
        self.lock()?
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| StorageError::RecordNotFound { id: id.to_string() })
    }
}
