//! Diligent-State: SurrealDB persistence for diligent reports
//!
//! Every completed run is appended to a report log: the run timestamp, the
//! indented JSON report and its SHA-256 digest.
//!
//! ## Key Components
//!
//! - `SurrealHandle`: Manages connection and schema setup
//! - `ReportLog`: Append-only report log trait
//! - `SurrealReportLog`: SurrealDB implementation of `ReportLog`
//! - `MemoryReportLog`: In-memory implementation for tests

mod error;
pub mod fakes;
mod handle;
pub mod migrations;
pub mod storage_traits;
pub mod surreal_log;

pub use error::{StateError, StorageError};
pub use fakes::MemoryReportLog;
pub use handle::{CloudConfig, SurrealHandle, DEFAULT_LOCAL_PATH};
pub use storage_traits::{
    format_log_date, ContentDigest, LogRecord, ReportLog, StorageResult, LOG_DATE_FORMAT,
};
pub use surreal_log::SurrealReportLog;

/// Result type for diligent-state operations
pub type Result<T> = std::result::Result<T, StateError>;
