//! SurrealDB schema initialization
//!
//! Safe to call on every connection: every definition uses `IF NOT EXISTS`.

use crate::error::StateError;
use crate::Result;
use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::{debug, info};

/// Table holding one row per persisted report.
pub const REPORT_LOGS_TABLE: &str = "report_logs";

/// Initialize all diligent tables.
pub async fn init_schema(db: &Surreal<Any>) -> Result<()> {
    info!("Initializing diligent SurrealDB schema");
    init_report_logs_table(db).await?;
    info!("diligent schema initialization complete");
    Ok(())
}

/// Initialize `report_logs`
///
/// Schema:
/// ```text
/// TABLE report_logs {
///   log_id:      STRING (unique)
///   date:        STRING ("YYYY-MM-DD HH:MM:SS")
///   content:     STRING (indented JSON report)
///   digest:      STRING (sha256 hex of content, indexed)
///   created_at:  DATETIME (indexed)
/// }
/// ```
///
/// Rows are never updated or deleted by the application.
async fn init_report_logs_table(db: &Surreal<Any>) -> Result<()> {
    debug!("Initializing report_logs table");

    let sql = r#"
        DEFINE TABLE IF NOT EXISTS report_logs SCHEMAFULL;
        DEFINE FIELD IF NOT EXISTS log_id ON report_logs TYPE string;
        DEFINE FIELD IF NOT EXISTS date ON report_logs TYPE string;
        DEFINE FIELD IF NOT EXISTS content ON report_logs TYPE string;
        DEFINE FIELD IF NOT EXISTS digest ON report_logs TYPE string;
        DEFINE FIELD IF NOT EXISTS created_at ON report_logs TYPE datetime;

        DEFINE INDEX IF NOT EXISTS idx_log_id ON TABLE report_logs COLUMNS log_id UNIQUE;
        DEFINE INDEX IF NOT EXISTS idx_log_digest ON TABLE report_logs COLUMNS digest;
        DEFINE INDEX IF NOT EXISTS idx_log_created_at ON TABLE report_logs COLUMNS created_at;
    "#;

    db.query(sql)
        .await?
        .check()
        .map_err(|e| StateError::SchemaSetup(e.to_string()))?;
    info!("✓ report_logs table initialized");
    Ok(())
}
