//! Error taxonomy for the analysis pipeline.
//!
//! Command and oracle failures never escape a single check: the engine turns
//! them into a non-flagged `AnalysisItem`. Catalog errors are run-level
//! preconditions and do propagate to the caller.

use std::path::PathBuf;

/// Errors produced while talking to the judgment oracle.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    /// Network, authentication, timeout or HTTP status failure.
    #[error("oracle transport error: {0}")]
    Transport(String),

    /// The reply was not exactly the verdict JSON object.
    #[error("failed to parse oracle response: {0}")]
    Schema(String),
}

impl OracleError {
    pub fn is_transport(&self) -> bool {
        matches!(self, OracleError::Transport(_))
    }

    pub fn is_schema(&self) -> bool {
        matches!(self, OracleError::Schema(_))
    }
}

impl From<reqwest::Error> for OracleError {
    fn from(err: reqwest::Error) -> Self {
        OracleError::Transport(err.to_string())
    }
}

/// Errors produced while loading a check catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unknown operating system: {0}")]
    UnknownOs(String),
}
