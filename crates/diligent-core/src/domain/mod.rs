//! Domain models for Diligent.
//!
//! Canonical definitions for the core entities:
//! - `Check`: a static (command, prompt) diagnostic
//! - `Verdict`: the oracle's structured judgment
//! - `AnalysisItem`: one node in the recursive result tree
//! - `Report`: the root items of one run

pub mod analysis;
pub mod check;
pub mod error;
pub mod verdict;

// Re-export main types and errors
pub use analysis::{AnalysisItem, NodeState, Report};
pub use check::{Check, OsChecks, OsFamily};
pub use error::{CatalogError, OracleError};
pub use verdict::{parse_verdict, Verdict};
