//! Diligent Core Library
//!
//! Recursive follow-up analysis engine for LLM-judged host introspection:
//! run a diagnostic command, ask an oracle whether its output is suspicious,
//! and chase the follow-up command the oracle proposes up to a bounded depth.

pub mod catalog;
pub mod domain;
pub mod driver;
pub mod engine;
pub mod obs;
pub mod oracle;
pub mod reporting;
pub mod runner;
pub mod telemetry;
pub mod truncate;

pub use catalog::{builtin_catalog, detect_os};
pub use domain::{
    parse_verdict, AnalysisItem, CatalogError, Check, NodeState, OracleError, OsChecks, OsFamily,
    Report, Verdict,
};
pub use driver::{RunDriver, RunResult};
pub use engine::{build_context_prompt, AnalysisEngine, EngineConfig, NO_COMMAND_DESCRIPTION};
pub use obs::{
    emit_command_finished, emit_command_started, emit_follow_up_scheduled, emit_node_finished,
    emit_oracle_failed, emit_report_persisted, emit_run_finished, emit_run_started, run_span,
};
pub use oracle::{system_instruction, OpenAiOracle, Oracle, OracleConfig};
pub use reporting::{
    read_report_json, render_summary_text, write_report_json, DEFAULT_REPORT_PATH,
};
pub use runner::{CommandOutput, CommandRunner, ExecOutcome, ShellRunner};
pub use telemetry::init_tracing;
pub use truncate::truncate;

/// Diligent version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
