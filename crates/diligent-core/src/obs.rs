//! Structured observability hooks for the analysis lifecycle.
//!
//! This module provides:
//! - Run-scoped tracing spans via `run_span`
//! - Emission functions for key lifecycle events: run start/finish, command
//!   execution, oracle failure, follow-up scheduling, node completion, and
//!   report persistence
//!
//! Events are emitted at `info!` level unless noted (filter with `RUST_LOG`).

use tracing::{debug, info, warn};

use crate::domain::NodeState;

/// Span tagging every event of one run with its run_id.
///
/// Attach it to the run future with `tracing::Instrument`:
///
/// ```ignore
/// driver.run(os, checks).instrument(run_span("run-12345")).await;
/// ```
pub fn run_span(run_id: &str) -> tracing::Span {
    tracing::info_span!("diligent.run", run_id = %run_id)
}

/// Emit event: run started for an OS with the given number of checks.
pub fn emit_run_started(run_id: &str, os: &str, checks: usize) {
    info!(event = "run.started", run_id = %run_id, os = %os, checks = checks);
}

/// Emit event: run finished with duration and finding counts.
pub fn emit_run_finished(run_id: &str, duration_ms: u64, items: usize, flagged: usize) {
    info!(
        event = "run.finished",
        run_id = %run_id,
        duration_ms = duration_ms,
        items = items,
        flagged = flagged,
    );
}

/// Emit event: a command is about to run at the given follow-up depth.
pub fn emit_command_started(depth: usize, command: &str) {
    info!(event = "command.started", depth = depth, command = %command);
}

/// Emit event: a command finished (outcome is `ok`, `timed_out` or the error detail).
pub fn emit_command_finished(depth: usize, command: &str, outcome: &str, duration_ms: u64) {
    info!(
        event = "command.finished",
        depth = depth,
        command = %command,
        outcome = %outcome,
        duration_ms = duration_ms,
    );
}

/// Emit event: oracle call failed (warning level).
pub fn emit_oracle_failed(depth: usize, command: &str, error: &dyn std::fmt::Display) {
    warn!(event = "oracle.failed", depth = depth, command = %command, error = %error);
}

/// Emit event: a follow-up command was accepted by the recursion gate.
pub fn emit_follow_up_scheduled(depth: usize, command: &str) {
    info!(event = "follow_up.scheduled", depth = depth, command = %command);
}

/// Emit event: a node reached its terminal state (debug level).
pub fn emit_node_finished(depth: usize, command: &str, state: NodeState) {
    debug!(
        event = "node.finished",
        depth = depth,
        command = %command,
        state = state.as_str(),
    );
}

/// Emit event: the report was handed to a sink.
pub fn emit_report_persisted(sink: &str, location: &str) {
    info!(event = "report.persisted", sink = %sink, location = %location);
}
