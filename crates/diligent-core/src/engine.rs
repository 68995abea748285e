//! Recursive follow-up analysis engine.
//!
//! [`AnalysisEngine::analyze`] turns a (prompt, command) pair into a tree of
//! [`AnalysisItem`]s: run the command, truncate its output, ask the oracle,
//! and chase the single follow-up the oracle proposes while the node is
//! flagged and depth remains.
//!
//! `analyze` is total. Timeouts, exec failures and oracle failures become a
//! non-flagged item whose description carries the error, so one bad check
//! never aborts a run.

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::domain::{AnalysisItem, NodeState};
use crate::obs::{
    emit_command_finished, emit_command_started, emit_follow_up_scheduled, emit_node_finished,
    emit_oracle_failed,
};
use crate::oracle::Oracle;
use crate::runner::{CommandRunner, ExecOutcome};
use crate::truncate::truncate;

/// Description used for nodes with an empty command.
pub const NO_COMMAND_DESCRIPTION: &str = "No command provided";

/// Recursion and resource limits for the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngineConfig {
    /// Deepest follow-up level below a root check (root is depth 0).
    pub max_followups: usize,

    /// Characters of command output forwarded to the oracle.
    pub max_output_chars: usize,

    /// Wall-clock limit for each command.
    pub command_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_followups: 5,
            max_output_chars: 3000,
            command_timeout: Duration::from_secs(10),
        }
    }
}

/// Build the user prompt sent to the oracle: the semantic check prompt
/// followed by the (already truncated) command output.
pub fn build_context_prompt(prompt: &str, output: &str) -> String {
    format!("{prompt}\n\nCommand output (truncated):\n{output}")
}

/// Drives Command Runner → Truncator → Oracle and recurses on follow-ups.
#[derive(Clone)]
pub struct AnalysisEngine {
    runner: Arc<dyn CommandRunner>,
    oracle: Arc<dyn Oracle>,
    config: EngineConfig,
}

impl AnalysisEngine {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        oracle: Arc<dyn Oracle>,
        config: EngineConfig,
    ) -> Self {
        Self {
            runner,
            oracle,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Analyze one command at the given depth and return its subtree.
    pub fn analyze<'a>(
        &'a self,
        prompt: &'a str,
        command: &'a str,
        depth: usize,
    ) -> BoxFuture<'a, AnalysisItem> {
        Box::pin(async move {
            let (item, state) = self.analyze_node(prompt, command, depth).await;
            emit_node_finished(depth, command, state);
            item
        })
    }

    async fn analyze_node(
        &self,
        prompt: &str,
        command: &str,
        depth: usize,
    ) -> (AnalysisItem, NodeState) {
        let mut item = AnalysisItem::new(prompt, command);

        if command.is_empty() {
            item.description = NO_COMMAND_DESCRIPTION.to_string();
            return (item, NodeState::NoCommand);
        }

        emit_command_started(depth, command);
        let executed = self.runner.run(command, self.config.command_timeout).await;

        match &executed.outcome {
            ExecOutcome::Ok => {
                emit_command_finished(depth, command, "ok", executed.duration_ms);
            }
            ExecOutcome::TimedOut => {
                emit_command_finished(depth, command, "timed_out", executed.duration_ms);
                item.description = format!(
                    "Command execution error: command execution timed out after {:?}",
                    self.config.command_timeout
                );
                return (item, NodeState::ExecFailed);
            }
            ExecOutcome::ExecError(detail) => {
                emit_command_finished(depth, command, detail, executed.duration_ms);
                item.description = format!("Command execution error: {detail}");
                if !executed.output.is_empty() {
                    item.raw_output =
                        Some(truncate(&executed.output, self.config.max_output_chars).to_string());
                }
                return (item, NodeState::ExecFailed);
            }
        }

        let output = truncate(&executed.output, self.config.max_output_chars).to_string();
        let context = build_context_prompt(prompt, &output);

        let verdict = match self.oracle.judge(&context).await {
            Ok(verdict) => verdict,
            Err(e) => {
                emit_oracle_failed(depth, command, &e);
                item.description = format!("Oracle error: {e}");
                item.raw_output = Some(output);
                return (item, NodeState::OracleFailed);
            }
        };

        item.flagged = verdict.flagged;
        item.description = verdict.description.clone();
        item.alert = verdict.alert.clone();
        item.raw_output = Some(output);

        if !item.flagged {
            return (item, NodeState::Clear);
        }

        // Exactly one follow-up is chased per level; the child's own
        // follow-ups are handled by its recursive call.
        let Some((next_prompt, next_command)) = verdict.follow_up() else {
            return (item, NodeState::FlaggedNoFollowup);
        };
        if depth >= self.config.max_followups {
            return (item, NodeState::FlaggedNoFollowup);
        }

        emit_follow_up_scheduled(depth + 1, next_command);
        let child = self.analyze(next_prompt, next_command, depth + 1).await;
        item.follow_ups.push(child);

        (item, NodeState::FlaggedWithFollowup)
    }
}
