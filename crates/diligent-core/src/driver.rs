//! Run driver: analyze every catalog check and assemble the report.

use futures::stream::{self, StreamExt};
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::domain::{AnalysisItem, Check, OsFamily, Report};
use crate::engine::AnalysisEngine;
use crate::obs::{emit_run_finished, emit_run_started, run_span};

/// Result of a complete run.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Identifier used to correlate log lines of this run.
    pub run_id: String,

    pub os: OsFamily,

    /// One root item per check, in catalog order.
    pub report: Report,

    /// Total duration in milliseconds.
    pub duration_ms: u64,
}

/// Iterates a check list and invokes the engine once per check at depth 0.
///
/// With `parallelism > 1` independent root checks run concurrently; each
/// check's own follow-up chain stays sequential and `items` keeps catalog
/// order either way.
pub struct RunDriver {
    engine: AnalysisEngine,
    parallelism: usize,
}

impl RunDriver {
    /// A strictly sequential driver.
    pub fn new(engine: AnalysisEngine) -> Self {
        Self {
            engine,
            parallelism: 1,
        }
    }

    /// Allow up to `parallelism` root checks in flight (minimum 1).
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    pub fn parallelism(&self) -> usize {
        self.parallelism
    }

    /// Analyze every check. Never fails: check failures live inside their items.
    pub async fn run(&self, os: OsFamily, checks: &[Check]) -> RunResult {
        let run_id = Uuid::new_v4().to_string();
        let span = run_span(&run_id);

        async {
            let start = Instant::now();
            emit_run_started(&run_id, os.display_name(), checks.len());

            let report = self.analyze_all(checks).await;

            let duration_ms = start.elapsed().as_millis() as u64;
            emit_run_finished(
                &run_id,
                duration_ms,
                report.items.len(),
                report.flagged_count(),
            );

            RunResult {
                run_id: run_id.clone(),
                os,
                report,
                duration_ms,
            }
        }
        .instrument(span)
        .await
    }

    /// Analyze the checks and collect the root items into a report.
    pub async fn analyze_all(&self, checks: &[Check]) -> Report {
        let items: Vec<AnalysisItem> = stream::iter(checks)
            .map(|check| self.engine.analyze(&check.prompt, &check.command, 0))
            .buffered(self.parallelism)
            .collect()
            .await;

        Report::new(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OracleError, Verdict};
    use crate::engine::EngineConfig;
    use crate::oracle::Oracle;
    use crate::runner::{CommandOutput, CommandRunner};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;

    /// Sleeps longer for earlier checks so completion order is reversed.
    struct SlowFirstRunner;

    #[async_trait]
    impl CommandRunner for SlowFirstRunner {
        async fn run(&self, command: &str, _timeout: Duration) -> CommandOutput {
            let delay: u64 = command.trim_start_matches("check-").parse().unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(50 * (4 - delay))).await;
            CommandOutput::ok(command.to_string())
        }
    }

    struct ParrotOracle;

    #[async_trait]
    impl Oracle for ParrotOracle {
        async fn judge(&self, context_prompt: &str) -> Result<Verdict, OracleError> {
            let output = context_prompt.rsplit('\n').next().unwrap_or_default();
            Ok(Verdict::clear(output))
        }
    }

    fn driver(parallelism: usize) -> RunDriver {
        let engine = AnalysisEngine::new(
            Arc::new(SlowFirstRunner),
            Arc::new(ParrotOracle),
            EngineConfig::default(),
        );
        RunDriver::new(engine).with_parallelism(parallelism)
    }

    fn checks() -> Vec<Check> {
        (0..4)
            .map(|i| Check::new(format!("check-{i}"), format!("prompt {i}")))
            .collect()
    }

    #[test]
    fn test_parallelism_minimum_is_one() {
        assert_eq!(driver(0).parallelism(), 1);
        assert_eq!(driver(3).parallelism(), 3);
    }

    #[tokio::test]
    async fn test_sequential_run_keeps_catalog_order() {
        let result = driver(1).run(OsFamily::Linux, &checks()).await;
        let descriptions: Vec<_> = result
            .report
            .items
            .iter()
            .map(|i| i.description.as_str())
            .collect();
        assert_eq!(descriptions, ["check-0", "check-1", "check-2", "check-3"]);
        assert_eq!(result.os, OsFamily::Linux);
        assert!(!result.run_id.is_empty());
    }

    #[tokio::test]
    async fn test_parallel_run_keeps_catalog_order() {
        let report = driver(4).analyze_all(&checks()).await;
        let prompts: Vec<_> = report.items.iter().map(|i| i.prompt.as_str()).collect();
        assert_eq!(prompts, ["prompt 0", "prompt 1", "prompt 2", "prompt 3"]);
    }

    #[tokio::test]
    async fn test_empty_catalog_yields_empty_report() {
        let result = driver(1).run(OsFamily::Unsupported, &[]).await;
        assert!(result.report.items.is_empty());
    }
}
