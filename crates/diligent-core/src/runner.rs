//! Shell command execution under a hard wall-clock timeout.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::debug;

/// How a command execution ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecOutcome {
    /// Exited with status 0.
    Ok,
    /// Killed after exceeding the timeout. No output is retained.
    TimedOut,
    /// Spawn failure or non-zero exit.
    ExecError(String),
}

/// Result of running one command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Captured stdout followed by stderr.
    pub output: String,

    pub outcome: ExecOutcome,

    /// Exit code, when the process exited normally.
    pub exit_code: Option<i32>,

    /// Duration in milliseconds.
    pub duration_ms: u64,
}

impl CommandOutput {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            outcome: ExecOutcome::Ok,
            exit_code: Some(0),
            duration_ms: 0,
        }
    }

    pub fn timed_out() -> Self {
        Self {
            output: String::new(),
            outcome: ExecOutcome::TimedOut,
            exit_code: None,
            duration_ms: 0,
        }
    }

    pub fn failed(detail: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            outcome: ExecOutcome::ExecError(detail.into()),
            exit_code: None,
            duration_ms: 0,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.outcome == ExecOutcome::Ok
    }
}

/// Executes a command line and reports its combined output.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &str, timeout: Duration) -> CommandOutput;
}

/// Runs commands through the platform shell (`sh -c` or `cmd /C`) so that
/// pipes and redirection in catalog entries work unmodified.
///
/// On Unix the shell leads its own process group and the whole group is
/// killed when the timeout expires.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellRunner;

impl ShellRunner {
    pub fn new() -> Self {
        Self
    }

    fn shell_command(command: &str) -> Command {
        #[cfg(windows)]
        {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(command);
            cmd
        }
        #[cfg(not(windows))]
        {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(command);
            cmd
        }
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, command: &str, timeout: Duration) -> CommandOutput {
        let start = Instant::now();

        let mut cmd = Self::shell_command(command);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        let child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                return CommandOutput {
                    duration_ms: start.elapsed().as_millis() as u64,
                    ..CommandOutput::failed(format!("failed to spawn shell: {e}"), "")
                }
            }
        };
        let pid = child.id();

        let waited = tokio::time::timeout(timeout, child.wait_with_output()).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let output = match waited {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return CommandOutput {
                    duration_ms,
                    ..CommandOutput::failed(format!("failed to collect output: {e}"), "")
                }
            }
            Err(_) => {
                kill_process_group(pid);
                debug!(command = %command, timeout_ms = timeout.as_millis() as u64, "command timed out");
                return CommandOutput {
                    duration_ms,
                    ..CommandOutput::timed_out()
                };
            }
        };

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        let exit_code = output.status.code();

        let outcome = if output.status.success() {
            ExecOutcome::Ok
        } else {
            match exit_code {
                Some(code) => ExecOutcome::ExecError(format!("exit status {code}")),
                None => ExecOutcome::ExecError("terminated by signal".to_string()),
            }
        };

        CommandOutput {
            output: combined,
            outcome,
            exit_code,
            duration_ms,
        }
    }
}

#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Some(pid) = pid else { return };
    // ESRCH just means the group already exited.
    if let Err(e) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
        debug!(pid = pid, error = %e, "killpg failed");
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_output_constructors() {
        assert!(CommandOutput::ok("x").succeeded());
        assert_eq!(CommandOutput::timed_out().outcome, ExecOutcome::TimedOut);
        assert!(CommandOutput::timed_out().output.is_empty());
        let failed = CommandOutput::failed("exit status 1", "partial");
        assert!(!failed.succeeded());
        assert_eq!(failed.output, "partial");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_simple_command() {
        let result = ShellRunner.run("echo hello", Duration::from_secs(10)).await;
        assert_eq!(result.outcome, ExecOutcome::Ok);
        assert_eq!(result.exit_code, Some(0));
        assert_eq!(result.output, "hello\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_pipes_work_through_shell() {
        let result = ShellRunner
            .run("printf 'a\\nb\\na\\n' | grep -c a", Duration::from_secs(10))
            .await;
        assert!(result.succeeded());
        assert_eq!(result.output.trim(), "2");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stderr_is_captured() {
        let result = ShellRunner
            .run("echo out; echo err 1>&2", Duration::from_secs(10))
            .await;
        assert!(result.succeeded());
        assert!(result.output.contains("out"));
        assert!(result.output.contains("err"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_failing_command() {
        let result = ShellRunner.run("echo partial; exit 3", Duration::from_secs(10)).await;
        assert_eq!(result.outcome, ExecOutcome::ExecError("exit status 3".to_string()));
        assert_eq!(result.exit_code, Some(3));
        assert_eq!(result.output, "partial\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_process_group() {
        let start = Instant::now();
        let result = ShellRunner
            .run("sleep 30 | cat; echo never", Duration::from_millis(200))
            .await;
        assert_eq!(result.outcome, ExecOutcome::TimedOut);
        assert!(result.output.is_empty());
        assert!(start.elapsed() < Duration::from_secs(10));
    }
}
