//! Subprocess runner
//!
//! Narrow seam over `tokio::process` shared by the ping fallback and the
//! discovery scanner, so both can be tested against captured output.

use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Captured output of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program args...`, failing if it cannot start or outlives `limit`
    async fn run(&self, program: &str, args: &[String], limit: Duration) -> Result<CommandOutput>;
}

/// Runs real processes
#[derive(Debug, Clone, Default)]
pub struct SystemCommandRunner;

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(&self, program: &str, args: &[String], limit: Duration) -> Result<CommandOutput> {
        let command_str = format!("{} {}", program, args.join(" "));
        debug!(command = %command_str, "Spawning process");

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to spawn '{}'", program))?;

        let mut stdout = child.stdout.take().context("stdout was not captured")?;
        let mut stderr = child.stderr.take().context("stderr was not captured")?;

        let result = timeout(limit, async {
            let mut stdout_buf = String::new();
            let mut stderr_buf = String::new();

            let (stdout_result, stderr_result, status) = tokio::join!(
                stdout.read_to_string(&mut stdout_buf),
                stderr.read_to_string(&mut stderr_buf),
                child.wait()
            );

            stdout_result.context("Failed to read stdout")?;
            stderr_result.context("Failed to read stderr")?;
            let status = status.context("Failed to wait for process")?;

            Ok::<_, anyhow::Error>(CommandOutput {
                stdout: stdout_buf,
                stderr: stderr_buf,
                exit_code: status.code(),
            })
        })
        .await;

        match result {
            Ok(output) => output,
            Err(_) => {
                warn!(command = %command_str, timeout_secs = limit.as_secs(), "Process timed out");
                let _ = child.kill().await;
                anyhow::bail!("'{}' timed out after {}s", program, limit.as_secs())
            }
        }
    }
}
