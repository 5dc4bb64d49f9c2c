use anyhow::{anyhow, Result};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::debug;

/// Output of a finished action command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs an action command to completion, ignoring its outcome.
///
/// State changes are observed through the next probe, so a failing action
/// only shows up as a state that did not move.
pub async fn run_action(command: &str, args: &[String], label: &str) {
    debug!("Running action for '{}': {} {:?}", label, command, args);

    match execute_command_with_output(command, args, label).await {
        Ok(output) if output.success() => {
            debug!("Action for '{}' finished", label);
        }
        Ok(output) => {
            debug!(
                "Action for '{}' exited with {:?}: {}",
                label,
                output.exit_code,
                output.stderr.trim()
            );
        }
        Err(e) => {
            debug!("Action for '{}' could not be run: {}", label, e);
        }
    }
}

/// Executes a command and captures all output
pub async fn execute_command_with_output(
    command: &str,
    args: &[String],
    label: &str,
) -> Result<CommandOutput> {
    debug!("Executing command for '{}': {} {:?}", label, command, args);

    let mut child = Command::new(command)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .stdin(Stdio::null())
        .spawn()
        .map_err(|e| anyhow!("failed to spawn {} {:?}: {}", command, args, e))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout of {} was not captured", command))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("stderr of {} was not captured", command))?;

    let stdout_task = tokio::spawn(collect_lines(stdout));
    let stderr_task = tokio::spawn(collect_lines(stderr));

    let status = child
        .wait()
        .await
        .map_err(|e| anyhow!("failed to wait for {}: {}", command, e))?;

    let (stdout_result, stderr_result) = tokio::join!(stdout_task, stderr_task);
    let stdout = stdout_result.unwrap_or_default();
    let stderr = stderr_result.unwrap_or_default();

    if !stdout.is_empty() {
        debug!("Command STDOUT for '{}': {}", label, stdout);
    }
    if !stderr.is_empty() {
        debug!("Command STDERR for '{}': {}", label, stderr);
    }

    Ok(CommandOutput {
        exit_code: status.code(),
        stdout,
        stderr,
    })
}

async fn collect_lines<R: AsyncRead + Unpin>(reader: R) -> String {
    let mut lines = BufReader::new(reader).lines();
    let mut output = String::new();
    while let Ok(Some(line)) = lines.next_line().await {
        if !output.is_empty() {
            output.push('\n');
        }
        output.push_str(&line);
    }
    output
}
