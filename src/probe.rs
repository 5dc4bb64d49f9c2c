use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Result of a probe command execution
#[derive(Debug, Clone)]
pub struct ProbeResult {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProbeResult {
    /// Creates a probe result from a finished command
    pub fn completed(exit_code: Option<i32>, stdout: String, stderr: String) -> Self {
        Self {
            exit_code,
            stdout,
            stderr,
        }
    }

    /// Creates a probe result indicating the command could not be run
    pub fn execution_error(error_message: String) -> Self {
        Self {
            exit_code: None,
            stdout: String::new(),
            stderr: error_message,
        }
    }

    /// The observed state: trimmed stdout.
    ///
    /// A non-zero exit still yields its stdout (`systemctl is-active` exits
    /// 3 while printing `inactive`). Execution errors yield the empty string.
    pub fn state(&self) -> String {
        self.stdout.trim().to_string()
    }
}

/// Configuration for probe behavior
#[derive(Debug, Clone, Default)]
pub struct ProbeConfig {
    /// Upper bound on probe runtime. `None` waits for the command to finish.
    pub timeout: Option<Duration>,
}

/// Executes a probe command and captures its output
pub async fn execute_probe_command(command: &str, args: &[String], label: &str) -> ProbeResult {
    execute_probe_command_with_config(command, args, label, &ProbeConfig::default()).await
}

/// Executes a probe command, giving up after `config.timeout` if set
pub async fn execute_probe_command_with_config(
    command: &str,
    args: &[String],
    label: &str,
    config: &ProbeConfig,
) -> ProbeResult {
    debug!("Executing probe command for '{}': {} {:?}", label, command, args);

    let mut cmd = Command::new(command);
    cmd.args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .stdin(Stdio::null())
        .kill_on_drop(true);

    let output = match config.timeout {
        Some(timeout) => match tokio::time::timeout(timeout, cmd.output()).await {
            Ok(output) => output,
            Err(_) => {
                debug!(
                    "Probe command for '{}' timed out after {:?}: {} {:?}",
                    label, timeout, command, args
                );
                return ProbeResult::execution_error(format!(
                    "Command timed out after {}ms",
                    timeout.as_millis()
                ));
            }
        },
        None => cmd.output().await,
    };

    match output {
        Ok(output) => {
            let exit_code = output.status.code();
            let stdout = String::from_utf8_lossy(&output.stdout).to_string();
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();

            debug!(
                "Probe command for '{}' completed: exit_code={:?}, stdout={:?}",
                label,
                exit_code,
                stdout.trim()
            );
            if !stderr.is_empty() {
                debug!("Probe STDERR for '{}': {}", label, stderr.trim());
            }

            ProbeResult::completed(exit_code, stdout, stderr)
        }
        Err(e) => {
            debug!(
                "Failed to execute probe command for '{}': {} {:?} - {}",
                label, command, args, e
            );
            ProbeResult::execution_error(format!("Command execution failed: {}", e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_result_creation() {
        let success = ProbeResult::completed(Some(0), "active\n".to_string(), "".to_string());
        assert_eq!(success.exit_code, Some(0));
        assert_eq!(success.state(), "active");

        let failure = ProbeResult::completed(Some(3), "inactive\n".to_string(), "".to_string());
        assert_eq!(failure.exit_code, Some(3));
        assert_eq!(failure.state(), "inactive");

        let exec_error = ProbeResult::execution_error("command not found".to_string());
        assert_eq!(exec_error.exit_code, None);
        assert_eq!(exec_error.state(), "");
    }

    #[tokio::test]
    async fn test_execute_probe_command_success() {
        let result = execute_probe_command("echo", &["active".to_string()], "test").await;

        assert_eq!(result.exit_code, Some(0));
        assert_eq!(result.state(), "active");
    }

    #[tokio::test]
    async fn test_execute_probe_command_failure_keeps_stdout() {
        let args = vec!["-c".to_string(), "echo inactive; exit 3".to_string()];
        let result = execute_probe_command("sh", &args, "test").await;

        assert_eq!(result.exit_code, Some(3));
        assert_eq!(result.state(), "inactive");
    }

    #[tokio::test]
    async fn test_execute_probe_command_not_found() {
        let result = execute_probe_command("nonexistent_command_xyz123", &[], "test").await;

        assert_eq!(result.exit_code, None);
        assert_eq!(result.state(), "");
    }

    #[tokio::test]
    async fn test_execute_probe_command_with_timeout() {
        let config = ProbeConfig {
            timeout: Some(Duration::from_millis(100)),
        };

        let result =
            execute_probe_command_with_config("sleep", &["5".to_string()], "test", &config).await;

        assert_eq!(result.exit_code, None);
        assert!(result.stderr.contains("timed out"));
        assert_eq!(result.state(), "");
    }
}
