//! adb command runner.
//!
//! Every device action is one `adb` invocation.  The runner spawns it with
//! captured stdout/stderr, bounds it with a timeout (the child is killed on
//! drop), and turns every failure into a `BridgeError` so nothing escapes the
//! worker that called it.

use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use droidremote_proto::protocol::BridgeCommand;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("could not start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{status}: {detail}")]
    Failed { status: String, detail: String },
    #[error("timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("{0}")]
    Rejected(String),
    #[error("i/o error while waiting for adb: {0}")]
    Io(#[from] std::io::Error),
}

/// Captured output of a successful invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Seam between the scheduler and the external tool.
pub trait CommandRunner: Send + Sync + 'static {
    fn run(
        &self,
        command: &BridgeCommand,
    ) -> impl Future<Output = Result<CommandOutput, BridgeError>> + Send;
}

pub struct AdbRunner {
    program: PathBuf,
    timeout: Duration,
}

impl AdbRunner {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }
}

impl CommandRunner for AdbRunner {
    fn run(
        &self,
        command: &BridgeCommand,
    ) -> impl Future<Output = Result<CommandOutput, BridgeError>> + Send {
        let args = command.args();
        let is_connect = matches!(command, BridgeCommand::Connect { .. });
        async move {
            debug!("adb: {} {}", self.program.display(), args.join(" "));
            let child = Command::new(&self.program)
                .args(&args)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .spawn()
                .map_err(|source| BridgeError::Spawn {
                    program: self.program.display().to_string(),
                    source,
                })?;

            let output = tokio::time::timeout(self.timeout, child.wait_with_output())
                .await
                .map_err(|_| BridgeError::Timeout(self.timeout))??;

            let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

            if !output.status.success() {
                let detail = if stderr.is_empty() { &stdout } else { &stderr };
                return Err(BridgeError::Failed {
                    status: output.status.to_string(),
                    detail: first_line(detail).to_string(),
                });
            }

            if is_connect {
                if let Some(reason) = connect_rejection(&stdout) {
                    return Err(BridgeError::Rejected(reason.to_string()));
                }
            }

            Ok(CommandOutput { stdout, stderr })
        }
    }
}

/// `adb connect` exits 0 on some versions even when it could not connect; the
/// only signal is the text it prints.
pub fn connect_rejection(stdout: &str) -> Option<&str> {
    stdout.lines().map(str::trim).find(|line| {
        let lower = line.to_ascii_lowercase();
        lower.starts_with("failed to connect")
            || lower.starts_with("unable to connect")
            || lower.starts_with("cannot connect")
            || lower.contains("connection refused")
    })
}

fn first_line(s: &str) -> &str {
    s.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("no output")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_success_output_is_accepted() {
        assert_eq!(connect_rejection("connected to 192.168.1.5:5555"), None);
        assert_eq!(
            connect_rejection("already connected to 192.168.1.5:5555"),
            None
        );
    }

    #[test]
    fn connect_failure_output_is_rejected() {
        assert_eq!(
            connect_rejection(
                "* daemon started successfully\nfailed to connect to '10.0.0.9:5555': No route to host"
            ),
            Some("failed to connect to '10.0.0.9:5555': No route to host")
        );
        assert_eq!(
            connect_rejection("cannot connect to 10.0.0.9:5555: Connection refused"),
            Some("cannot connect to 10.0.0.9:5555: Connection refused")
        );
    }

    #[test]
    fn first_line_skips_blank_lines() {
        assert_eq!(first_line("\n\n  error: device offline\nmore"), "error: device offline");
        assert_eq!(first_line(""), "no output");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn missing_binary_is_a_spawn_error() {
        let runner = AdbRunner::new(
            "/nonexistent/droidremote-test/adb",
            Duration::from_secs(1),
        );
        let err = runner
            .run(&BridgeCommand::KeyEvent(
                droidremote_proto::protocol::TransportKey::Stop,
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::Spawn { .. }), "{err:?}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn nonzero_exit_is_reported_with_stderr() {
        // `sh <args>` tries to open "shell" as a script and fails.
        let runner = AdbRunner::new("sh", Duration::from_secs(5));
        let err = runner
            .run(&BridgeCommand::KeyEvent(
                droidremote_proto::protocol::TransportKey::Next,
            ))
            .await
            .unwrap_err();
        match err {
            BridgeError::Failed { detail, .. } => assert!(!detail.is_empty()),
            other => panic!("expected Failed, got {other:?}"),
        }
    }
}
