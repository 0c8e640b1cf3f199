use crate::error::{AgentError, Result};
use std::fmt;
use std::future::Future;
use std::process::Stdio;
use std::sync::Mutex;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// A fully resolved external command, e.g. `snapctl restart microk8s.daemon-kubelite`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ControlCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Executes control commands on behalf of the dispatcher.
///
/// Retry and failure reporting are the runner's business; the dispatcher
/// only hands over the command and the cancellation token.
pub trait CommandRunner: Send + Sync {
    fn run(
        &self,
        cancel: &CancellationToken,
        command: &ControlCommand,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Spawns the command as a child process and waits for it to exit.
///
/// Cancelling the token kills the child.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    async fn run(&self, cancel: &CancellationToken, command: &ControlCommand) -> Result<()> {
        let text = command.to_string();
        debug!("Running command: {}", text);

        let child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| AgentError::CommandSpawn {
                command: text.clone(),
                source,
            })?;

        let output = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!("Command cancelled: {}", text);
                return Err(AgentError::Cancelled { command: text });
            }
            output = child.wait_with_output() => output.map_err(|source| AgentError::CommandSpawn {
                command: text.clone(),
                source,
            })?,
        };

        debug!(
            "Command finished with exit code: {:?}",
            output.status.code()
        );

        if !output.status.success() {
            return Err(AgentError::CommandFailed {
                command: text,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

/// Records command lines instead of running them.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    commands: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records like `new` but reports every command as failed.
    pub fn failing() -> Self {
        Self {
            commands: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands
            .lock()
            .expect("RecordingRunner lock poisoned")
            .clone()
    }

    pub fn last(&self) -> Option<String> {
        self.commands
            .lock()
            .expect("RecordingRunner lock poisoned")
            .last()
            .cloned()
    }
}

impl CommandRunner for RecordingRunner {
    async fn run(&self, _cancel: &CancellationToken, command: &ControlCommand) -> Result<()> {
        let text = command.to_string();
        self.commands
            .lock()
            .expect("RecordingRunner lock poisoned")
            .push(text.clone());

        if self.fail {
            return Err(AgentError::CommandSpawn {
                command: text,
                source: std::io::Error::other("recording runner configured to fail"),
            });
        }
        Ok(())
    }
}
