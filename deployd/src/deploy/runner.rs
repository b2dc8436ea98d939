//! External command execution

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::errors::DeployError;
use crate::storage::session_log::SessionLog;

/// A command run on behalf of a deployment step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl StepCommand {
    pub fn new(program: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

/// Runs external commands, trait for testability
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a command to completion with its combined output written to `log`
    async fn run(&self, command: &StepCommand, log: &SessionLog) -> Result<(), DeployError>;
}

/// Runs commands as child processes
#[derive(Debug, Default, Clone)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, command: &StepCommand, log: &SessionLog) -> Result<(), DeployError> {
        debug!("Running {} {:?}", command.program, command.args);

        let stdout = log.stdio().await?;
        let stderr = log.stdio().await?;

        let status = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .status()
            .await
            .map_err(|e| {
                DeployError::StepFailed(format!("failed to run {}: {}", command.program, e))
            })?;

        if !status.success() {
            return Err(DeployError::StepFailed(format!(
                "{} exited with {}",
                command.program, status
            )));
        }
        Ok(())
    }
}
