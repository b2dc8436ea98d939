//! Package deployment steps

use std::path::Path;

use crate::deploy::runner::{CommandRunner, StepCommand};
use crate::errors::DeployError;
use crate::storage::session_log::SessionLog;

/// Step 1: extract an archive next to itself
pub fn unpack_command(archive: &Path) -> StepCommand {
    let target = archive.parent().unwrap_or_else(|| Path::new("."));
    StepCommand::new(
        "tar",
        [
            "-xf".to_string(),
            archive.display().to_string(),
            "-C".to_string(),
            target.display().to_string(),
        ],
    )
}

/// Step 2: run a deploy script with `sh`
pub fn script_command(script: &Path) -> StepCommand {
    StepCommand::new("sh", [script.display().to_string()])
}

pub async fn unpack(
    runner: &dyn CommandRunner,
    archive: &Path,
    log: &SessionLog,
) -> Result<(), DeployError> {
    runner.run(&unpack_command(archive), log).await
}

pub async fn run_script(
    runner: &dyn CommandRunner,
    script: &Path,
    log: &SessionLog,
) -> Result<(), DeployError> {
    runner.run(&script_command(script), log).await
}
