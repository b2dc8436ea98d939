//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::mpsc;

use deployd::cache::dedup::{DedupRegistry, DedupWindows};
use deployd::deploy::engine::Engine;
use deployd::deploy::runner::{CommandRunner, StepCommand};
use deployd::errors::DeployError;
use deployd::models::manifest::{Manifest, PackageSpec};
use deployd::models::session::{SessionIds, SessionTask};
use deployd::storage::layout::StorageLayout;
use deployd::storage::session_log::SessionLog;

/// Records commands instead of running them
#[derive(Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<StepCommand>>,
    failing_program: Option<String>,
}

impl RecordingRunner {
    pub fn failing(program: &str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failing_program: Some(program.to_string()),
        }
    }

    pub fn calls(&self) -> Vec<StepCommand> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, command: &StepCommand, _log: &SessionLog) -> Result<(), DeployError> {
        self.calls.lock().unwrap().push(command.clone());
        if self.failing_program.as_deref() == Some(command.program.as_str()) {
            return Err(DeployError::StepFailed(format!(
                "{} exited with exit status: 2",
                command.program
            )));
        }
        Ok(())
    }
}

pub struct Fixture {
    pub dir: TempDir,
    pub layout: StorageLayout,
    pub engine: Arc<Engine>,
    pub queue: mpsc::UnboundedReceiver<SessionTask>,
}

impl Fixture {
    /// Engine over a scratch directory; `tokens` is the token file content
    pub fn new(
        tokens: Option<&str>,
        windows: DedupWindows,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let layout = StorageLayout::new(dir.path());
        std::fs::create_dir_all(layout.logs_dir().path()).unwrap();
        if let Some(tokens) = tokens {
            std::fs::write(layout.tokens_file().path(), tokens).unwrap();
        }

        let (engine, queue) = Engine::new(
            layout.clone(),
            Arc::new(DedupRegistry::new(windows)),
            runner,
            SessionIds::starting_at(10000),
        );

        Self {
            dir,
            layout,
            engine: Arc::new(engine),
            queue,
        }
    }

    pub fn with_runner(tokens: Option<&str>, runner: Arc<dyn CommandRunner>) -> Self {
        Self::new(tokens, default_windows(), runner)
    }

    /// Execute the next queued session inline
    pub async fn execute_next(&mut self) {
        let task = self.queue.try_recv().expect("no queued session");
        self.engine.execute(task).await;
    }

    pub async fn read_log(&self, namespace: &str, id: i64) -> String {
        let bytes = self
            .engine
            .logs()
            .read(namespace, &id.to_string())
            .await
            .unwrap();
        String::from_utf8(bytes).unwrap()
    }

    pub fn log_file_count(&self) -> usize {
        std::fs::read_dir(self.layout.logs_dir().path())
            .unwrap()
            .count()
    }
}

pub fn default_windows() -> DedupWindows {
    DedupWindows::new(Duration::from_secs(10), Duration::from_secs(30))
}

/// Build a manifest from `(name, archive, script, skip)` tuples
pub fn manifest(namespace: &str, token: &str, packages: &[(&str, &str, &str, bool)]) -> Manifest {
    let deploy: BTreeMap<String, PackageSpec> = packages
        .iter()
        .map(|(name, archive, script, skip)| {
            (
                name.to_string(),
                PackageSpec {
                    archive: archive.to_string(),
                    script: script.to_string(),
                    skip: *skip,
                },
            )
        })
        .collect();
    Manifest {
        namespace: namespace.to_string(),
        auth_token: token.to_string(),
        deploy,
    }
}

pub fn count_lines(log: &str, needle: &str) -> usize {
    log.lines().filter(|line| line.contains(needle)).count()
}
