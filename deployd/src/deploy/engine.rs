//! Deployment engine
//!
//! Admission is synchronous: validate, fingerprint, check the dedup registry,
//! allocate a session and queue it. Execution runs later on the session
//! worker and reports only through the session log.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{error, info, info_span, warn, Instrument};

use crate::authn::token_store::TokenStore;
use crate::cache::dedup::DedupRegistry;
use crate::deploy::runner::CommandRunner;
use crate::deploy::steps;
use crate::errors::DeployError;
use crate::models::manifest::{Manifest, PackageSpec};
use crate::models::session::{Session, SessionIds, SessionTask};
use crate::storage::layout::StorageLayout;
use crate::storage::session_log::{LogStore, SessionLog};

/// An admitted manifest
#[derive(Debug, Clone)]
pub struct Submission {
    pub session: Session,
    pub fingerprint: String,
}

impl Submission {
    /// Handle returned to the client, `{namespace}-{session}`
    pub fn handle(&self) -> String {
        self.session.handle()
    }
}

/// Deployment engine
pub struct Engine {
    layout: StorageLayout,
    logs: Arc<LogStore>,
    tokens: TokenStore,
    dedup: Arc<DedupRegistry>,
    ids: SessionIds,
    runner: Arc<dyn CommandRunner>,
    queue: mpsc::UnboundedSender<SessionTask>,
}

impl Engine {
    /// Create an engine and the queue its admitted sessions are pushed to
    pub fn new(
        layout: StorageLayout,
        dedup: Arc<DedupRegistry>,
        runner: Arc<dyn CommandRunner>,
        ids: SessionIds,
    ) -> (Self, mpsc::UnboundedReceiver<SessionTask>) {
        let (queue, queue_rx) = mpsc::unbounded_channel();
        let engine = Self {
            logs: Arc::new(LogStore::new(layout.logs_dir())),
            tokens: TokenStore::new(layout.tokens_file()),
            layout,
            dedup,
            ids,
            runner,
            queue,
        };
        (engine, queue_rx)
    }

    pub fn logs(&self) -> Arc<LogStore> {
        self.logs.clone()
    }

    /// Admit a manifest and queue its session
    pub fn submit(&self, manifest: Manifest) -> Result<Submission, DeployError> {
        manifest.validate()?;
        let fingerprint = manifest.fingerprint()?;

        if !self.dedup.admit(&fingerprint, Instant::now()) {
            warn!(
                namespace = manifest.resolved_namespace(),
                "Rejected duplicate submission {}", fingerprint
            );
            return Err(DeployError::DuplicateSubmission(fingerprint));
        }

        let session = Session {
            id: self.ids.allocate(),
            namespace: manifest.resolved_namespace().to_string(),
        };

        let task = SessionTask {
            session: session.clone(),
            manifest,
        };
        if self.queue.send(task).is_err() {
            self.dedup.release(&fingerprint);
            return Err(DeployError::ShutdownError(
                "session worker is not running".to_string(),
            ));
        }

        info!("Accepted deployment {} ({} ...)", session, &fingerprint[..12]);
        Ok(Submission {
            session,
            fingerprint,
        })
    }

    /// Run one session to completion
    ///
    /// Never fails: every outcome is written to the session log, or to the
    /// service log when the session log itself cannot be created.
    pub async fn execute(&self, task: SessionTask) {
        let span = info_span!(
            "session",
            session = task.session.id,
            namespace = %task.session.namespace
        );
        self.execute_inner(task).instrument(span).await
    }

    async fn execute_inner(&self, task: SessionTask) {
        let SessionTask { session, manifest } = task;

        let mut log = match self.logs.create(&session).await {
            Ok(log) => log,
            Err(e) => {
                error!("Create session log failed: {}", e);
                return;
            }
        };

        let tokens = match self.tokens.load().await {
            Ok(tokens) => tokens,
            Err(e) => {
                error!("Read token file failed: {}", e);
                log.error(&format!("Read token file failed: {}", e)).await;
                return;
            }
        };

        if tokens.is_disabled() {
            log.info("No tokens configured, authentication disabled.").await;
        } else if tokens.authenticate(&manifest.auth_token).is_err() {
            warn!("Token authentication failed");
            log.error("Token authentication failed. Quit all tasks.").await;
            return;
        } else {
            log.info("Token OK, will start tasks.").await;
        }

        for (name, package) in &manifest.deploy {
            self.deploy_package(&mut log, name, package).await;
        }

        info!("Session finished");
    }

    async fn deploy_package(&self, log: &mut SessionLog, name: &str, package: &PackageSpec) {
        if package.skip {
            log.info(&format!("Skip task {}", name)).await;
            return;
        }

        log.info(&format!("Start deploy task: {}", name)).await;

        let archive = self.layout.package_path(&package.archive);
        log.info(&format!("Step 1: Start tar decompress: {}", archive.display()))
            .await;
        match steps::unpack(self.runner.as_ref(), &archive, log).await {
            Ok(()) => log.info("Completed tar decompress.").await,
            Err(e) => {
                warn!(package = name, "Unpack failed: {}", e);
                log.error(&format!("tar decompress err: {}", e)).await;
            }
        }

        // The script runs even when unpacking failed
        let script = self.layout.script_path(&package.script);
        log.info(&format!("Step 2: Start deployment script: {}", script.display()))
            .await;
        match steps::run_script(self.runner.as_ref(), &script, log).await {
            Ok(()) => log.info("Script completed").await,
            Err(e) => {
                warn!(package = name, "Script failed: {}", e);
                log.error(&format!("Run script command err: {}", e)).await;
            }
        }

        log.info(&format!("End of deploy task {}", name)).await;
    }
}
