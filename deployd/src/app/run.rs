//! Main application run loop

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::app::options::{AppOptions, LifecycleOptions};
use crate::app::state::AppState;
use crate::deploy::runner::{CommandRunner, ProcessRunner};
use crate::errors::DeployError;
use crate::models::session::SessionTask;
use crate::server::serve::serve;
use crate::server::state::ServerState;
use crate::workers::{sessions, sweeper};

/// Run the deployment service until `shutdown_signal` resolves
pub async fn run(
    options: AppOptions,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), DeployError> {
    run_with_runner(options, Arc::new(ProcessRunner), shutdown_signal).await
}

/// Run the service with a specific command runner
pub async fn run_with_runner(
    options: AppOptions,
    runner: Arc<dyn CommandRunner>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), DeployError> {
    info!("Initializing deployment service...");

    // Create shutdown channel
    let (shutdown_tx, _shutdown_rx): (broadcast::Sender<()>, _) = broadcast::channel(1);
    let mut shutdown_manager = ShutdownManager::new(shutdown_tx.clone(), options.lifecycle.clone());

    if let Err(e) = init(&options, runner, shutdown_tx.clone(), &mut shutdown_manager).await {
        error!("Failed to start service: {}", e);
        shutdown_manager.shutdown().await?;
        return Err(e);
    }

    shutdown_signal.await;
    info!("Shutdown signal received, shutting down...");

    drop(shutdown_tx);
    shutdown_manager.shutdown().await
}

// =============================== INITIALIZATION ================================== //

async fn init(
    options: &AppOptions,
    runner: Arc<dyn CommandRunner>,
    shutdown_tx: broadcast::Sender<()>,
    shutdown_manager: &mut ShutdownManager,
) -> Result<Arc<AppState>, DeployError> {
    let (app_state, queue) = AppState::init(options, runner).await?;
    let app_state = Arc::new(app_state);

    init_session_worker(
        app_state.clone(),
        queue,
        shutdown_manager,
        shutdown_tx.subscribe(),
    )?;

    init_sweeper_worker(
        options.sweeper.clone(),
        app_state.clone(),
        shutdown_manager,
        shutdown_tx.subscribe(),
    )?;

    init_socket_server(
        options,
        app_state.clone(),
        shutdown_manager,
        shutdown_tx.subscribe(),
    )
    .await?;

    Ok(app_state)
}

fn init_session_worker(
    app_state: Arc<AppState>,
    queue: mpsc::UnboundedReceiver<SessionTask>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DeployError> {
    info!("Initializing session worker...");

    let engine = app_state.engine.clone();

    let session_handle = tokio::spawn(async move {
        sessions::run(
            engine,
            queue,
            Box::pin(async move {
                let _ = shutdown_rx.recv().await;
            }),
        )
        .await;
    });

    shutdown_manager.with_session_worker_handle(session_handle)
}

fn init_sweeper_worker(
    options: sweeper::Options,
    app_state: Arc<AppState>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DeployError> {
    info!("Initializing dedup sweeper...");

    let dedup = app_state.dedup.clone();

    let sweeper_handle = tokio::spawn(async move {
        sweeper::run(
            &options,
            dedup,
            tokio::time::sleep,
            Box::pin(async move {
                let _ = shutdown_rx.recv().await;
            }),
        )
        .await;
    });

    shutdown_manager.with_sweeper_worker_handle(sweeper_handle)
}

async fn init_socket_server(
    options: &AppOptions,
    app_state: Arc<AppState>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DeployError> {
    info!("Initializing HTTP server...");

    let server_state = ServerState::new(app_state.engine.clone());

    let server_handle = serve(&options.server, Arc::new(server_state), async move {
        let _ = shutdown_rx.recv().await;
    })
    .await?;

    shutdown_manager.with_socket_server_handle(server_handle)
}

// ================================= SHUTDOWN ===================================== //

struct ShutdownManager {
    shutdown_tx: broadcast::Sender<()>,
    lifecycle_options: LifecycleOptions,
    socket_server_handle: Option<JoinHandle<Result<(), DeployError>>>,
    session_worker_handle: Option<JoinHandle<()>>,
    sweeper_worker_handle: Option<JoinHandle<()>>,
}

impl ShutdownManager {
    pub fn new(shutdown_tx: broadcast::Sender<()>, lifecycle_options: LifecycleOptions) -> Self {
        Self {
            shutdown_tx,
            lifecycle_options,
            socket_server_handle: None,
            session_worker_handle: None,
            sweeper_worker_handle: None,
        }
    }

    pub fn with_session_worker_handle(&mut self, handle: JoinHandle<()>) -> Result<(), DeployError> {
        if self.session_worker_handle.is_some() {
            return Err(DeployError::ShutdownError("session_worker_handle already set".to_string()));
        }
        self.session_worker_handle = Some(handle);
        Ok(())
    }

    pub fn with_sweeper_worker_handle(&mut self, handle: JoinHandle<()>) -> Result<(), DeployError> {
        if self.sweeper_worker_handle.is_some() {
            return Err(DeployError::ShutdownError("sweeper_handle already set".to_string()));
        }
        self.sweeper_worker_handle = Some(handle);
        Ok(())
    }

    pub fn with_socket_server_handle(
        &mut self,
        handle: JoinHandle<Result<(), DeployError>>,
    ) -> Result<(), DeployError> {
        if self.socket_server_handle.is_some() {
            return Err(DeployError::ShutdownError("server_handle already set".to_string()));
        }
        self.socket_server_handle = Some(handle);
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<(), DeployError> {
        let _ = self.shutdown_tx.send(());

        match tokio::time::timeout(
            self.lifecycle_options.max_shutdown_delay,
            self.shutdown_impl(),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                error!(
                    "Shutdown timed out after {:?}, forcing shutdown...",
                    self.lifecycle_options.max_shutdown_delay
                );
                std::process::exit(1);
            }
        }
    }

    async fn shutdown_impl(&mut self) -> Result<(), DeployError> {
        info!("Shutting down deployment service...");

        // 1. Socket server, so no new submissions arrive
        if let Some(handle) = self.socket_server_handle.take() {
            handle.await.map_err(|e| DeployError::ShutdownError(e.to_string()))??;
        }

        // 2. Dedup sweeper
        if let Some(handle) = self.sweeper_worker_handle.take() {
            handle.await.map_err(|e| DeployError::ShutdownError(e.to_string()))?;
        }

        // 3. Session worker, waits for running sessions
        if let Some(handle) = self.session_worker_handle.take() {
            handle.await.map_err(|e| DeployError::ShutdownError(e.to_string()))?;
        }

        info!("Shutdown complete");
        Ok(())
    }
}
