//! Application state management

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::info;

use crate::app::options::AppOptions;
use crate::cache::dedup::DedupRegistry;
use crate::deploy::engine::Engine;
use crate::deploy::runner::CommandRunner;
use crate::errors::DeployError;
use crate::models::session::{SessionIds, SessionTask};

/// Main application state
pub struct AppState {
    /// Deployment engine
    pub engine: Arc<Engine>,

    /// Duplicate submission registry, swept in the background
    pub dedup: Arc<DedupRegistry>,
}

impl AppState {
    /// Initialize application state
    ///
    /// Returns the queue of admitted sessions alongside the state; the
    /// session worker owns the receiving end.
    pub async fn init(
        options: &AppOptions,
        runner: Arc<dyn CommandRunner>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<SessionTask>), DeployError> {
        info!("Initializing application state...");

        options.storage.setup().await?;

        let dedup = Arc::new(DedupRegistry::new(options.dedup));
        let (engine, queue) = Engine::new(
            options.storage.clone(),
            dedup.clone(),
            runner,
            SessionIds::seeded_from_clock(),
        );

        let state = Self {
            engine: Arc::new(engine),
            dedup,
        };

        Ok((state, queue))
    }
}
