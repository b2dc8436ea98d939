//! Session worker
//!
//! Drains the admission queue and runs each session as its own task. Sessions
//! are independent: no ordering between them, no cancellation once admitted.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::deploy::engine::Engine;
use crate::models::session::SessionTask;

/// Run the session worker
pub async fn run(
    engine: Arc<Engine>,
    mut queue: mpsc::UnboundedReceiver<SessionTask>,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) {
    info!("Session worker starting...");

    let mut sessions = JoinSet::new();

    loop {
        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Session worker shutting down...");
                break;
            }
            task = queue.recv() => {
                let Some(task) = task else {
                    info!("Session queue closed");
                    break;
                };
                debug!("Starting session {}", task.session);
                let engine = engine.clone();
                sessions.spawn(async move { engine.execute(task).await });
            }
            Some(result) = sessions.join_next(), if !sessions.is_empty() => {
                if let Err(e) = result {
                    error!("Session task failed: {}", e);
                }
            }
        }
    }

    // Every admitted session runs, including those still queued
    queue.close();
    while let Ok(task) = queue.try_recv() {
        debug!("Starting queued session {}", task.session);
        let engine = engine.clone();
        sessions.spawn(async move { engine.execute(task).await });
    }

    if !sessions.is_empty() {
        info!("Waiting for {} running session(s)...", sessions.len());
    }
    while let Some(result) = sessions.join_next().await {
        if let Err(e) = result {
            error!("Session task failed: {}", e);
        }
    }
}
