//! Dedup sweep worker

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};

use crate::cache::dedup::DedupRegistry;

/// Sweeper worker options
#[derive(Debug, Clone)]
pub struct Options {
    /// Sweep interval
    pub interval: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
        }
    }
}

/// Run the sweeper worker
pub async fn run<S, F>(
    options: &Options,
    registry: Arc<DedupRegistry>,
    sleep_fn: S,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) where
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    info!("Dedup sweeper starting...");

    loop {
        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Dedup sweeper shutting down...");
                return;
            }
            _ = sleep_fn(options.interval) => {}
        }

        let removed = registry.sweep(Instant::now());
        if removed > 0 {
            debug!("Swept {} expired dedup entries, {} left", removed, registry.len());
        }
    }
}
