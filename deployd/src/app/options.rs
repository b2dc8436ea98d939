//! Application configuration options

use std::path::PathBuf;
use std::time::Duration;

use crate::cache::dedup::DedupWindows;
use crate::storage::layout::StorageLayout;
use crate::storage::settings::Settings;
use crate::workers::sweeper;

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Lifecycle configuration
    pub lifecycle: LifecycleOptions,

    /// Storage configuration
    pub storage: StorageLayout,

    /// Server configuration
    pub server: ServerOptions,

    /// Duplicate submission windows
    pub dedup: DedupWindows,

    /// Dedup sweeper options
    pub sweeper: sweeper::Options,
}

impl AppOptions {
    /// Resolve settings into options, relative paths anchored at `base_dir`
    pub fn from_settings(settings: &Settings, base_dir: impl Into<PathBuf>) -> Self {
        let mut storage = StorageLayout::new(base_dir);
        storage.package_dir = settings.package_path.clone();
        storage.script_dir = settings.script_path.clone();
        storage.log_dir = settings.log_path.clone();
        storage.token_file = settings.token_file.clone();

        Self {
            lifecycle: LifecycleOptions {
                max_shutdown_delay: Duration::from_secs(settings.max_shutdown_delay_secs),
            },
            storage,
            server: ServerOptions {
                listen: settings.listen.clone(),
                request_timeout: Duration::from_secs(settings.request_timeout_secs),
            },
            dedup: DedupWindows::new(
                Duration::from_secs(settings.suppression_window_secs),
                Duration::from_secs(settings.eviction_window_secs),
            ),
            sweeper: sweeper::Options {
                interval: Duration::from_secs(settings.sweep_interval_secs.max(1)),
            },
        }
    }
}

/// Lifecycle options for the service
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// Maximum delay for graceful shutdown, running sessions included
    pub max_shutdown_delay: Duration,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            max_shutdown_delay: Duration::from_secs(30),
        }
    }
}

/// HTTP server options
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Address to listen on, `host:port`
    pub listen: String,

    /// Timeout applied to each request
    pub request_timeout: Duration,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            listen: "localhost:8080".to_string(),
            request_timeout: Duration::from_secs(15),
        }
    }
}
