//! deployd - Entry Point
//!
//! Accepts deployment manifests over HTTP, unpacks their archives and runs
//! their deploy scripts, keeping one log per deployment session.

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use deployd::app::cli::Cli;
use deployd::app::options::AppOptions;
use deployd::app::run::run;
use deployd::filesys::file::File;
use deployd::logs::{init_logging, LogOptions};
use deployd::storage::settings::Settings;
use deployd::utils::{executable_dir, version_info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Retrieve the settings file
    let settings = match &cli.config {
        Some(path) => File::new(path)
            .read_json::<Settings>()
            .await
            .with_context(|| format!("unable to read settings file {}", path.display()))?,
        None => Settings::default(),
    };
    let settings = cli.apply(settings);

    // Initialize logging
    let log_options = LogOptions {
        log_level: settings.log_level.clone(),
        log_dir: settings.service_log_dir.clone(),
        json_format: settings.log_json,
        ..Default::default()
    };
    let _log_guard = init_logging(log_options).context("failed to initialize logging")?;

    let base_dir = executable_dir().context("unable to locate the executable directory")?;
    let options = AppOptions::from_settings(&settings, base_dir);

    let version = version_info();
    info!(
        version = %version.version,
        git_hash = %version.git_hash,
        "Running deployd with options: {:?}",
        options
    );

    if let Err(e) = run(options, await_shutdown_signal()).await {
        error!("Failed to run deployd: {e}");
        return Err(e.into());
    }
    Ok(())
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let (mut sigterm, mut sigint) = match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
            _ => {
                error!("Failed to install signal handlers, falling back to Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("Ctrl+C received, shutting down...");
    }
}
