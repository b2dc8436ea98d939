//! Command line arguments

use std::path::PathBuf;

use clap::Parser;

use crate::logs::LogLevel;
use crate::storage::settings::Settings;

/// Self-hosted deployment trigger
#[derive(Debug, Default, Parser)]
#[command(name = "deployd", version, about)]
pub struct Cli {
    /// JSON settings file; flags below override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// API listen address, host:port
    #[arg(long)]
    pub listen: Option<String>,

    /// Deployment package pickup folder
    #[arg(long)]
    pub package_path: Option<PathBuf>,

    /// Deployment script folder
    #[arg(long)]
    pub script_path: Option<PathBuf>,

    /// Where session logs are written
    #[arg(long)]
    pub log_path: Option<PathBuf>,

    /// Tokens, one per line, for authentication
    #[arg(long)]
    pub token_file: Option<PathBuf>,

    /// Seconds an identical manifest is rejected after admission
    #[arg(long)]
    pub suppression_window_secs: Option<u64>,

    /// Seconds before a dedup entry is dropped
    #[arg(long)]
    pub eviction_window_secs: Option<u64>,

    /// Service log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<LogLevel>,

    /// Emit service logs as JSON
    #[arg(long)]
    pub log_json: bool,

    /// Directory for a daily rolling service log
    #[arg(long)]
    pub service_log_dir: Option<PathBuf>,
}

impl Cli {
    /// Apply flags on top of file settings
    pub fn apply(&self, mut settings: Settings) -> Settings {
        if let Some(listen) = &self.listen {
            settings.listen = listen.clone();
        }
        if let Some(path) = &self.package_path {
            settings.package_path = path.clone();
        }
        if let Some(path) = &self.script_path {
            settings.script_path = path.clone();
        }
        if let Some(path) = &self.log_path {
            settings.log_path = path.clone();
        }
        if let Some(path) = &self.token_file {
            settings.token_file = path.clone();
        }
        if let Some(secs) = self.suppression_window_secs {
            settings.suppression_window_secs = secs;
        }
        if let Some(secs) = self.eviction_window_secs {
            settings.eviction_window_secs = secs;
        }
        if let Some(level) = &self.log_level {
            settings.log_level = level.clone();
        }
        if self.log_json {
            settings.log_json = true;
        }
        if let Some(dir) = &self.service_log_dir {
            settings.service_log_dir = Some(dir.clone());
        }
        settings
    }
}
