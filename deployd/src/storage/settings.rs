//! Settings file management

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::logs::LogLevel;

/// Service settings, read from an optional JSON file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Emit service logs as JSON
    #[serde(default)]
    pub log_json: bool,

    /// Directory for the rolling service log, stdout only when absent
    #[serde(default)]
    pub service_log_dir: Option<PathBuf>,

    /// Address the HTTP API listens on
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Archive pickup directory
    #[serde(default = "default_package_path")]
    pub package_path: PathBuf,

    /// Deploy script directory
    #[serde(default = "default_script_path")]
    pub script_path: PathBuf,

    /// Session log directory
    #[serde(default = "default_log_path")]
    pub log_path: PathBuf,

    /// Token file, one token per line
    #[serde(default = "default_token_file")]
    pub token_file: PathBuf,

    /// Identical manifests are rejected for this long
    #[serde(default = "default_suppression_window")]
    pub suppression_window_secs: u64,

    /// Dedup entries are dropped after this long
    #[serde(default = "default_eviction_window")]
    pub eviction_window_secs: u64,

    /// How often expired dedup entries are swept
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// Per-request timeout of the HTTP API
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Maximum delay for graceful shutdown
    #[serde(default = "default_max_shutdown_delay")]
    pub max_shutdown_delay_secs: u64,
}

fn default_listen() -> String {
    "localhost:8080".to_string()
}

fn default_package_path() -> PathBuf {
    PathBuf::from("deployment_packages")
}

fn default_script_path() -> PathBuf {
    PathBuf::from("deployment_scripts")
}

fn default_log_path() -> PathBuf {
    PathBuf::from("deployment_scripts/log")
}

fn default_token_file() -> PathBuf {
    PathBuf::from("token.txt")
}

fn default_suppression_window() -> u64 {
    10
}

fn default_eviction_window() -> u64 {
    30
}

fn default_sweep_interval() -> u64 {
    5
}

fn default_request_timeout() -> u64 {
    15
}

fn default_max_shutdown_delay() -> u64 {
    30
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_json: false,
            service_log_dir: None,
            listen: default_listen(),
            package_path: default_package_path(),
            script_path: default_script_path(),
            log_path: default_log_path(),
            token_file: default_token_file(),
            suppression_window_secs: default_suppression_window(),
            eviction_window_secs: default_eviction_window(),
            sweep_interval_secs: default_sweep_interval(),
            request_timeout_secs: default_request_timeout(),
            max_shutdown_delay_secs: default_max_shutdown_delay(),
        }
    }
}
