//! Error types for the deployment service

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use crate::models::manifest::sample_manifest_yaml;

/// Main error type for the deployment service
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Duplicate submission: {0}")]
    DuplicateSubmission(String),

    #[error("Token authentication failed")]
    AuthenticationFailed,

    #[error("Token load error: {0}")]
    TokenLoadError(String),

    #[error("Session log error: {0}")]
    SessionLogError(String),

    #[error("Step failed: {0}")]
    StepFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid status key: {0}")]
    InvalidKey(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Shutdown error: {0}")]
    ShutdownError(String),
}

impl DeployError {
    pub const fn error_type(&self) -> &'static str {
        match self {
            Self::IoError(_) => "io_error",
            Self::JsonError(_) => "json_error",
            Self::InvalidManifest(_) => "invalid_manifest",
            Self::UnsupportedMediaType(_) => "unsupported_media_type",
            Self::DuplicateSubmission(_) => "duplicate_submission",
            Self::AuthenticationFailed => "authentication_failed",
            Self::TokenLoadError(_) => "token_load_error",
            Self::SessionLogError(_) => "session_log_error",
            Self::StepFailed(_) => "step_failed",
            Self::NotFound(_) => "not_found",
            Self::InvalidKey(_) => "invalid_key",
            Self::ConfigError(_) => "config_error",
            Self::ServerError(_) => "server_error",
            Self::ShutdownError(_) => "shutdown_error",
        }
    }

    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidManifest(_) | Self::InvalidKey(_) => StatusCode::BAD_REQUEST,
            Self::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::DuplicateSubmission(_) => StatusCode::CONFLICT,
            Self::AuthenticationFailed => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::IoError(_)
            | Self::JsonError(_)
            | Self::TokenLoadError(_)
            | Self::SessionLogError(_)
            | Self::StepFailed(_)
            | Self::ConfigError(_)
            | Self::ServerError(_)
            | Self::ShutdownError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for DeployError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Internal details stay in the service log
        let message = match &self {
            Self::InvalidManifest(reason) => format!(
                "Parse deployment yaml error: {reason}\nsample yaml:\n{}",
                sample_manifest_yaml()
            ),
            Self::UnsupportedMediaType(_)
            | Self::DuplicateSubmission(_)
            | Self::AuthenticationFailed
            | Self::NotFound(_)
            | Self::InvalidKey(_) => self.to_string(),
            _ => {
                error!(error_type = self.error_type(), "Request failed: {}", self);
                "Internal server error".to_owned()
            }
        };

        (status, message).into_response()
    }
}
