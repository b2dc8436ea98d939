//! HTTP request handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use tracing::warn;

use crate::errors::DeployError;
use crate::models::manifest::{is_valid_namespace, Manifest};
use crate::server::state::ServerState;
use crate::utils::version_info;

/// Content type a manifest must be posted with
pub const MANIFEST_CONTENT_TYPE: &str = "text/x-yaml";

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Health check handler
pub async fn health_handler() -> impl IntoResponse {
    let version = version_info();
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "deployd".to_string(),
        version: version.version,
    })
}

/// Version response
#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
}

/// Version handler
pub async fn version_handler() -> impl IntoResponse {
    let version = version_info();
    Json(VersionResponse {
        version: version.version,
        git_hash: version.git_hash,
        build_time: version.build_time,
    })
}

/// Submit a deployment manifest
pub async fn deploy_handler(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    body: String,
) -> Result<impl IntoResponse, DeployError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let media_type = content_type.split(';').next().unwrap_or("").trim();
    if !media_type.eq_ignore_ascii_case(MANIFEST_CONTENT_TYPE) {
        return Err(DeployError::UnsupportedMediaType(format!(
            "requires Content-Type to be {}",
            MANIFEST_CONTENT_TYPE
        )));
    }

    let manifest = Manifest::from_yaml(&body).inspect_err(|e| {
        warn!("Rejected manifest: {}", e);
    })?;
    let submission = state.engine.submit(manifest)?;

    Ok((StatusCode::ACCEPTED, submission.handle()))
}

/// Liveness of the deploy API
pub async fn status_handler() -> &'static str {
    "OK"
}

/// Status query key, `namespace` or `namespace-session`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusKey {
    Namespace(String),
    Session { namespace: String, session: String },
}

impl StatusKey {
    /// A trailing `-<digits>` names a session, anything else is a namespace
    pub fn parse(key: &str) -> Result<Self, DeployError> {
        let status_key = match key.rsplit_once('-') {
            Some((namespace, session))
                if !namespace.is_empty()
                    && !session.is_empty()
                    && session.chars().all(|c| c.is_ascii_digit()) =>
            {
                StatusKey::Session {
                    namespace: namespace.to_string(),
                    session: session.to_string(),
                }
            }
            _ => StatusKey::Namespace(key.to_string()),
        };

        let namespace = match &status_key {
            StatusKey::Namespace(namespace) => namespace,
            StatusKey::Session { namespace, .. } => namespace,
        };
        if !is_valid_namespace(namespace) {
            return Err(DeployError::InvalidKey(key.to_string()));
        }
        Ok(status_key)
    }
}

/// Session list or raw session log
///
/// A session key with no matching log is retried as a namespace, so
/// namespaces ending in `-<digits>` can still be listed.
pub async fn session_status_handler(
    State(state): State<Arc<ServerState>>,
    Path(key): Path<String>,
) -> Result<axum::response::Response, DeployError> {
    match StatusKey::parse(&key)? {
        StatusKey::Namespace(namespace) => {
            let entries = state.logs.list(&namespace).await?;
            Ok(Json(entries).into_response())
        }
        StatusKey::Session { namespace, session } => {
            match state.logs.read(&namespace, &session).await {
                Ok(content) => Ok((
                    [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                    content,
                )
                    .into_response()),
                // `web-1` is also a valid namespace
                Err(DeployError::NotFound(missing)) => {
                    let entries = state.logs.list(&key).await?;
                    if entries.is_empty() {
                        return Err(DeployError::NotFound(missing));
                    }
                    Ok(Json(entries).into_response())
                }
                Err(e) => Err(e),
            }
        }
    }
}
