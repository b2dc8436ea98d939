//! Per-session log files
//!
//! Each session owns one append-only file named `{namespace}-{session}.log`
//! in the log directory. Lines are timestamped in UTC and flushed as they are
//! written so that output from child processes lands in order.

use std::cmp::Reverse;
use std::process::Stdio;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tracing::warn;

use crate::errors::DeployError;
use crate::filesys::dir::Dir;
use crate::models::manifest::is_valid_namespace;
use crate::models::session::Session;

/// Severity tag of a session log line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

impl Severity {
    pub fn tag(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Error => "ERROR",
        }
    }
}

/// A session log as listed for a namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    /// `{namespace}-{session}`
    pub name: String,
    pub created: DateTime<Utc>,
}

/// Session log directory
#[derive(Debug, Clone)]
pub struct LogStore {
    dir: Dir,
}

impl LogStore {
    pub fn new(dir: Dir) -> Self {
        Self { dir }
    }

    /// Create the log file of a new session
    pub async fn create(&self, session: &Session) -> Result<SessionLog, DeployError> {
        let file = self
            .dir
            .file(&log_file_name(&session.namespace, &session.id.to_string()))
            .create_new_append()
            .await
            .map_err(|e| DeployError::SessionLogError(format!("{}: {}", session, e)))?;
        Ok(SessionLog { file })
    }

    /// Sessions logged under a namespace, most recent first
    pub async fn list(&self, namespace: &str) -> Result<Vec<LogEntry>, DeployError> {
        let mut files: Vec<_> = self
            .dir
            .list_files()
            .await?
            .into_iter()
            .filter_map(|f| {
                let session = session_of(&f.name, namespace)?.to_string();
                Some((f, session))
            })
            .collect();

        files.sort_by_key(|(f, session)| {
            (
                Reverse(f.created),
                Reverse(session.parse::<i64>().ok()),
                Reverse(session.clone()),
            )
        });

        Ok(files
            .into_iter()
            .map(|(f, session)| LogEntry {
                name: format!("{}-{}", namespace, session),
                created: DateTime::<Utc>::from(f.created),
            })
            .collect())
    }

    /// Raw content of one session log
    pub async fn read(&self, namespace: &str, session: &str) -> Result<Vec<u8>, DeployError> {
        let name = log_file_name(namespace, session);
        if !is_valid_namespace(namespace) || session_of(&name, namespace).is_none() {
            return Err(DeployError::NotFound(format!("{namespace}-{session}")));
        }
        self.dir
            .file(&name)
            .read_bytes()
            .await
            .map_err(|e| match e {
                DeployError::NotFound(_) => DeployError::NotFound(format!("{namespace}-{session}")),
                other => other,
            })
    }
}

fn log_file_name(namespace: &str, session: &str) -> String {
    format!("{namespace}-{session}.log")
}

/// Session part of a log file name, if the file belongs to `namespace`
///
/// Matches `{namespace}-<word>.log` where word is ASCII alphanumerics and `_`,
/// so "foo" never claims the logs of "foobar" or "foo-bar".
fn session_of<'a>(file_name: &'a str, namespace: &str) -> Option<&'a str> {
    let session = file_name
        .strip_prefix(namespace)?
        .strip_prefix('-')?
        .strip_suffix(".log")?;
    let is_word = !session.is_empty()
        && session
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    is_word.then_some(session)
}

/// Write side of one session's log
#[derive(Debug)]
pub struct SessionLog {
    file: tokio::fs::File,
}

impl SessionLog {
    /// Append one timestamped line
    pub async fn append(&mut self, severity: Severity, message: &str) -> Result<(), DeployError> {
        let line = format_line(severity, Utc::now(), message);
        self.file.write_all(line.as_bytes()).await?;
        self.file.flush().await?;
        Ok(())
    }

    pub async fn info(&mut self, message: &str) {
        self.append_or_warn(Severity::Info, message).await;
    }

    pub async fn error(&mut self, message: &str) {
        self.append_or_warn(Severity::Error, message).await;
    }

    async fn append_or_warn(&mut self, severity: Severity, message: &str) {
        if let Err(e) = self.append(severity, message).await {
            warn!("Failed to write session log line: {}", e);
        }
    }

    /// A handle a child process can write its output through
    pub async fn stdio(&self) -> Result<Stdio, DeployError> {
        let file = self.file.try_clone().await?;
        Ok(Stdio::from(file.into_std().await))
    }
}

fn format_line(severity: Severity, at: DateTime<Utc>, message: &str) -> String {
    format!(
        "{}: {} {}\n",
        severity.tag(),
        at.format("%Y/%m/%d %H:%M:%S"),
        message.trim_end()
    )
}
