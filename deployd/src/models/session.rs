//! Deployment sessions

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::models::manifest::Manifest;

/// One execution of a manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: i64,
    pub namespace: String,
}

impl Session {
    /// Caller-visible handle, also the log file stem
    pub fn handle(&self) -> String {
        format!("{}-{}", self.namespace, self.id)
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.namespace, self.id)
    }
}

/// Work item handed from admission to the session worker
#[derive(Debug, Clone)]
pub struct SessionTask {
    pub session: Session,
    pub manifest: Manifest,
}

/// Allocates session IDs
///
/// IDs are unique within the process. Seeding from the wall clock keeps them
/// from colliding with log files left by an earlier run.
#[derive(Debug)]
pub struct SessionIds {
    next: AtomicI64,
}

impl SessionIds {
    pub fn starting_at(first: i64) -> Self {
        Self {
            next: AtomicI64::new(first),
        }
    }

    pub fn seeded_from_clock() -> Self {
        Self::starting_at(chrono::Utc::now().timestamp_millis())
    }

    pub fn allocate(&self) -> i64 {
        self.next.fetch_add(1, Ordering::SeqCst)
    }
}

impl Default for SessionIds {
    fn default() -> Self {
        Self::seeded_from_clock()
    }
}
