//! Duplicate submission suppression
//!
//! Manifests are keyed by content fingerprint. A fingerprint blocks new
//! submissions for the suppression window after it was admitted. Entries stay
//! in the table until the longer eviction window has passed and a sweep
//! removes them.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

/// Dedup window configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DedupWindows {
    /// A fingerprint blocks resubmission for this long
    pub suppression: Duration,

    /// Entries older than this are removed by [`DedupRegistry::sweep`]
    pub eviction: Duration,
}

impl DedupWindows {
    /// Eviction is clamped so it never runs ahead of suppression
    pub fn new(suppression: Duration, eviction: Duration) -> Self {
        Self {
            suppression,
            eviction: eviction.max(suppression),
        }
    }
}

impl Default for DedupWindows {
    fn default() -> Self {
        Self::new(Duration::from_secs(10), Duration::from_secs(30))
    }
}

/// Fingerprint table shared by every admission
pub struct DedupRegistry {
    entries: Mutex<HashMap<String, Instant>>,
    windows: DedupWindows,
}

impl DedupRegistry {
    pub fn new(windows: DedupWindows) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            windows,
        }
    }

    /// Admit a fingerprint at `now`
    ///
    /// Returns false while an earlier admission is still fresh. The check and
    /// the insert happen under one lock, so concurrent callers with the same
    /// fingerprint see exactly one admission.
    pub fn admit(&self, fingerprint: &str, now: Instant) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(admitted_at) = entries.get(fingerprint) {
            if now.saturating_duration_since(*admitted_at) < self.windows.suppression {
                return false;
            }
        }

        entries.insert(fingerprint.to_string(), now);
        true
    }

    /// Drop an admission that never produced a session
    pub fn release(&self, fingerprint: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(fingerprint);
    }

    /// Remove entries past the eviction window, returning how many were dropped
    pub fn sweep(&self, now: Instant) -> usize {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|_, admitted_at| {
            now.saturating_duration_since(*admitted_at) < self.windows.eviction
        });
        before - entries.len()
    }

    /// Get registry size
    pub fn len(&self) -> usize {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for DedupRegistry {
    fn default() -> Self {
        Self::new(DedupWindows::default())
    }
}
