//! Server state

use std::sync::Arc;

use crate::deploy::engine::Engine;
use crate::storage::session_log::LogStore;

/// Server state shared across handlers
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub logs: Arc<LogStore>,
}

impl ServerState {
    pub fn new(engine: Arc<Engine>) -> Self {
        let logs = engine.logs();
        Self { engine, logs }
    }
}
