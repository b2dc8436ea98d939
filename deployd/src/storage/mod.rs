//! On-disk layout, settings and session logs

pub mod layout;
pub mod session_log;
pub mod settings;
