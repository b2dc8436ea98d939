//! Data models

pub mod manifest;
pub mod session;
