//! deployd library
//!
//! Deployment task engine: manifest admission with duplicate suppression,
//! per-session execution of package deploy steps, and session log storage.

pub mod app;
pub mod authn;
pub mod cache;
pub mod deploy;
pub mod errors;
pub mod filesys;
pub mod logs;
pub mod models;
pub mod server;
pub mod storage;
pub mod utils;
pub mod workers;
