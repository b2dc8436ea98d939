//! Deployment module

pub mod engine;
pub mod runner;
pub mod steps;
