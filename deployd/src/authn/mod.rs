//! Manifest authentication

pub mod token_store;
