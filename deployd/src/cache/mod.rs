//! In-memory caches

pub mod dedup;
