//! Background workers

pub mod sessions;
pub mod sweeper;
