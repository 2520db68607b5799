//! Core abstractions for the upstream client

pub mod config;
pub mod error;
pub mod provider;
pub mod types;
