//! Claude provider implementation
//!
//! This module provides a client for the Anthropic Messages API
//! (`POST /v1/messages` with `stream: true`), directly or through a
//! compatible proxy.

pub mod client;
pub mod mapper;
pub mod sse;
pub mod types;

// Re-export commonly used types
pub use client::{ClaudeClient, ANTHROPIC_VERSION, DEFAULT_BASE_URL};
