// HTTP Server modules
pub mod handlers;
pub mod routes;
pub mod sse;
pub mod state;

// Request handling
pub mod config;
pub mod error;
pub mod models;
pub mod normalizer;
pub mod payload;
pub mod relay;
pub mod session;

// LLM abstraction layer
pub mod llm;
