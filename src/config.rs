//! Relay configuration
//!
//! Values come from the environment (a `.env` file is loaded first when
//! present). The API key may also come from a JSON config file shaped like
//! `{"openai": {"claude_key": "..."}}`.

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::RelayError;
use crate::llm::claude::DEFAULT_BASE_URL;

pub const DEFAULT_MODEL: &str = "claude-3-7-sonnet-latest";
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 34_000;
pub const DEFAULT_BIND: &str = "127.0.0.1:5001";
pub const DEFAULT_SESSION_TTL_SECS: u64 = 3600;
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 32 * 1024 * 1024;
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Runtime settings for the relay
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Address the HTTP server binds to
    pub bind_addr: SocketAddr,
    pub api_key: String,
    /// Messages API root (or a compatible proxy)
    pub base_url: String,
    pub model: String,
    /// `max_tokens` sent upstream on every call
    pub max_output_tokens: u32,
    pub system_prompt: Option<String>,
    /// Root directory for per-session uploads
    pub upload_dir: PathBuf,
    pub session_ttl: Duration,
    pub sweep_interval: Duration,
    /// Upper bound for a whole multipart body
    pub max_upload_bytes: u64,
}

#[derive(Debug, Deserialize)]
struct KeyFile {
    openai: KeyFileSection,
}

#[derive(Debug, Deserialize)]
struct KeyFileSection {
    claude_key: String,
}

impl RelayConfig {
    /// Load from the process environment, reading `.env` first
    pub fn from_env() -> Result<Self, RelayError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RelayError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = match get("CLAUDE_API_KEY").or_else(|| get("ANTHROPIC_API_KEY")) {
            Some(key) => key,
            None => {
                let path = get("RELAY_CONFIG_FILE").unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());
                read_key_file(Path::new(&path))?
            }
        };

        let bind_addr = get("RELAY_BIND")
            .unwrap_or_else(|| DEFAULT_BIND.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| RelayError::Config(format!("RELAY_BIND: {}", e)))?;

        let upload_dir = get("RELAY_UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join("claude_relay_uploads"));

        Ok(Self {
            bind_addr,
            api_key,
            base_url: get("ANTHROPIC_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: get("CLAUDE_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_output_tokens: parse_number(
                "CLAUDE_MAX_TOKENS",
                get("CLAUDE_MAX_TOKENS"),
                DEFAULT_MAX_OUTPUT_TOKENS,
            )?,
            system_prompt: get("RELAY_SYSTEM_PROMPT"),
            upload_dir,
            session_ttl: parse_secs(
                "RELAY_SESSION_TTL_SECS",
                get("RELAY_SESSION_TTL_SECS"),
                DEFAULT_SESSION_TTL_SECS,
            )?,
            sweep_interval: parse_secs(
                "RELAY_SWEEP_INTERVAL_SECS",
                get("RELAY_SWEEP_INTERVAL_SECS"),
                DEFAULT_SWEEP_INTERVAL_SECS,
            )?,
            max_upload_bytes: parse_number(
                "RELAY_MAX_UPLOAD_BYTES",
                get("RELAY_MAX_UPLOAD_BYTES"),
                DEFAULT_MAX_UPLOAD_BYTES,
            )?,
        })
    }
}

fn parse_number<T>(key: &str, value: Option<String>, default: T) -> Result<T, RelayError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| RelayError::Config(format!("{}={:?}: {}", key, raw, e))),
    }
}

/// Whole seconds, zero rejected
fn parse_secs(key: &str, value: Option<String>, default: u64) -> Result<Duration, RelayError> {
    match parse_number(key, value, default)? {
        0 => Err(RelayError::Config(format!("{} must be greater than zero", key))),
        secs => Ok(Duration::from_secs(secs)),
    }
}

fn read_key_file(path: &Path) -> Result<String, RelayError> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        RelayError::Config(format!(
            "no CLAUDE_API_KEY set and {} is unreadable: {}",
            path.display(),
            e
        ))
    })?;
    let parsed: KeyFile = serde_json::from_str(&raw)
        .map_err(|e| RelayError::Config(format!("{}: {}", path.display(), e)))?;
    Ok(parsed.openai.claude_key)
}
