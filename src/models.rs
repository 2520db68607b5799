// Data structures shared by the HTTP layer, the session store and the relay

use bytes::Bytes;
use serde::Serialize;
use std::path::PathBuf;

use crate::error::RelayError;
use crate::llm::MIN_THINKING_BUDGET;

/// Thinking budget used when the client sends none
pub const DEFAULT_THINKING_TOKENS: u32 = 1024;

/// A staged upload owned by one session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileDescriptor {
    /// Location on local disk
    pub path: PathBuf,
    /// Name the client uploaded the file under
    pub display_name: String,
    pub mime_type: String,
}

/// An allow-listed file part read from a multipart body, not yet on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Bytes,
}

/// One `/stream` call, after normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub question: String,
    pub extended_thinking: bool,
    pub thinking_token_budget: u32,
    /// Attached files, in upload order
    pub files: Vec<FileDescriptor>,
}

impl GenerationRequest {
    /// Check the thinking budget against what the upstream API accepts
    ///
    /// Only applies when extended thinking is on: the budget must be at least
    /// 1024 and strictly below `max_output_tokens`.
    pub fn check_thinking_budget(&self, max_output_tokens: u32) -> Result<(), RelayError> {
        if !self.extended_thinking {
            return Ok(());
        }
        if self.thinking_token_budget < MIN_THINKING_BUDGET {
            return Err(RelayError::InvalidRequest(format!(
                "tokens must be at least {} when thinking is enabled, got {}",
                MIN_THINKING_BUDGET, self.thinking_token_budget
            )));
        }
        if self.thinking_token_budget >= max_output_tokens {
            return Err(RelayError::InvalidRequest(format!(
                "tokens must be below {} when thinking is enabled, got {}",
                max_output_tokens, self.thinking_token_budget
            )));
        }
        Ok(())
    }
}

/// Body of `/clear_files`
#[derive(Debug, Clone, Serialize)]
pub struct ClearFilesResponse {
    pub status: &'static str,
}

impl ClearFilesResponse {
    pub fn success() -> Self {
        Self { status: "success" }
    }
}
