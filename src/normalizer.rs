// Request normalization for /stream
//
// JSON bodies, query strings and multipart forms all collapse into the same
// `StreamFields`, so equivalent inputs produce identical `GenerationRequest`s.

use bytes::{BufMut, Bytes, BytesMut};
use futures::TryStreamExt;
use pin_utils::pin_mut;
use serde_json::Value;
use std::collections::HashMap;
use warp::multipart::{FormData, Part};

use crate::error::RelayError;
use crate::models::{FileDescriptor, GenerationRequest, UploadedFile, DEFAULT_THINKING_TOKENS};

/// Extensions accepted for upload; anything else is dropped
pub const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "txt", "jpg", "jpeg", "png", "gif"];

/// Raw `/stream` fields, exactly as the client sent them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamFields {
    pub question: Option<String>,
    pub thinking: Option<String>,
    pub tokens: Option<String>,
}

impl StreamFields {
    /// Fields from URL query parameters
    pub fn from_query(params: &HashMap<String, String>) -> Self {
        let mut fields = Self::default();
        for (name, value) in params {
            fields.set(name, value.clone());
        }
        fields
    }

    /// Fields from a JSON object body; an empty body counts as `{}`
    pub fn from_json(body: &[u8]) -> Result<Self, RelayError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }

        let value: Value = serde_json::from_slice(body)
            .map_err(|e| RelayError::InvalidRequest(format!("malformed JSON body: {}", e)))?;
        let object = match value {
            Value::Object(object) => object,
            _ => {
                return Err(RelayError::InvalidRequest(
                    "JSON body must be an object".to_string(),
                ))
            }
        };

        let question = match object.get("question") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                return Err(RelayError::InvalidRequest(
                    "question must be a string".to_string(),
                ))
            }
        };

        let thinking = match object.get("thinking") {
            None | Some(Value::Null) => None,
            Some(Value::Bool(b)) => Some(b.to_string()),
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                return Err(RelayError::InvalidRequest(
                    "thinking must be a boolean".to_string(),
                ))
            }
        };

        let tokens = match object.get("tokens") {
            None | Some(Value::Null) => None,
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                return Err(RelayError::InvalidRequest(
                    "tokens must be an integer".to_string(),
                ))
            }
        };

        Ok(Self {
            question,
            thinking,
            tokens,
        })
    }

    /// Record a named text field; unknown names are ignored
    pub fn set(&mut self, name: &str, value: String) {
        match name {
            "question" => self.question = Some(value),
            "thinking" => self.thinking = Some(value),
            "tokens" => self.tokens = Some(value),
            _ => {}
        }
    }

    /// Validate and convert into a generation request
    pub fn into_request(self, files: Vec<FileDescriptor>) -> Result<GenerationRequest, RelayError> {
        let question = self
            .question
            .ok_or_else(|| RelayError::InvalidRequest("question is required".to_string()))?;

        let extended_thinking = self
            .thinking
            .as_deref()
            .map(parse_flag)
            .unwrap_or(false);

        let thinking_token_budget = match self.tokens {
            None => DEFAULT_THINKING_TOKENS,
            Some(raw) => raw.trim().parse::<u32>().map_err(|_| {
                RelayError::InvalidRequest(format!(
                    "tokens must be a non-negative integer, got {:?}",
                    raw
                ))
            })?,
        };

        Ok(GenerationRequest {
            question,
            extended_thinking,
            thinking_token_budget,
            files,
        })
    }
}

/// `"true"` in any case is true, anything else false
fn parse_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

/// MIME type for an allow-listed file name, or `None` if it is not allowed
pub fn detect_mime(file_name: &str) -> Option<mime::Mime> {
    let (_, extension) = file_name.rsplit_once('.')?;
    let extension = extension.to_ascii_lowercase();
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return None;
    }

    Some(match extension.as_str() {
        "pdf" => mime::APPLICATION_PDF,
        "txt" => mime::TEXT_PLAIN,
        "jpg" | "jpeg" => mime::IMAGE_JPEG,
        "png" => mime::IMAGE_PNG,
        "gif" => mime::IMAGE_GIF,
        _ => mime::APPLICATION_OCTET_STREAM,
    })
}

/// Last path component of a client-supplied file name
fn base_name(file_name: &str) -> &str {
    file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name)
        .trim()
}

/// Split a multipart body into text fields and allow-listed file parts
pub async fn read_multipart(form: FormData) -> Result<(StreamFields, Vec<UploadedFile>), RelayError> {
    let mut fields = StreamFields::default();
    let mut uploads = Vec::new();

    pin_mut!(form);

    while let Some(part) = form
        .try_next()
        .await
        .map_err(|e| RelayError::InvalidRequest(format!("malformed multipart body: {}", e)))?
    {
        let name = part.name().to_string();
        let file_name = part.filename().map(|f| base_name(f).to_string());
        let data = read_part(part).await?;

        match file_name {
            None => fields.set(&name, String::from_utf8_lossy(&data).into_owned()),
            Some(file_name) if file_name.is_empty() => {}
            Some(file_name) => match detect_mime(&file_name) {
                Some(mime_type) => uploads.push(UploadedFile {
                    file_name,
                    mime_type: mime_type.to_string(),
                    bytes: data,
                }),
                None => tracing::debug!(file = %file_name, "dropping upload with unsupported extension"),
            },
        }
    }

    Ok((fields, uploads))
}

async fn read_part(part: Part) -> Result<Bytes, RelayError> {
    let data = part
        .stream()
        .try_fold(BytesMut::new(), |mut acc, buf| async move {
            acc.put(buf);
            Ok(acc)
        })
        .await
        .map_err(|e| RelayError::InvalidRequest(format!("failed to read multipart part: {}", e)))?;
    Ok(data.freeze())
}
