// Upstream message content built from a generation request

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::llm::ContentBlock;
use crate::models::{FileDescriptor, GenerationRequest};

/// Image types the Messages API accepts inline
const INLINE_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

/// One content block per attached file, in order, then the question
///
/// A file that cannot be read degrades to a text block carrying the error so
/// the rest of the request still goes through.
pub async fn build_content(request: &GenerationRequest) -> Vec<ContentBlock> {
    let mut blocks = Vec::with_capacity(request.files.len() + 1);

    for file in &request.files {
        match file_block(file).await {
            Some(block) => blocks.push(block),
            None => tracing::warn!(
                file = %file.display_name,
                mime = %file.mime_type,
                "omitting file with unsupported type"
            ),
        }
    }

    blocks.push(ContentBlock::Text {
        text: request.question.clone(),
    });
    blocks
}

async fn file_block(file: &FileDescriptor) -> Option<ContentBlock> {
    let mime_type = file.mime_type.as_str();

    if INLINE_IMAGE_TYPES.contains(&mime_type) {
        return Some(match tokio::fs::read(&file.path).await {
            Ok(bytes) => ContentBlock::Image {
                media_type: file.mime_type.clone(),
                data: STANDARD.encode(bytes),
            },
            Err(e) => file_error(file, "Error reading image", &e.to_string()),
        });
    }

    match mime_type {
        "text/plain" => Some(text_file_block(file).await),
        "application/pdf" => Some(pdf_file_block(file).await),
        _ => None,
    }
}

async fn text_file_block(file: &FileDescriptor) -> ContentBlock {
    let bytes = match tokio::fs::read(&file.path).await {
        Ok(bytes) => bytes,
        Err(e) => return file_error(file, "Error reading text file", &e.to_string()),
    };

    match String::from_utf8(bytes) {
        Ok(text) => ContentBlock::Text {
            text: format!("{}\n{}", file_header(file), text),
        },
        Err(e) => file_error(file, "Error reading text file", &e.to_string()),
    }
}

async fn pdf_file_block(file: &FileDescriptor) -> ContentBlock {
    let bytes = match tokio::fs::read(&file.path).await {
        Ok(bytes) => bytes,
        Err(e) => return file_error(file, "Error reading PDF", &e.to_string()),
    };

    let extracted = tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text_from_mem_by_pages(&bytes).map_err(|e| e.to_string())
    })
    .await
    .map_err(|e| e.to_string())
    .and_then(|result| result);

    match extracted {
        Ok(pages) => ContentBlock::Text {
            text: format!("{}\n{}", file_header(file), format_pdf_pages(&pages)),
        },
        Err(e) => file_error(file, "Error extracting PDF text", &e),
    }
}

/// Join page texts as `--- Page N ---` sections, N counting from 1
pub fn format_pdf_pages(pages: &[String]) -> String {
    pages
        .iter()
        .enumerate()
        .map(|(i, text)| format!("--- Page {} ---\n{}", i + 1, text.trim()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn file_header(file: &FileDescriptor) -> String {
    format!("[File: {}]", file.display_name)
}

fn file_error(file: &FileDescriptor, what: &str, reason: &str) -> ContentBlock {
    tracing::warn!(file = %file.display_name, error = %reason, "{}", what);
    ContentBlock::Text {
        text: format!("{}\n{}: {}", file_header(file), what, reason),
    }
}
