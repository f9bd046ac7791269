//! Upload extraction and validation for the analysis endpoints.

use axum::extract::Multipart;
use axum::http::HeaderMap;

use crate::domain::credits::VisitorUsage;

use super::super::error::ApiError;
use super::dto::MIN_TEXT_CHARS;

/// Maximum accepted resume PDF size.
pub const MAX_PDF_BYTES: usize = 5 * 1024 * 1024;

/// Maximum accepted photo size.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

const IMAGE_MEDIA_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

/// Reads the `file` field of a resume upload and extracts its text.
pub async fn pdf_text_from_multipart(mut multipart: Multipart) -> Result<String, ApiError> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::invalid_request(format!("Malformed multipart body: {e}")))?
        .ok_or_else(|| ApiError::invalid_request("Missing file upload"))?;

    if field.name() != Some("file") {
        return Err(ApiError::invalid_request("Expected a single 'file' field"));
    }

    let bytes = field
        .bytes()
        .await
        .map_err(|e| ApiError::invalid_request(format!("Could not read upload: {e}")))?;

    if bytes.len() > MAX_PDF_BYTES {
        return Err(ApiError::invalid_request(format!(
            "PDF exceeds the {} MiB limit",
            MAX_PDF_BYTES / (1024 * 1024)
        )));
    }

    let text = pdf_extract::extract_text_from_mem(&bytes)
        .map_err(|e| {
            tracing::debug!(error = %e, "PDF text extraction failed");
            ApiError::invalid_request("Could not extract text from the PDF")
        })?
        .trim()
        .to_string();

    if text.chars().count() < MIN_TEXT_CHARS {
        return Err(ApiError::invalid_request(format!(
            "Extracted text is too short to analyze (minimum {MIN_TEXT_CHARS} characters)"
        )));
    }

    Ok(text)
}

/// Reads the `file` field of a photo upload.
///
/// Returns the declared media type and the raw bytes.
pub async fn image_from_multipart(
    mut multipart: Multipart,
) -> Result<(String, Vec<u8>), ApiError> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::invalid_request(format!("Malformed multipart body: {e}")))?
        .ok_or_else(|| ApiError::invalid_request("Missing file upload"))?;

    if field.name() != Some("file") {
        return Err(ApiError::invalid_request("Expected a single 'file' field"));
    }

    let media_type = field
        .content_type()
        .map(str::to_string)
        .ok_or_else(|| ApiError::invalid_request("Upload is missing a content type"))?;

    if !IMAGE_MEDIA_TYPES.contains(&media_type.as_str()) {
        return Err(ApiError::invalid_request(
            "Unsupported image type: use JPEG, PNG, or WebP",
        ));
    }

    let bytes = field
        .bytes()
        .await
        .map_err(|e| ApiError::invalid_request(format!("Could not read upload: {e}")))?;

    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(ApiError::invalid_request(format!(
            "Image exceeds the {} MiB limit",
            MAX_IMAGE_BYTES / (1024 * 1024)
        )));
    }

    if bytes.is_empty() {
        return Err(ApiError::invalid_request("Uploaded image is empty"));
    }

    Ok((media_type, bytes.to_vec()))
}

/// Reads the visitor usage counter from the request's Cookie header.
pub fn visitor_usage_from_headers(headers: &HeaderMap) -> VisitorUsage {
    let cookie_header = headers.get("cookie").and_then(|v| v.to_str().ok());
    VisitorUsage::from_cookie_header(cookie_header)
}

/// Validates text length for the JSON text endpoints.
pub fn validate_text_length(text: &str, max_chars: usize) -> Result<(), ApiError> {
    let chars = text.trim().chars().count();
    if chars < MIN_TEXT_CHARS {
        return Err(ApiError::invalid_request(format!(
            "Text is too short to analyze (minimum {MIN_TEXT_CHARS} characters)"
        )));
    }
    if chars > max_chars {
        return Err(ApiError::invalid_request(format!(
            "Text is too long to analyze (maximum {max_chars} characters)"
        )));
    }
    Ok(())
}
