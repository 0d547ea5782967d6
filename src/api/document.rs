//! Document generation endpoint.

use axum::extract::State;
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};

use crate::errors::AppError;
use crate::AppState;

/// POST /api/document - Render the working record as a PDF download.
///
/// Also stores a snapshot of the record in the history when it has a servant
/// name and a departure date.
pub async fn generate_document(State(state): State<AppState>) -> Result<Response, AppError> {
    let document = state.store.generate_document().await?;

    let disposition = HeaderValue::from_str(&content_disposition(&document.filename))
        .map_err(|e| AppError::Internal(format!("Invalid download filename: {}", e)))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document.bytes,
    )
        .into_response())
}

/// `attachment` disposition with an ASCII `filename` and a UTF-8 `filename*`.
pub fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if fallback == filename {
        format!("attachment; filename=\"{}\"", fallback)
    } else {
        format!(
            "attachment; filename=\"{}\"; filename*=UTF-8''{}",
            fallback,
            urlencoding::encode(filename)
        )
    }
}
