// HTTP response utilities for JSON errors and file attachments
use axum::{
    body::Body,
    http::{header, HeaderValue, Response, StatusCode},
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use serde_json::json;

/// JSON error body: `{"error": "..."}`
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response<Body> {
    let message = message.into();
    if status.is_server_error() {
        tracing::error!("{}: {}", status, message);
    }
    (status, Json(json!({ "error": message }))).into_response()
}

/// Serve an exported document as a file download
pub fn attachment_response(filename: &str, contents: Bytes) -> Result<Response<Body>, StatusCode> {
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename))
        .map_err(|e| {
            tracing::error!("Invalid download filename {}: {}", filename, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_DISPOSITION, disposition)
        .header(header::CONTENT_LENGTH, contents.len())
        .header(header::CACHE_CONTROL, "no-store")
        .body(Body::from(contents))
        .map_err(|e| {
            tracing::error!("Response build error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })
}
