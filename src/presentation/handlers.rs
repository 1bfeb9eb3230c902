// HTTP request handlers
use crate::application::form_service::FormSnapshot;
use crate::application::platform::ExportError;
use crate::application::self_check::SelfCheckSummary;
use crate::domain::form::{FormEdit, Preset};
use crate::infrastructure::event_stream::sse_from_receiver;
use crate::infrastructure::http_response::{attachment_response, error_response};
use crate::presentation::app_state::AppState;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{Response, StatusCode},
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use std::sync::Arc;

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Current form revision with its recomputed export view
pub async fn get_form(State(state): State<Arc<AppState>>) -> Json<FormSnapshot> {
    Json(state.form_service.snapshot().as_ref().clone())
}

/// Apply one edit to the form
pub async fn apply_edit(
    State(state): State<Arc<AppState>>,
    Json(edit): Json<FormEdit>,
) -> Response<Body> {
    match state.form_service.apply(edit) {
        Ok(snapshot) => Json(snapshot.as_ref().clone()).into_response(),
        Err(e) => error_response(StatusCode::NOT_FOUND, e.to_string()),
    }
}

/// Stream a snapshot per form revision
pub async fn form_events(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    tracing::debug!("Form event subscriber connected");
    sse_from_receiver(state.form_service.subscribe())
}

pub async fn list_presets(State(state): State<Arc<AppState>>) -> Json<Vec<Preset>> {
    Json(state.form_service.presets().to_vec())
}

/// Copy the current payload to the clipboard
pub async fn copy_export(State(state): State<Arc<AppState>>) -> Response<Body> {
    let snapshot = state.form_service.snapshot();
    match state.export_service.copy(&snapshot).await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => export_error_response(e),
    }
}

/// Stage the current payload for download
pub async fn prepare_download(State(state): State<Arc<AppState>>) -> Response<Body> {
    let snapshot = state.form_service.snapshot();
    match state.export_service.prepare_download(&snapshot).await {
        Ok(offer) => Json(offer).into_response(),
        Err(e) => export_error_response(e),
    }
}

/// Serve a staged download until the form moves on
pub async fn serve_download(
    Path(filename): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response<Body> {
    let Some(path) = state.export_service.staged_path(&filename) else {
        return error_response(StatusCode::NOT_FOUND, "Download expired, prepare it again");
    };

    match tokio::fs::read(&path).await {
        Ok(contents) => match attachment_response(&filename, Bytes::from(contents)) {
            Ok(response) => response,
            Err(status) => status.into_response(),
        },
        Err(e) => {
            // released between lookup and read
            tracing::debug!("Staged download {} unavailable: {}", path.display(), e);
            error_response(StatusCode::NOT_FOUND, "Download expired, prepare it again")
        }
    }
}

pub async fn get_self_check(State(state): State<Arc<AppState>>) -> Json<SelfCheckSummary> {
    Json(state.self_check.last())
}

pub async fn rerun_self_check(State(state): State<Arc<AppState>>) -> Json<SelfCheckSummary> {
    Json(state.self_check.rerun())
}

fn export_error_response(e: ExportError) -> Response<Body> {
    let status = match e {
        ExportError::NotReady | ExportError::Superseded => StatusCode::CONFLICT,
        ExportError::Unavailable | ExportError::Strategy { .. } => StatusCode::SERVICE_UNAVAILABLE,
        ExportError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, e.to_string())
}
