// Route table
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    apply_edit, copy_export, form_events, get_form, get_self_check, health_check, list_presets,
    prepare_download, rerun_self_check, serve_download,
};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/form", get(get_form))
        .route("/form/edits", post(apply_edit))
        .route("/form/events", get(form_events))
        .route("/presets", get(list_presets))
        .route("/export/copy", post(copy_export))
        .route("/export/download", post(prepare_download))
        .route("/downloads/:filename", get(serve_download))
        .route("/self-check", get(get_self_check).post(rerun_self_check))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
