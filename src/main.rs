// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use tracing_subscriber::EnvFilter;

use crate::application::export_service::{release_superseded_downloads, ExportService};
use crate::application::form_service::FormService;
use crate::application::platform::{ClipboardService, FileSaveService};
use crate::application::self_check::SelfCheckService;
use crate::infrastructure::clipboard::CommandClipboard;
use crate::infrastructure::config::load_app_config;
use crate::infrastructure::download::{DataUriSaver, StagingDirSaver};
use crate::presentation::app_state::AppState;
use crate::presentation::router::build_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let app_config = load_app_config()?;

    // Runs the builder regression cases once before serving
    let self_check = SelfCheckService::new();

    // Platform collaborators, tried in order
    let clipboards: Vec<Arc<dyn ClipboardService>> = app_config
        .clipboard
        .commands
        .iter()
        .filter_map(|command| CommandClipboard::from_command(command))
        .map(|clipboard| Arc::new(clipboard) as Arc<dyn ClipboardService>)
        .collect();
    let savers: Vec<Arc<dyn FileSaveService>> = vec![
        Arc::new(StagingDirSaver::new(&app_config.export.staging_dir)),
        Arc::new(DataUriSaver),
    ];

    // Create services (application layer)
    let form_service = FormService::new(
        &app_config.form.default_system_id,
        app_config.presets.clone(),
        &app_config.export.filename_template,
    );
    let export_service = Arc::new(ExportService::new(clipboards, savers));

    tokio::spawn(release_superseded_downloads(
        form_service.subscribe(),
        export_service.clone(),
    ));

    // Create application state
    let state = Arc::new(AppState {
        form_service,
        export_service: export_service.clone(),
        self_check,
    });

    // Build router (presentation layer)
    let router = build_router(state);

    // Start server
    let addr: SocketAddr = app_config.server.bind.parse()?;
    tracing::info!("Starting setpoint exporter on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    export_service.release_staged();
    tracing::info!("Setpoint exporter stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
