pub mod api;
pub mod config;
pub mod core_state;
pub mod models;
pub mod pipeline;
pub mod tasks;

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Start the API server with configuration from the environment and serve
/// until Ctrl-C.
pub async fn run() -> Result<(), api::ServerError> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("FinSight starting v{}", config::APP_VERSION);

    let config = config::AppConfig::from_env();
    tracing::info!(
        model = %config.model,
        api_base = %config.api_base,
        upload_dir = %config.upload_dir.display(),
        max_file_size_mb = config.max_file_size_mb,
        llm_configured = config.llm_configured(),
        "Configuration loaded"
    );

    tasks::cleanup_orphaned_uploads(&config.upload_dir);
    if let Err(e) = std::fs::create_dir_all(&config.upload_dir) {
        tracing::warn!(error = %e, "Could not create upload directory, will retry on upload");
    }

    let bind_addr = config.bind_addr;
    let core = Arc::new(core_state::CoreState::new(config));
    let mut server = api::start_api_server(core, bind_addr).await?;
    tracing::info!(addr = %server.info.server_addr, "Listening");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C, shutting down");
    }
    server.shutdown();
    server.stopped().await;
    Ok(())
}
