//! Lap Clock - A board of persistent lap stopwatches
//!
//! This is the main entry point for the lap-clock application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use lap_clock::{
    config::Config,
    state::AppState,
    api::create_router,
    stopwatch::SystemClock,
    storage::{FileStore, KeyValueStore, MemoryStore},
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("lap_clock={},tower_http=info", config.log_level()))
        .init();

    info!("Starting lap-clock server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, stopwatches={}",
          config.host, config.port, config.stopwatches);

    let store: Arc<dyn KeyValueStore> = if config.memory_storage {
        info!("Using in-memory storage, state will not survive a restart");
        Arc::new(MemoryStore::new())
    } else {
        info!("Using storage file {}", config.storage_file.display());
        Arc::new(FileStore::new(&config.storage_file))
    };

    // Mount the board, restoring any saved stopwatches
    let state = Arc::new(AppState::new(
        config.port,
        config.host.clone(),
        config.stopwatches,
        store,
        Arc::new(SystemClock),
    ));

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  GET  /stopwatches                - Render every stopwatch");
    info!("  GET  /stopwatches/:id            - Render one stopwatch");
    info!("  GET  /stopwatches/:id/events     - Stream changes (SSE)");
    info!("  POST /stopwatches/:id/start      - Start the clock");
    info!("  POST /stopwatches/:id/stop       - Stop the clock");
    info!("  POST /stopwatches/:id/lap        - Record a lap");
    info!("  POST /stopwatches/:id/reset      - Reset to zero");
    info!("  GET  /status                     - Board status");
    info!("  GET  /health                     - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    state.shutdown();
    info!("Server shutdown complete");
    Ok(())
}
