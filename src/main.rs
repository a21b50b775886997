//! Countdown Keeper - a persistent engine for many named countdown timers
//!
//! This is the main entry point for the countdown-keeper server.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use countdown_keeper::{
    api::create_router,
    config::Config,
    notify::ChannelSink,
    state::TimerStore,
    storage::{FileKeyValueStore, JsonGateway, MemoryKeyValueStore, PersistenceGateway},
    tasks::spawn_tick_scheduler,
    utils::{shutdown_signal, until_shutdown},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("countdown_keeper={},tower_http=info", config.log_level()))
        .init();

    info!("Starting countdown-keeper server v{}", env!("CARGO_PKG_VERSION"));

    let gateway: Arc<dyn PersistenceGateway> = if config.ephemeral {
        warn!("Running with in-memory storage, nothing will be kept after shutdown");
        Arc::new(JsonGateway::new(MemoryKeyValueStore::new()))
    } else {
        info!("Persisting timers under {}", config.data_dir.display());
        Arc::new(JsonGateway::new(FileKeyValueStore::new(&config.data_dir)))
    };

    // Load persisted timers and start the shared tick
    let notifications = ChannelSink::default();
    let store = Arc::new(TimerStore::init(gateway, Arc::new(notifications.clone())).await);
    let scheduler = spawn_tick_scheduler(Arc::clone(&store));

    let app = create_router(Arc::clone(&store), notifications);

    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  GET/POST     /timers                        - List or add timers");
    info!("  GET/PATCH    /timers/:id                    - Read or edit one timer");
    info!("  POST         /timers/:id/{{start,pause,reset}}");
    info!("  GET          /categories                    - Category summaries");
    info!("  POST         /categories/:name/{{start,pause,reset}}");
    info!("  GET          /history                       - Completed timers");
    info!("  GET/POST     /completions[/ack]             - Pending completion acknowledgment");
    info!("  GET          /events                        - Notification stream (SSE)");
    info!("  GET          /health                        - Health check");

    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                error!("Server error: {}", e);
            }
        }
        _ = until_shutdown(shutdown_signal()) => {}
    }

    // Stop ticking before the final save so nothing changes underneath it
    scheduler.stop().await;
    if let Err(e) = store.persist().await {
        error!("Final save failed: {}", e);
    }

    info!("Server shutdown complete");
    Ok(())
}
