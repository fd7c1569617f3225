use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hallyu_core::{
    create_authenticator, create_history_system, load_config, validate_config, Authenticator,
    ContentFilter, HistoryStore, MediaCatalog, MetadataProvider, ProviderBackend, RefreshWorker,
    SqliteCatalog, SqliteHistoryStore, SyncEngine, SyncEvent, TmdbProvider,
};

use hallyu_server::api::create_router;
use hallyu_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Buffer size for sync event channel
const HISTORY_BUFFER_SIZE: usize = 1000;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("HALLYU_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Auth method: {:?}", config.auth.method);
    info!("Database path: {:?}", config.database.path);

    // Compute config hash for the history log
    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    let config_hash_short = &config_hash[..16];

    // Create authenticator
    let authenticator: Arc<dyn Authenticator> = Arc::from(
        create_authenticator(&config.auth).context("Failed to create authenticator")?,
    );
    info!("Using authenticator: {}", authenticator.method_name());

    // Create SQLite media catalog
    let catalog: Arc<dyn MediaCatalog> = Arc::new(
        SqliteCatalog::new(&config.database.path).context("Failed to create media catalog")?,
    );
    info!("Media catalog initialized");

    // Create SQLite history store
    let history_store: Arc<dyn HistoryStore> = Arc::new(
        SqliteHistoryStore::new(&config.database.path)
            .context("Failed to create history store")?,
    );
    info!("History store initialized");

    // Create history system
    let (history_handle, history_writer) =
        create_history_system(Arc::clone(&history_store), HISTORY_BUFFER_SIZE);

    // Spawn history writer task
    let writer_handle = tokio::spawn(history_writer.run());

    // Emit ServiceStarted event
    history_handle
        .emit(SyncEvent::ServiceStarted {
            version: VERSION.to_string(),
            config_hash: config_hash_short.to_string(),
        })
        .await;
    info!("Emitted ServiceStarted event");

    // Create metadata provider if configured
    let provider: Option<Arc<dyn MetadataProvider>> = match &config.provider {
        Some(provider_config) => match provider_config.backend {
            ProviderBackend::Tmdb => {
                if let Some(tmdb_config) = &provider_config.tmdb {
                    info!("Initializing TMDB metadata provider");
                    match TmdbProvider::new(tmdb_config.clone()) {
                        Ok(client) => Some(Arc::new(client)),
                        Err(e) => {
                            error!("Failed to initialize TMDB provider: {}", e);
                            None
                        }
                    }
                } else {
                    error!("TMDB backend selected but no tmdb config provided");
                    None
                }
            }
        },
        None => {
            info!("No metadata provider configured; sync endpoints will answer 503");
            None
        }
    };

    // Create content filter
    let filter = ContentFilter::new(&config.filter);

    // Create sync engine when a provider is available
    let engine: Option<Arc<SyncEngine>> = provider.map(|provider| {
        Arc::new(
            SyncEngine::new(
                Arc::clone(&catalog),
                provider,
                filter.clone(),
                config.sync.clone(),
            )
            .with_history(history_handle.clone()),
        )
    });

    // Start the refresh worker if enabled
    let refresh_worker = if config.sync.refresh.enabled {
        match &engine {
            Some(engine) => {
                info!(
                    "Starting refresh worker (interval: {}s, batch limit: {})",
                    config.sync.refresh.interval_secs, config.sync.refresh.batch_limit
                );
                let worker = RefreshWorker::new(Arc::clone(engine));
                worker.start().await;
                Some(worker)
            }
            None => {
                error!("Refresh enabled but no metadata provider configured");
                None
            }
        }
    } else {
        info!("Refresh worker disabled in config");
        None
    };

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        authenticator,
        catalog,
        history_store,
        filter,
        engine.clone(),
    ));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Stop refresh worker if running
    if let Some(ref worker) = refresh_worker {
        info!("Stopping refresh worker...");
        worker.stop().await;
        info!("Refresh worker stopped");
    }

    // Emit ServiceStopped event
    info!("Server shutting down...");
    history_handle
        .emit(SyncEvent::ServiceStopped {
            reason: "graceful_shutdown".to_string(),
        })
        .await;

    // Drop all holders of HistoryHandle so the writer's channel closes.
    // The engine holds a handle clone and the worker holds the engine,
    // so both must go. The AppState clone went into the router, which
    // axum::serve consumed and released when it returned.
    // Order matters: we emit the final event BEFORE dropping handles.
    drop(refresh_worker);
    drop(engine);
    drop(history_handle);

    // Wait for writer to finish processing remaining events
    let _ = writer_handle.await;
    info!("History writer stopped");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
