use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fotopainter_core::{
    create_audit_system, load_config, validate_config, ArtworkStore, AuditEvent, AuditStore,
    BlobStore, FsBlobStore, IngestionGate, JobOrchestrator, JobStore, OrderLedger, OrderStore,
    SqliteArtworkStore, SqliteAuditStore, SqliteJobStore, SqliteOrderStore,
};

use fotopainter_server::api::create_router;
use fotopainter_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

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
    let config_path = std::env::var("FOTOPAINTER_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Database path: {:?}", config.database.path);
    info!("Blob storage root: {:?}", config.storage.root);

    // Compute config hash for audit
    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    let config_hash_short = &config_hash[..16];

    // Create stores
    let artworks: Arc<dyn ArtworkStore> = Arc::new(
        SqliteArtworkStore::new(&config.database.path)
            .context("Failed to create artwork store")?,
    );
    info!("Artwork store initialized");

    let jobs: Arc<dyn JobStore> = Arc::new(
        SqliteJobStore::new(&config.database.path).context("Failed to create job store")?,
    );
    info!("Job store initialized");

    let orders: Arc<dyn OrderStore> = Arc::new(
        SqliteOrderStore::new(&config.database.path).context("Failed to create order store")?,
    );
    info!("Order store initialized");

    let audit_store: Arc<dyn AuditStore> = Arc::new(
        SqliteAuditStore::new(&config.database.path).context("Failed to create audit store")?,
    );
    info!("Audit store initialized");

    let blobs: Arc<dyn BlobStore> = Arc::new(
        FsBlobStore::new(&config.storage.root).context("Failed to create blob store")?,
    );
    info!("Blob store initialized");

    // Create audit system
    let (audit_handle, audit_writer) = create_audit_system(
        Arc::clone(&audit_store),
        config.orchestrator.audit_buffer_size,
    );

    // Spawn audit writer task
    let writer_handle = tokio::spawn(audit_writer.run());

    // Emit ServiceStarted event
    audit_handle
        .emit(AuditEvent::ServiceStarted {
            version: VERSION.to_string(),
            config_hash: config_hash_short.to_string(),
        })
        .await;
    info!("Emitted ServiceStarted audit event");

    // Ingestion gate
    let ingest = IngestionGate::new(
        config.upload.clone(),
        Arc::clone(&blobs),
        Arc::clone(&artworks),
    )
    .with_audit(audit_handle.clone());

    // Job orchestrator with its bounded worker pool
    let orchestrator = JobOrchestrator::new(
        Arc::clone(&jobs),
        Arc::clone(&artworks),
        Arc::clone(&blobs),
        config.pipeline.clone(),
        config.difficulty.clone(),
        config.orchestrator.clone(),
    )
    .with_audit(audit_handle.clone());
    info!(
        "Orchestrator initialized with {} worker slots",
        config.orchestrator.max_concurrent_jobs
    );

    // Order ledger
    let ledger = OrderLedger::new(
        Arc::clone(&orders),
        Arc::clone(&artworks),
        config.pricing.clone(),
    )
    .with_audit(audit_handle.clone());

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        ingest,
        orchestrator,
        ledger,
        artworks,
        jobs,
        orders,
        blobs,
        audit_store,
    ));

    // Create router
    let app = create_router(Arc::clone(&state));

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

    // Emit ServiceStopped event
    info!("Server shutting down...");
    audit_handle
        .emit(AuditEvent::ServiceStopped {
            reason: "graceful_shutdown".to_string(),
        })
        .await;

    // Drop all holders of AuditHandle so the writer's channel closes.
    // AppState holds clones inside the gate, orchestrator and ledger.
    // Order matters: the final event is emitted BEFORE dropping handles.
    drop(state);
    drop(audit_handle);

    // Wait for writer to finish processing remaining events
    let _ = writer_handle.await;
    info!("Audit writer stopped");

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
