use library_service::config::LibraryConfig;
use library_service::db;
use library_service::services::{
    Database, EmailProvider, HandoffCodec, HttpBlobStorage, LibraryStore, MockEmailService,
    SmtpEmailService, Storage, Sweeper,
};
use library_service::{build_router, AppState};
use service_core::observability::init_tracing;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;

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

    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    init_tracing("library-service", &log_level);

    let config = LibraryConfig::from_env().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    // Connect to database
    let pool = db::create_pool(&config.database).await.map_err(|e| {
        tracing::error!("Failed to connect to PostgreSQL: {}", e);
        std::io::Error::other(format!("Database connection error: {}", e))
    })?;

    db::run_migrations(&pool).await.map_err(|e| {
        tracing::error!("Failed to run migrations: {}", e);
        std::io::Error::other(format!("Database migration error: {}", e))
    })?;

    let store: Arc<dyn LibraryStore> = Arc::new(Database::new(pool));

    let email: Arc<dyn EmailProvider> = if config.email.is_complete() {
        match SmtpEmailService::new(&config.email) {
            Ok(service) => Arc::new(service),
            Err(e) => {
                tracing::warn!(
                    "Failed to initialize SMTP transport: {}. Invitation emails disabled.",
                    e
                );
                Arc::new(MockEmailService)
            }
        }
    } else {
        tracing::warn!("Email configuration incomplete; invitation emails disabled");
        Arc::new(MockEmailService)
    };

    let storage: Arc<dyn Storage> =
        Arc::new(HttpBlobStorage::new(std::env::var("BLOB_STORE_TOKEN").ok()));

    let handoff = HandoffCodec::new(
        &config.invite.handoff_secret,
        config.invite.handoff_ttl_seconds,
    );

    let state = AppState {
        config: config.clone(),
        store: store.clone(),
        email,
        storage: storage.clone(),
        handoff,
    };

    // Scheduled purge sweeps, alongside the on-demand endpoint.
    let sweeper = Sweeper::new(
        store,
        storage,
        config.retention.grace_days,
        config.retention.sweep_page_size,
    );
    let sweep_interval = config.retention.sweep_interval_seconds;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(sweep_interval));
        loop {
            ticker.tick().await;
            match sweeper.sweep().await {
                Ok(outcome) if outcome.purged > 0 => {
                    tracing::info!(purged = outcome.purged, "Scheduled sweep completed");
                }
                Ok(_) => {}
                Err(e) => tracing::error!("Scheduled sweep failed: {}", e),
            }
        }
    });

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
        e
    })?;
    tracing::info!("Listening on {}", listener.local_addr()?.port());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}
