//! Mortuary API Server Binary
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin mortuary-api
//!
//! API_PORT=8080 API_DATABASE_URL=postgres://... cargo run --bin mortuary-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` - Server host (default: 0.0.0.0)
//! * `API_PORT` - Server port (default: 8080)
//! * `API_JWT_SECRET` - JWT signing secret (required in production)
//! * `API_JWT_EXPIRATION_SECS` - JWT token expiration in seconds (default: 3600)
//! * `API_DATABASE_URL` - PostgreSQL connection string
//! * `API_DB_MAX_CONNECTIONS` - Database pool size (default: 10)
//! * `API_LOG_LEVEL` - Log level: trace, debug, info, warn, error (default: info)
//! * `API_CURRENCY` - Billing currency code (default: GHS)
//! * `API_TIMEZONE` - IANA timezone used for "today" (default: Africa/Accra)

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use domain_case::{BroadcastInvalidator, CasePorts, CaseServices, RecordStore};
use infra_db::{create_pool, run_migrations, DatabaseConfig, PgReceiptNumbering, PgRecordStore};
use interface_api::{config::ApiConfig, create_router, AppState};

/// Capacity of the stale-view channel
const INVALIDATION_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env()?;
    config.validate()?;

    init_tracing(&config.log_level);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        currency = %config.currency,
        timezone = %config.timezone,
        "Starting Mortuary API Server"
    );

    let pool = create_pool(
        DatabaseConfig::new(&config.database_url)
            .max_connections(config.db_max_connections)
            .min_connections(config.db_max_connections.min(2)),
    )
    .await?;
    run_migrations(&pool).await?;

    let store: Arc<dyn RecordStore> = Arc::new(PgRecordStore::new(pool.clone(), config.currency));
    let numbering = Arc::new(PgReceiptNumbering::new(pool));
    let invalidator = BroadcastInvalidator::new(INVALIDATION_CAPACITY);
    spawn_invalidation_logger(&invalidator);

    let ports = CasePorts::new(store.clone(), numbering, Arc::new(invalidator), config.billing());
    let state = AppState::new(CaseServices::new(ports), store, config.clone());
    let app = create_router(state);

    let addr: SocketAddr = config.server_addr().parse()?;
    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Logs every stale view until the channel closes
fn spawn_invalidation_logger(invalidator: &BroadcastInvalidator) {
    let mut receiver = invalidator.subscribe();
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(view) => tracing::debug!(path = %view, "View invalidated"),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Invalidation logger lagged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
