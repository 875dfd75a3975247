//! ShelfMaster Server - Loan & Penalty Lifecycle
//!
//! REST API server for the library lending core, with a recurring overdue
//! scanner running alongside the request handlers.

use axum::{
    routing::{get, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shelfmaster_server::{
    api,
    config::AppConfig,
    lending::SystemClock,
    repository::Repository,
    services::{scanner::OverdueScanner, Services},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            format!("shelfmaster_server={},tower_http=debug", config.logging.level).into()
        });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting ShelfMaster Server v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations completed");

    // Create repository and services
    let repository = Repository::new(pool);
    let services = Services::new(repository.clone(), &config)
        .expect("Failed to create services");

    // Start the overdue scanner; the shutdown channel stops it between sweeps
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scanner = OverdueScanner::new(
        repository,
        Arc::new(SystemClock),
        config.lending.clone(),
        config.scanner.clone(),
    );
    let scanner_handle = tokio::spawn(scanner.run(shutdown_rx));

    // Save server address before moving config
    let server_host = config.server.host.clone();
    let server_port = config.server.port;

    // Create application state
    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(
        server_host.parse().expect("Invalid host address"),
        server_port,
    );

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop the scanner and let an in-flight sweep finish
    let _ = shutdown_tx.send(true);
    let _ = scanner_handle.await;

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install ctrl-c handler");
    tracing::info!("Shutdown signal received");
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Loans
        .route("/loans", get(api::loans::list_loans))
        .route("/loans", post(api::loans::issue_loans))
        .route("/loans/:id", get(api::loans::get_loan))
        .route("/loans/:id/return", post(api::loans::return_loan))
        .route("/loans/:id/renew", post(api::loans::renew_loan))
        .route("/loans/:id/lost", post(api::loans::mark_lost))
        .route("/loans/:id/damaged", post(api::loans::mark_damaged))
        .route("/loans/:id/payments", post(api::loans::settle_payment))
        .route("/loans/:id/return-and-pay", post(api::loans::return_and_pay))
        // Overdues
        .route("/overdues", get(api::overdues::list_overdues))
        .route("/overdues/:loan_id/remind", post(api::overdues::send_reminder))
        // Payments
        .route("/payments", get(api::payments::list_payments))
        // Statistics
        .route("/stats/lending", get(api::stats::get_lending_stats))
        .with_state(state.clone());

    // OpenAPI documentation
    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
