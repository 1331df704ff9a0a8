//! Opsflow Engine Server
//!
//! An async Rust server that executes declarative business workflows:
//! typed steps, condition guards, approval suspension, and an append-only
//! execution trace per run.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use opsflow_actions::classifier::{KeywordClassifier, RemoteClassifier, TextClassifier};
use opsflow_actions::collab::{LogNotifier, MemoryStore};
use opsflow_actions::registry::DispatcherSet;
use opsflow_engine::{
    config::AppConfig,
    engine::WorkflowRunner,
    handlers,
    state::AppState,
    store::{RunStore, WorkflowCatalog},
};

/// Initialize tracing/logging.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,opsflow_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build the application router with all routes.
fn build_router(state: AppState) -> Router {
    // CORS configuration - allow all origins for development
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Health check routes
    let health_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .with_state(state.clone());

    // Workflow catalog routes
    let workflow_routes = Router::new()
        .route("/api/workflows", post(handlers::workflows::register))
        .route("/api/workflows", get(handlers::workflows::list))
        .route("/api/workflows/{workflow_id}", get(handlers::workflows::get))
        .with_state(state.catalog.clone());

    // Run lifecycle routes
    let run_routes = Router::new()
        .route("/api/runs", post(handlers::runs::start))
        .route("/api/runs", get(handlers::runs::list))
        .route("/api/runs/{run_id}", get(handlers::runs::get))
        .route("/api/runs/{run_id}/resume", post(handlers::runs::resume))
        .route("/api/runs/{run_id}/cancel", post(handlers::runs::cancel))
        .with_state(state.clone());

    // Classification routes
    let classify_routes = Router::new()
        .route("/api/classify", post(handlers::classify::classify))
        .with_state(state);

    // Combine all routes
    Router::new()
        .merge(health_routes)
        .merge(workflow_routes)
        .merge(run_routes)
        .merge(classify_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    let config = AppConfig::from_env().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    tracing::info!(
        host = %config.host,
        port = config.port,
        debug = config.debug,
        "Configuration loaded"
    );

    // Assemble collaborators
    let record_store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(LogNotifier);
    let dispatchers = Arc::new(DispatcherSet::new(
        record_store,
        notifier,
        config.api_timeout_seconds,
    ));

    let classifier: Arc<dyn TextClassifier> = match &config.classifier_url {
        Some(url) => {
            tracing::info!(%url, "using remote classifier with keyword fallback");
            Arc::new(RemoteClassifier::new(url, config.classifier_timeout_seconds))
        }
        None => Arc::new(KeywordClassifier::new()),
    };

    let catalog = Arc::new(WorkflowCatalog::new());
    let runs = Arc::new(RunStore::new());
    let runner = Arc::new(WorkflowRunner::new(
        catalog.clone(),
        runs.clone(),
        dispatchers,
    ));

    let state = AppState::new(runner, catalog, runs, classifier, config.clone());
    let app = build_router(state);

    // Bind to address
    let addr: SocketAddr = config.bind_address().parse()?;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(address = %addr, server = %config.server_name, "Server listening");

    // Run the server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
