//! HTTP server assembly
//!
//! ```text
//! /            service banner
//! /health      database connectivity
//! /api/...     feature routes (see `features::datasets::routes`)
//! ```

pub mod response;

use axum::{extract::State, http::Uri, response::IntoResponse, routing::get, Json, Router};
use myotrack_common::analysis::PeakDetector;
use serde_json::json;
use sqlx::SqlitePool;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::compression::CompressionLayer;
use tracing::info;

use crate::config::Config;
use crate::db;
use crate::error::AppError;
use crate::features::{self, FeatureState};
use crate::middleware;
use crate::storage::UploadStore;

/// Connect the pool, apply migrations and open the upload store
pub async fn build_state(config: &Config) -> anyhow::Result<FeatureState> {
    let pool = db::create_pool(&config.database).await?;
    db::run_migrations(&pool).await?;
    let uploads = UploadStore::open(&config.uploads.dir).await?;

    Ok(FeatureState {
        db: pool,
        uploads,
        ingest: Arc::new(config.ingest.clone()),
        peaks: PeakDetector::new(config.analysis.peak_threshold),
    })
}

/// Full application router with middleware
pub fn create_router(state: FeatureState, config: &Config) -> Router {
    let api = features::router(state.clone(), config.uploads.max_bytes);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .with_state(state.db)
        .nest("/api", api)
        .fallback(fallback)
        .layer(CompressionLayer::new())
        .layer(middleware::tracing_layer())
        .layer(middleware::cors_layer(&config.cors))
}

pub async fn serve(config: Config) -> anyhow::Result<()> {
    let state = build_state(&config).await?;
    let app = create_router(state, &config);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down gracefully");
    Ok(())
}

async fn root() -> impl IntoResponse {
    Json(json!({
        "name": "Myotrack Server",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

async fn health(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    db::health_check(&pool)
        .await
        .map_err(|e| AppError::Unavailable(format!("database unreachable: {}", e)))?;

    Ok(Json(json!({
        "status": "healthy",
        "database": "connected"
    })))
}

async fn fallback(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {}", uri.path()))
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting graceful shutdown"),
        _ = terminate => info!("Received terminate signal, starting graceful shutdown"),
    }
}
