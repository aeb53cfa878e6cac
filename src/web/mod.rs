// FormRelay - Inbound HTTP surface (Axum)
//
// JSON API consumed by the browser front ends: run a workflow, render text,
// list the catalog, report status.

pub mod handlers;

use crate::upstream::Forwarder;
use crate::workflow::pipeline::WorkoutPipeline;
use axum::routing::{get, post};
use axum::Router;
use chrono::{DateTime, Utc};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Shared state for handlers. Everything here is immutable after startup.
pub struct AppState {
    pub forwarder: Arc<Forwarder>,
    pub pipeline: Option<WorkoutPipeline>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(forwarder: Arc<Forwarder>) -> Self {
        let pipeline = WorkoutPipeline::new(forwarder.clone());
        if pipeline.is_none() {
            tracing::info!("Workout pipeline disabled (workout and meal workflows not both configured)");
        }
        Self {
            forwarder,
            pipeline,
            started_at: Utc::now(),
        }
    }
}

pub fn router(state: Arc<AppState>, cors: bool) -> Router {
    let app = Router::new()
        .route("/api/run", post(handlers::run))
        .route("/api/render", post(handlers::render))
        .route("/api/workflows", get(handlers::workflows))
        .route("/api/status", get(handlers::status))
        .with_state(state);

    if cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

/// Bind and serve until the process is stopped.
pub async fn start_server(addr: SocketAddr, state: Arc<AppState>, cors: bool) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, cors = cors, "Starting FormRelay server");
    serve(listener, router(state, cors)).await
}

pub async fn serve(listener: tokio::net::TcpListener, app: Router) -> anyhow::Result<()> {
    axum::serve(listener, app).await?;
    Ok(())
}
