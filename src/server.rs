//! HTTP boundary: the TTN webhook listener and the read-only query
//! endpoints consumed by the map dashboard. The public-tunnel exposure
//! (ngrok or similar) runs outside this process and simply forwards to
//! the bind address.

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::{
    db::models::LatestPosition,
    ingest::{IngestOutcome, TtnUplink},
    AppState,
};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ttn/uplink", post(receive_uplink))
        .route("/api/latest-position", get(latest_position))
        .route("/api/trajectory", get(trajectory))
        .route("/api/logs", get(logs))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Acknowledges the uplink; no positional data goes back to the sender.
async fn receive_uplink(
    State(state): State<Arc<AppState>>,
    Json(uplink): Json<TtnUplink>,
) -> Json<Value> {
    match state.pipeline.handle_uplink(&uplink).await {
        IngestOutcome::Accepted => Json(json!({ "status": "ok" })),
        IngestOutcome::EmptyPayload => Json(json!({ "status": "empty payload" })),
    }
}

async fn latest_position(State(state): State<Arc<AppState>>) -> Json<Option<LatestPosition>> {
    match state.db.latest_position().await {
        Ok(latest) => Json(latest),
        Err(err) => {
            state
                .diag
                .push(format!("latest-position query failed: {err}"));
            Json(None)
        }
    }
}

/// Recent resolved positions as `[[lat, lon], …]`, chronological.
async fn trajectory(State(state): State<Arc<AppState>>) -> Json<Vec<[f64; 2]>> {
    match state.db.trajectory(state.positioning.trajectory_window).await {
        Ok(points) => Json(points.into_iter().map(|(lat, lon)| [lat, lon]).collect()),
        Err(err) => {
            state.diag.push(format!("trajectory query failed: {err}"));
            Json(Vec::new())
        }
    }
}

async fn logs(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({ "logs": state.diag.tail() }))
}
