//! Axum router for the gateway API.
//!
//! Every route except `/health` requires a [`Caller`](crate::auth::Caller)
//! and forwards to the backend path of the same name.

mod blueprints;
mod components;
mod credentials;
mod deployments;
mod host_groups;
mod hosts;
mod metrics;
mod users;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

/// Build the application router over `state`.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(blueprints::router())
        .merge(deployments::router())
        .merge(host_groups::router())
        .merge(hosts::router())
        .merge(credentials::router())
        .merge(components::router())
        .merge(users::router())
        .merge(metrics::router())
        .route("/health", get(health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// `GET /health`: liveness check.
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

fn created(body: Value) -> Response {
    (StatusCode::CREATED, Json(body)).into_response()
}

fn deleted(entity: &str) -> Response {
    Json(json!({"message": format!("{entity} deleted successfully")})).into_response()
}
