//! `/metrics` routes.

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};

use crate::{
    auth::Caller,
    error::{ApiResult, BackendContext},
    state::AppState,
};

pub(super) fn router() -> Router<AppState> {
    Router::new().route("/metrics/overview", get(metrics_overview))
}

/// `GET /metrics/overview`: dashboard summary counts.
pub async fn metrics_overview(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<impl IntoResponse> {
    let body = state
        .backend
        .get("/metrics/overview", Some(&caller.token))
        .await
        .context("getting metrics overview")?;
    Ok(Json(body))
}
