//! `/hosts` routes.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use clouding_core::ResourceId;
use tracing::info;

use super::{created, deleted};
use crate::{
    auth::Caller,
    error::{ApiResult, BackendContext},
    extract::JsonBody,
    state::AppState,
};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/hosts", get(list_hosts).post(create_host))
        .route("/hosts/{id}", get(get_host).put(update_host).delete(delete_host))
}

pub async fn list_hosts(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<impl IntoResponse> {
    let body = state
        .backend
        .get("/hosts", Some(&caller.token))
        .await
        .context("getting hosts")?;
    Ok(Json(body))
}

pub async fn create_host(
    State(state): State<AppState>,
    caller: Caller,
    body: JsonBody,
) -> ApiResult<Response> {
    info!(user_id = %caller.user.id, "creating host");
    let body = state
        .backend
        .post("/hosts", body.forwardable(), Some(&caller.token))
        .await
        .context("creating host")?;
    Ok(created(body))
}

pub async fn get_host(
    State(state): State<AppState>,
    caller: Caller,
    Path(raw): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = ResourceId::parse(raw)?;
    let body = state
        .backend
        .get(&format!("/hosts/{id}"), Some(&caller.token))
        .await
        .context("getting host")?;
    Ok(Json(body))
}

pub async fn update_host(
    State(state): State<AppState>,
    caller: Caller,
    Path(raw): Path<String>,
    body: JsonBody,
) -> ApiResult<impl IntoResponse> {
    let id = ResourceId::parse(raw)?;
    info!(user_id = %caller.user.id, host_id = %id, "updating host");
    let body = state
        .backend
        .put(&format!("/hosts/{id}"), body.forwardable(), Some(&caller.token))
        .await
        .context("updating host")?;
    Ok(Json(body))
}

pub async fn delete_host(
    State(state): State<AppState>,
    caller: Caller,
    Path(raw): Path<String>,
) -> ApiResult<Response> {
    let id = ResourceId::parse(raw)?;
    info!(user_id = %caller.user.id, host_id = %id, "deleting host");
    state
        .backend
        .delete(&format!("/hosts/{id}"), Some(&caller.token))
        .await
        .context("deleting host")?;
    Ok(deleted("Host"))
}
