//! `/hostGroups` routes.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use clouding_core::ResourceId;
use serde_json::json;
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
        .route(
            "/hostGroups",
            get(list_host_groups).post(create_host_group).put(update_host_groups),
        )
        .route(
            "/hostGroups/{id}",
            get(get_host_group).put(update_host_group).delete(delete_host_group),
        )
        .route("/hostGroups/{id}/hosts", post(add_hosts))
        .route("/hostGroups/{id}/hosts/{hostId}", delete(remove_host))
}

pub async fn list_host_groups(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<impl IntoResponse> {
    let body = state
        .backend
        .get("/hostGroups", Some(&caller.token))
        .await
        .context("getting host groups")?;
    Ok(Json(body))
}

pub async fn create_host_group(
    State(state): State<AppState>,
    caller: Caller,
    body: JsonBody,
) -> ApiResult<Response> {
    info!(user_id = %caller.user.id, "creating host group");
    let body = state
        .backend
        .post("/hostGroups", body.forwardable(), Some(&caller.token))
        .await
        .context("creating host group")?;
    Ok(created(body))
}

pub async fn update_host_groups(
    State(state): State<AppState>,
    caller: Caller,
    body: JsonBody,
) -> ApiResult<impl IntoResponse> {
    let body = state
        .backend
        .put("/hostGroups", body.forwardable(), Some(&caller.token))
        .await
        .context("updating host groups")?;
    Ok(Json(body))
}

/// `GET /hostGroups/:id`
pub async fn get_host_group(
    State(state): State<AppState>,
    caller: Caller,
    Path(raw): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = ResourceId::parse(raw)?;
    info!(user_id = %caller.user.id, host_group_id = %id, "getting host group");
    let body = state
        .backend
        .get(&format!("/hostGroups/{id}"), Some(&caller.token))
        .await
        .context("getting host group")?;
    Ok(Json(body))
}

pub async fn update_host_group(
    State(state): State<AppState>,
    caller: Caller,
    Path(raw): Path<String>,
    body: JsonBody,
) -> ApiResult<impl IntoResponse> {
    let id = ResourceId::parse(raw)?;
    info!(user_id = %caller.user.id, host_group_id = %id, "updating host group");
    let body = state
        .backend
        .put(&format!("/hostGroups/{id}"), body.forwardable(), Some(&caller.token))
        .await
        .context("updating host group")?;
    Ok(Json(body))
}

pub async fn delete_host_group(
    State(state): State<AppState>,
    caller: Caller,
    Path(raw): Path<String>,
) -> ApiResult<Response> {
    let id = ResourceId::parse(raw)?;
    info!(user_id = %caller.user.id, host_group_id = %id, "deleting host group");
    state
        .backend
        .delete(&format!("/hostGroups/{id}"), Some(&caller.token))
        .await
        .context("deleting host group")?;
    Ok(deleted("Host group"))
}

/// `POST /hostGroups/:id/hosts`: add hosts to a group.
pub async fn add_hosts(
    State(state): State<AppState>,
    caller: Caller,
    Path(raw): Path<String>,
    body: JsonBody,
) -> ApiResult<Response> {
    let id = ResourceId::parse(raw)?;
    info!(user_id = %caller.user.id, host_group_id = %id, "adding hosts to group");
    let body = state
        .backend
        .post(&format!("/hostGroups/{id}/hosts"), body.forwardable(), Some(&caller.token))
        .await
        .context("adding hosts to group")?;
    Ok(created(body))
}

/// `DELETE /hostGroups/:id/hosts/:hostId`
pub async fn remove_host(
    State(state): State<AppState>,
    caller: Caller,
    Path((raw_group, raw_host)): Path<(String, String)>,
) -> ApiResult<impl IntoResponse> {
    let group = ResourceId::parse(raw_group)?;
    let host = ResourceId::parse(raw_host)?;
    info!(user_id = %caller.user.id, host_group_id = %group, host_id = %host, "removing host from group");
    state
        .backend
        .delete(&format!("/hostGroups/{group}/hosts/{host}"), Some(&caller.token))
        .await
        .context("removing host from group")?;
    Ok(Json(json!({"message": "Host removed from group successfully"})))
}
