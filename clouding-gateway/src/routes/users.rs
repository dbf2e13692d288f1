//! `/users` routes.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use clouding_core::ResourceId;
use tracing::info;

use super::created;
use crate::{
    auth::Caller,
    error::{ApiResult, BackendContext},
    extract::JsonBody,
    state::AppState,
};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/{id}", get(get_user).put(update_user))
}

pub async fn list_users(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<impl IntoResponse> {
    let body = state
        .backend
        .get("/users", Some(&caller.token))
        .await
        .context("getting users")?;
    Ok(Json(body))
}

/// `POST /users`: register the caller's profile with the backend.
pub async fn create_user(
    State(state): State<AppState>,
    caller: Caller,
    body: JsonBody,
) -> ApiResult<Response> {
    info!(user_id = %caller.user.id, provider = %caller.user.provider, "creating user");
    let body = state
        .backend
        .post("/users", body.forwardable(), Some(&caller.token))
        .await
        .context("creating user")?;
    Ok(created(body))
}

pub async fn get_user(
    State(state): State<AppState>,
    caller: Caller,
    Path(raw): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = ResourceId::parse(raw)?;
    let body = state
        .backend
        .get(&format!("/users/{id}"), Some(&caller.token))
        .await
        .context("getting user")?;
    Ok(Json(body))
}

pub async fn update_user(
    State(state): State<AppState>,
    caller: Caller,
    Path(raw): Path<String>,
    body: JsonBody,
) -> ApiResult<impl IntoResponse> {
    let id = ResourceId::parse(raw)?;
    info!(user_id = %caller.user.id, target_user_id = %id, "updating user");
    let body = state
        .backend
        .put(&format!("/users/{id}"), body.forwardable(), Some(&caller.token))
        .await
        .context("updating user")?;
    Ok(Json(body))
}
