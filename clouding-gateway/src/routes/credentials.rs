//! `/credentials` routes.
//!
//! `metadata.expiresAt` is normalized to midnight UTC on the way out and
//! re-rendered as a millisecond ISO timestamp on the way back.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use clouding_core::{
    expiry::{convert_expiry_to_client, convert_expiry_to_utc},
    ResourceId,
};
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
        .route("/credentials", get(list_credentials).post(create_credential))
        .route(
            "/credentials/{id}",
            get(get_credential).put(update_credential).delete(delete_credential),
        )
}

pub async fn list_credentials(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<impl IntoResponse> {
    let mut body = state
        .backend
        .get("/credentials", Some(&caller.token))
        .await
        .context("getting credentials")?;
    convert_expiry_to_client(&mut body);
    Ok(Json(body))
}

pub async fn create_credential(
    State(state): State<AppState>,
    caller: Caller,
    mut payload: JsonBody,
) -> ApiResult<Response> {
    info!(user_id = %caller.user.id, "creating credential");
    convert_expiry_to_utc(&mut payload.0);
    let mut body = state
        .backend
        .post("/credentials", payload.forwardable(), Some(&caller.token))
        .await
        .context("creating credential")?;
    convert_expiry_to_client(&mut body);
    Ok(created(body))
}

pub async fn get_credential(
    State(state): State<AppState>,
    caller: Caller,
    Path(raw): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = ResourceId::parse(raw)?;
    let mut body = state
        .backend
        .get(&format!("/credentials/{id}"), Some(&caller.token))
        .await
        .context("getting credential")?;
    convert_expiry_to_client(&mut body);
    Ok(Json(body))
}

pub async fn update_credential(
    State(state): State<AppState>,
    caller: Caller,
    Path(raw): Path<String>,
    mut payload: JsonBody,
) -> ApiResult<impl IntoResponse> {
    let id = ResourceId::parse(raw)?;
    info!(user_id = %caller.user.id, credential_id = %id, "updating credential");
    convert_expiry_to_utc(&mut payload.0);
    let mut body = state
        .backend
        .put(&format!("/credentials/{id}"), payload.forwardable(), Some(&caller.token))
        .await
        .context("updating credential")?;
    convert_expiry_to_client(&mut body);
    Ok(Json(body))
}

pub async fn delete_credential(
    State(state): State<AppState>,
    caller: Caller,
    Path(raw): Path<String>,
) -> ApiResult<Response> {
    let id = ResourceId::parse(raw)?;
    info!(user_id = %caller.user.id, credential_id = %id, "deleting credential");
    state
        .backend
        .delete(&format!("/credentials/{id}"), Some(&caller.token))
        .await
        .context("deleting credential")?;
    Ok(deleted("Credential"))
}
