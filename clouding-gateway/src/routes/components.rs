//! `/components` routes (read only).

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use clouding_core::ResourceId;

use crate::{
    auth::Caller,
    error::{ApiResult, BackendContext},
    state::AppState,
};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/components", get(list_components))
        .route("/components/{id}", get(get_component))
}

pub async fn list_components(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<impl IntoResponse> {
    let body = state
        .backend
        .get("/components", Some(&caller.token))
        .await
        .context("getting components")?;
    Ok(Json(body))
}

pub async fn get_component(
    State(state): State<AppState>,
    caller: Caller,
    Path(raw): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = ResourceId::parse(raw)?;
    let body = state
        .backend
        .get(&format!("/components/{id}"), Some(&caller.token))
        .await
        .context("getting component")?;
    Ok(Json(body))
}
