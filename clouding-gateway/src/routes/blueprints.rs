//! `/blueprints` routes.

use axum::{
    extract::{Path, RawQuery, State},
    response::{IntoResponse, Response},
    routing::{get, post},
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

/// Query forwarded to `/blueprints/:id/deployments` when the caller sends none.
const DEFAULT_DEPLOYMENTS_QUERY: &str = "limit=1";

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/blueprints",
            get(list_blueprints).post(create_blueprint).put(update_blueprints),
        )
        .route(
            "/blueprints/{id}",
            get(get_blueprint).put(update_blueprint).delete(delete_blueprint),
        )
        .route(
            "/blueprints/{id}/components",
            get(get_blueprint_components).put(update_blueprint_components),
        )
        .route("/blueprints/{id}/clone", post(clone_blueprint))
        .route("/blueprints/{id}/deployments", get(list_blueprint_deployments))
        .route("/blueprints/{id}/deploymentPlans", get(list_deployment_plans))
        .route("/blueprints/{id}/deploymentRuns", get(list_deployment_runs))
}

/// `GET /blueprints`
pub async fn list_blueprints(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<impl IntoResponse> {
    info!(user_id = %caller.user.id, "listing blueprints");
    let body = state
        .backend
        .get("/blueprints", Some(&caller.token))
        .await
        .context("getting blueprints")?;
    Ok(Json(body))
}

/// `POST /blueprints`: create a blueprint, answering 201.
pub async fn create_blueprint(
    State(state): State<AppState>,
    caller: Caller,
    body: JsonBody,
) -> ApiResult<Response> {
    info!(user_id = %caller.user.id, "creating blueprint");
    let body = state
        .backend
        .post("/blueprints", body.forwardable(), Some(&caller.token))
        .await
        .context("creating blueprint")?;
    Ok(created(body))
}

/// `PUT /blueprints`: bulk update.
pub async fn update_blueprints(
    State(state): State<AppState>,
    caller: Caller,
    body: JsonBody,
) -> ApiResult<impl IntoResponse> {
    let body = state
        .backend
        .put("/blueprints", body.forwardable(), Some(&caller.token))
        .await
        .context("updating blueprints")?;
    Ok(Json(body))
}

pub async fn get_blueprint(
    State(state): State<AppState>,
    caller: Caller,
    Path(raw): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = ResourceId::parse(raw)?;
    let body = state
        .backend
        .get(&format!("/blueprints/{id}"), Some(&caller.token))
        .await
        .context("getting blueprint")?;
    Ok(Json(body))
}

pub async fn update_blueprint(
    State(state): State<AppState>,
    caller: Caller,
    Path(raw): Path<String>,
    body: JsonBody,
) -> ApiResult<impl IntoResponse> {
    let id = ResourceId::parse(raw)?;
    info!(user_id = %caller.user.id, blueprint_id = %id, "updating blueprint");
    let body = state
        .backend
        .put(&format!("/blueprints/{id}"), body.forwardable(), Some(&caller.token))
        .await
        .context("updating blueprint")?;
    Ok(Json(body))
}

pub async fn delete_blueprint(
    State(state): State<AppState>,
    caller: Caller,
    Path(raw): Path<String>,
) -> ApiResult<Response> {
    let id = ResourceId::parse(raw)?;
    info!(user_id = %caller.user.id, blueprint_id = %id, "deleting blueprint");
    state
        .backend
        .delete(&format!("/blueprints/{id}"), Some(&caller.token))
        .await
        .context("deleting blueprint")?;
    Ok(deleted("Blueprint"))
}

pub async fn get_blueprint_components(
    State(state): State<AppState>,
    caller: Caller,
    Path(raw): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = ResourceId::parse(raw)?;
    let body = state
        .backend
        .get(&format!("/blueprints/{id}/components"), Some(&caller.token))
        .await
        .context("getting blueprint components")?;
    Ok(Json(body))
}

pub async fn update_blueprint_components(
    State(state): State<AppState>,
    caller: Caller,
    Path(raw): Path<String>,
    body: JsonBody,
) -> ApiResult<impl IntoResponse> {
    let id = ResourceId::parse(raw)?;
    let body = state
        .backend
        .put(&format!("/blueprints/{id}/components"), body.forwardable(), Some(&caller.token))
        .await
        .context("updating blueprint components")?;
    Ok(Json(body))
}

/// `POST /blueprints/:id/clone`: answers 201 with the new blueprint.
pub async fn clone_blueprint(
    State(state): State<AppState>,
    caller: Caller,
    Path(raw): Path<String>,
    body: JsonBody,
) -> ApiResult<Response> {
    let id = ResourceId::parse(raw)?;
    info!(user_id = %caller.user.id, blueprint_id = %id, "cloning blueprint");
    let body = state
        .backend
        .post(&format!("/blueprints/{id}/clone"), body.forwardable(), Some(&caller.token))
        .await
        .context("cloning blueprint")?;
    Ok(created(body))
}

/// `GET /blueprints/:id/deployments`: the query string is forwarded as is,
/// defaulting to [`DEFAULT_DEPLOYMENTS_QUERY`].
pub async fn list_blueprint_deployments(
    State(state): State<AppState>,
    caller: Caller,
    Path(raw): Path<String>,
    RawQuery(query): RawQuery,
) -> ApiResult<impl IntoResponse> {
    let id = ResourceId::parse(raw)?;
    let query = query
        .filter(|q| !q.is_empty())
        .unwrap_or_else(|| DEFAULT_DEPLOYMENTS_QUERY.to_owned());
    let body = state
        .backend
        .get(&format!("/blueprints/{id}/deployments?{query}"), Some(&caller.token))
        .await
        .context("getting blueprint deployments")?;
    Ok(Json(body))
}

pub async fn list_deployment_plans(
    State(state): State<AppState>,
    caller: Caller,
    Path(raw): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = ResourceId::parse(raw)?;
    let body = state
        .backend
        .get(&format!("/blueprints/{id}/deploymentPlans"), Some(&caller.token))
        .await
        .context("getting deployment plans")?;
    Ok(Json(body))
}

pub async fn list_deployment_runs(
    State(state): State<AppState>,
    caller: Caller,
    Path(raw): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = ResourceId::parse(raw)?;
    let body = state
        .backend
        .get(&format!("/blueprints/{id}/deploymentRuns"), Some(&caller.token))
        .await
        .context("getting deployment runs")?;
    Ok(Json(body))
}
