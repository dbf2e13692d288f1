//! `/deployments` routes, including the progress event stream.

use axum::{
    body::Body,
    extract::{Path, State},
    http::header::{CACHE_CONTROL, CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use clouding_client::BackendError;
use clouding_core::{DeploymentType, ResourceId};
use tracing::info;

use super::created;
use crate::{
    auth::Caller,
    error::{ApiError, ApiResult, BackendContext},
    extract::JsonBody,
    state::AppState,
};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/deployments/{id}", get(get_deployment))
        .route("/deployments/{id}/hosts", get(get_deployment_hosts))
        .route(
            "/deployments/type/{id}",
            get(list_deployments_by_type).post(create_deployment),
        )
        .route("/deployments/progress/{id}", get(stream_progress))
}

pub async fn get_deployment(
    State(state): State<AppState>,
    caller: Caller,
    Path(raw): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = ResourceId::parse(raw)?;
    let body = state
        .backend
        .get(&format!("/deployments/{id}"), Some(&caller.token))
        .await
        .context("getting deployment")?;
    Ok(Json(body))
}

pub async fn get_deployment_hosts(
    State(state): State<AppState>,
    caller: Caller,
    Path(raw): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = ResourceId::parse(raw)?;
    let body = state
        .backend
        .get(&format!("/deployments/{id}/hosts"), Some(&caller.token))
        .await
        .context("getting deployment hosts")?;
    Ok(Json(body))
}

/// `GET /deployments/type/:type`: `type` is `plan` or `deploy`.
pub async fn list_deployments_by_type(
    State(state): State<AppState>,
    caller: Caller,
    Path(raw): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let kind: DeploymentType = raw.parse()?;
    let body = state
        .backend
        .get(&format!("/deployments/type/{kind}"), Some(&caller.token))
        .await
        .context("getting deployments by type")?;
    Ok(Json(body))
}

/// `POST /deployments/type/:type`: start a plan or deploy job, answering 201.
pub async fn create_deployment(
    State(state): State<AppState>,
    caller: Caller,
    Path(raw): Path<String>,
    body: JsonBody,
) -> ApiResult<Response> {
    let kind: DeploymentType = raw.parse()?;
    info!(user_id = %caller.user.id, deployment_type = %kind, "creating deployment");
    let body = state
        .backend
        .post(&format!("/deployments/type/{kind}"), body.forwardable(), Some(&caller.token))
        .await
        .context("creating deployment")?;
    Ok(created(body))
}

/// `GET /deployments/progress/:jobId`: relay the backend's server-sent
/// events unbuffered.
///
/// # Errors
/// A non-2xx upstream answer becomes [`ApiError::Upstream`] (502).
pub async fn stream_progress(
    State(state): State<AppState>,
    caller: Caller,
    Path(raw): Path<String>,
) -> ApiResult<Response> {
    let job_id = ResourceId::parse(raw)?;
    info!(user_id = %caller.user.id, job_id = %job_id, "streaming deployment progress");

    let upstream = match state
        .backend
        .stream(&format!("/deployments/progress/{job_id}"), Some(&caller.token))
        .await
    {
        Ok(resp) => resp,
        Err(BackendError::Status { status, .. }) => return Err(ApiError::Upstream { status }),
        Err(e) => return Err(ApiError::backend("streaming deployment progress", e)),
    };

    Ok((
        [(CONTENT_TYPE, "text/event-stream"), (CACHE_CONTROL, "no-cache")],
        Body::new(upstream.into_body()),
    )
        .into_response())
}
