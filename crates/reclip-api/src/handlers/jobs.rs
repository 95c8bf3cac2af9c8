//! Job handlers: the action endpoint and its REST aliases.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use reclip_models::{Constraints, Job, JobId, JobState, MediaSource};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Body of `POST /api/jobs`, dispatched on its `action` field.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum JobAction {
    CreateJob(CreateJobRequest),
    GetStatus(JobIdRequest),
    CancelJob(JobIdRequest),
}

/// Missing fields are reported as validation errors rather than parse errors.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub source: Option<MediaSource>,
    #[serde(default)]
    pub constraints: Option<Constraints>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobIdRequest {
    pub job_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobResponse {
    pub job_id: JobId,
    pub state: JobState,
}

#[derive(Debug, Serialize)]
pub struct CancelJobResponse {
    pub success: bool,
}

/// `POST /api/jobs`
pub async fn job_action(
    State(state): State<AppState>,
    payload: Result<Json<JobAction>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(action) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;

    match action {
        JobAction::CreateJob(req) => Ok(create(&state, req).await?.into_response()),
        JobAction::GetStatus(req) => Ok(status(&state, &req.job_id).await?.into_response()),
        JobAction::CancelJob(req) => Ok(cancel(&state, &req.job_id).await?.into_response()),
    }
}

/// `POST /api/jobs/create`
pub async fn create_job(
    State(state): State<AppState>,
    payload: Result<Json<CreateJobRequest>, JsonRejection>,
) -> ApiResult<Json<CreateJobResponse>> {
    let Json(req) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    create(&state, req).await
}

/// `GET /api/jobs/:job_id`
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<Job>> {
    status(&state, &job_id).await
}

/// `POST /api/jobs/:job_id/cancel`
pub async fn cancel_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<CancelJobResponse>> {
    cancel(&state, &job_id).await
}

async fn create(state: &AppState, req: CreateJobRequest) -> ApiResult<Json<CreateJobResponse>> {
    let owner = req
        .owner
        .ok_or_else(|| ApiError::Validation("owner is required".to_string()))?;

    let job = state
        .orchestrator
        .submit(&owner, req.source, req.constraints)
        .await?;

    info!(job_id = %job.id, "Created job");
    Ok(Json(CreateJobResponse {
        job_id: job.id,
        state: job.state,
    }))
}

async fn status(state: &AppState, job_id: &str) -> ApiResult<Json<Job>> {
    let job_id = parse_job_id(job_id)?;
    Ok(Json(state.orchestrator.get_status(&job_id).await?))
}

async fn cancel(state: &AppState, job_id: &str) -> ApiResult<Json<CancelJobResponse>> {
    let job_id = parse_job_id(job_id)?;
    state.orchestrator.cancel(&job_id).await?;
    Ok(Json(CancelJobResponse { success: true }))
}

fn parse_job_id(job_id: &str) -> ApiResult<JobId> {
    if !is_valid_job_id(job_id) {
        return Err(ApiError::bad_request("Invalid job ID format"));
    }
    Ok(JobId::from_string(job_id))
}

/// Job IDs are 8-64 characters of ASCII alphanumerics and hyphens.
fn is_valid_job_id(id: &str) -> bool {
    (8..=64).contains(&id.len()) && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}
