use std::io::Cursor;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::json;

use super::domain::{JobId, TreeId};
use super::intake::{AssessmentSubmission, QuickEstimateSubmission};
use super::repository::{AlertPublisher, JobEstimateRepository, RepositoryError};
use super::service::{EstimatingService, EstimatingServiceError};
use crate::workflows::inventory::TreeInventoryImporter;

/// Router builder exposing the estimating and job-aggregation endpoints.
pub fn estimating_router<R, A>(service: Arc<EstimatingService<R, A>>) -> Router
where
    R: JobEstimateRepository + 'static,
    A: AlertPublisher + 'static,
{
    Router::new()
        .route("/api/v1/estimates/assessments", post(assess_handler::<R, A>))
        .route("/api/v1/estimates/quick", post(quick_handler::<R, A>))
        .route("/api/v1/jobs", post(open_job_handler::<R, A>))
        .route("/api/v1/jobs/:job_id", get(job_handler::<R, A>))
        .route(
            "/api/v1/jobs/:job_id/trees/:tree_id",
            post(attach_handler::<R, A>),
        )
        .route(
            "/api/v1/jobs/:job_id/inventory",
            post(inventory_handler::<R, A>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenJobRequest {
    pub(crate) job_id: String,
    #[serde(default)]
    pub(crate) opened_on: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AttachAssessmentRequest {
    #[serde(flatten)]
    pub(crate) submission: AssessmentSubmission,
    #[serde(default)]
    pub(crate) assessed_on: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct InventoryImportRequest {
    pub(crate) csv: String,
    #[serde(default)]
    pub(crate) assessed_on: Option<NaiveDate>,
}

pub(crate) async fn assess_handler<R, A>(
    State(service): State<Arc<EstimatingService<R, A>>>,
    axum::Json(submission): axum::Json<AssessmentSubmission>,
) -> Response
where
    R: JobEstimateRepository + 'static,
    A: AlertPublisher + 'static,
{
    match service.assess(submission) {
        Ok(result) => (StatusCode::OK, axum::Json(result)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn quick_handler<R, A>(
    State(service): State<Arc<EstimatingService<R, A>>>,
    axum::Json(submission): axum::Json<QuickEstimateSubmission>,
) -> Response
where
    R: JobEstimateRepository + 'static,
    A: AlertPublisher + 'static,
{
    match service.quick_estimate(submission) {
        Ok(estimate) => (StatusCode::OK, axum::Json(estimate)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn open_job_handler<R, A>(
    State(service): State<Arc<EstimatingService<R, A>>>,
    axum::Json(request): axum::Json<OpenJobRequest>,
) -> Response
where
    R: JobEstimateRepository + 'static,
    A: AlertPublisher + 'static,
{
    let opened_on = request
        .opened_on
        .unwrap_or_else(|| Local::now().date_naive());

    match service.open_job(JobId(request.job_id), opened_on) {
        Ok(record) => (StatusCode::CREATED, axum::Json(record.summary_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn job_handler<R, A>(
    State(service): State<Arc<EstimatingService<R, A>>>,
    Path(job_id): Path<String>,
) -> Response
where
    R: JobEstimateRepository + 'static,
    A: AlertPublisher + 'static,
{
    match service.job(&JobId(job_id)) {
        Ok(record) => (StatusCode::OK, axum::Json(record.summary_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn attach_handler<R, A>(
    State(service): State<Arc<EstimatingService<R, A>>>,
    Path((job_id, tree_id)): Path<(String, String)>,
    axum::Json(request): axum::Json<AttachAssessmentRequest>,
) -> Response
where
    R: JobEstimateRepository + 'static,
    A: AlertPublisher + 'static,
{
    let assessed_on = request
        .assessed_on
        .unwrap_or_else(|| Local::now().date_naive());

    match service.attach_to_job(
        &JobId(job_id),
        TreeId(tree_id),
        request.submission,
        assessed_on,
    ) {
        Ok(record) => (StatusCode::OK, axum::Json(record.summary_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn inventory_handler<R, A>(
    State(service): State<Arc<EstimatingService<R, A>>>,
    Path(job_id): Path<String>,
    axum::Json(request): axum::Json<InventoryImportRequest>,
) -> Response
where
    R: JobEstimateRepository + 'static,
    A: AlertPublisher + 'static,
{
    let entries = match TreeInventoryImporter::from_reader(Cursor::new(request.csv.into_bytes())) {
        Ok(entries) => entries,
        Err(error) => {
            let payload = json!({ "error": error.to_string() });
            return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
        }
    };

    let assessed_on = request
        .assessed_on
        .unwrap_or_else(|| Local::now().date_naive());

    match service.attach_inventory(&JobId(job_id), entries, assessed_on) {
        Ok(record) => (StatusCode::OK, axum::Json(record.summary_view())).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: EstimatingServiceError) -> Response {
    let status = match &error {
        EstimatingServiceError::Intake(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EstimatingServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        EstimatingServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        EstimatingServiceError::Repository(RepositoryError::Unavailable(_))
        | EstimatingServiceError::Alert(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}
