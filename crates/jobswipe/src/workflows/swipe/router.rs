use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{
    ApplicationId, ApplicationStatus, CandidateId, CandidateProfile, JobId, RecruiterId,
    SwipeDirection,
};
use super::refiner::{CompletionClient, RefineError, RefineRequest};
use super::repository::{ApplicationRepository, JobRepository};
use super::review::ReviewError;
use super::service::{SessionId, SwipeReceipt, SwipeService, SwipeServiceError};

type SharedService<J, A, C> = Arc<SwipeService<J, A, C>>;

/// Router builder exposing the feed, swipe session, review and refinement endpoints.
pub fn swipe_router<J, A, C>(service: Arc<SwipeService<J, A, C>>) -> Router
where
    J: JobRepository + 'static,
    A: ApplicationRepository + 'static,
    C: CompletionClient + 'static,
{
    Router::new()
        .route(
            "/api/v1/candidates/:candidate_id/feed",
            get(feed_handler::<J, A, C>),
        )
        .route(
            "/api/v1/swipe/sessions",
            post(open_session_handler::<J, A, C>),
        )
        .route(
            "/api/v1/swipe/sessions/:session_id",
            get(snapshot_handler::<J, A, C>).delete(close_session_handler::<J, A, C>),
        )
        .route(
            "/api/v1/swipe/sessions/:session_id/drag",
            post(drag_handler::<J, A, C>),
        )
        .route(
            "/api/v1/swipe/sessions/:session_id/release",
            post(release_handler::<J, A, C>),
        )
        .route(
            "/api/v1/swipe/sessions/:session_id/swipe",
            post(swipe_handler::<J, A, C>),
        )
        .route(
            "/api/v1/swipe/sessions/:session_id/settle",
            post(settle_handler::<J, A, C>),
        )
        .route(
            "/api/v1/swipe/sessions/:session_id/undo",
            post(undo_handler::<J, A, C>),
        )
        .route(
            "/api/v1/applications/:application_id",
            get(application_handler::<J, A, C>),
        )
        .route(
            "/api/v1/applications/:application_id/review",
            post(review_handler::<J, A, C>),
        )
        .route(
            "/api/v1/recruiters/:recruiter_id/applicants",
            get(applicants_handler::<J, A, C>),
        )
        .route(
            "/api/v1/match-score/refine",
            post(refine_handler::<J, A, C>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DragRequest {
    pub(crate) offset_x: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReleaseRequest {
    #[serde(default)]
    pub(crate) velocity_x: f32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SwipeRequest {
    pub(crate) direction: SwipeDirection,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReviewRequest {
    pub(crate) status: ApplicationStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApplicantsQuery {
    #[serde(default)]
    pub(crate) job_id: Option<String>,
}

pub(crate) async fn feed_handler<J, A, C>(
    State(service): State<SharedService<J, A, C>>,
    Path(candidate_id): Path<String>,
) -> Response
where
    J: JobRepository + 'static,
    A: ApplicationRepository + 'static,
    C: CompletionClient + 'static,
{
    let candidate_id = CandidateId(candidate_id);
    match service.feed(&candidate_id) {
        Ok(feed) => {
            let payload = json!({
                "candidateId": candidate_id,
                "source": feed.source,
                "size": feed.len(),
                "jobs": feed.jobs,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn open_session_handler<J, A, C>(
    State(service): State<SharedService<J, A, C>>,
    axum::Json(candidate): axum::Json<CandidateProfile>,
) -> Response
where
    J: JobRepository + 'static,
    A: ApplicationRepository + 'static,
    C: CompletionClient + 'static,
{
    if candidate.candidate_id.0.trim().is_empty() {
        let payload = json!({ "error": "candidateId is required" });
        return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
    }

    match service.open_session(candidate) {
        Ok(snapshot) => (StatusCode::CREATED, axum::Json(snapshot)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn snapshot_handler<J, A, C>(
    State(service): State<SharedService<J, A, C>>,
    Path(session_id): Path<String>,
) -> Response
where
    J: JobRepository + 'static,
    A: ApplicationRepository + 'static,
    C: CompletionClient + 'static,
{
    match service.snapshot(&SessionId(session_id)) {
        Ok(snapshot) => (StatusCode::OK, axum::Json(snapshot)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn close_session_handler<J, A, C>(
    State(service): State<SharedService<J, A, C>>,
    Path(session_id): Path<String>,
) -> Response
where
    J: JobRepository + 'static,
    A: ApplicationRepository + 'static,
    C: CompletionClient + 'static,
{
    match service.close(&SessionId(session_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn drag_handler<J, A, C>(
    State(service): State<SharedService<J, A, C>>,
    Path(session_id): Path<String>,
    axum::Json(request): axum::Json<DragRequest>,
) -> Response
where
    J: JobRepository + 'static,
    A: ApplicationRepository + 'static,
    C: CompletionClient + 'static,
{
    match service.drag(&SessionId(session_id), request.offset_x) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn release_handler<J, A, C>(
    State(service): State<SharedService<J, A, C>>,
    Path(session_id): Path<String>,
    axum::Json(request): axum::Json<ReleaseRequest>,
) -> Response
where
    J: JobRepository + 'static,
    A: ApplicationRepository + 'static,
    C: CompletionClient + 'static,
{
    match service.release(&SessionId(session_id), request.velocity_x) {
        Ok(Some(receipt)) => (StatusCode::OK, axum::Json(receipt_payload(&receipt))).into_response(),
        Ok(None) => {
            let payload = json!({ "outcome": "snapped_back" });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn swipe_handler<J, A, C>(
    State(service): State<SharedService<J, A, C>>,
    Path(session_id): Path<String>,
    axum::Json(request): axum::Json<SwipeRequest>,
) -> Response
where
    J: JobRepository + 'static,
    A: ApplicationRepository + 'static,
    C: CompletionClient + 'static,
{
    match service.swipe(&SessionId(session_id), request.direction) {
        Ok(receipt) => (StatusCode::OK, axum::Json(receipt_payload(&receipt))).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn settle_handler<J, A, C>(
    State(service): State<SharedService<J, A, C>>,
    Path(session_id): Path<String>,
) -> Response
where
    J: JobRepository + 'static,
    A: ApplicationRepository + 'static,
    C: CompletionClient + 'static,
{
    match service.settle(&SessionId(session_id)) {
        Ok(settled) => {
            let payload = json!({ "settled": settled });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn undo_handler<J, A, C>(
    State(service): State<SharedService<J, A, C>>,
    Path(session_id): Path<String>,
) -> Response
where
    J: JobRepository + 'static,
    A: ApplicationRepository + 'static,
    C: CompletionClient + 'static,
{
    match service.undo(&SessionId(session_id)) {
        Ok(outcome) => {
            let payload = json!({
                "jobId": outcome.job.id,
                "direction": outcome.direction,
                "applicationRetained": outcome.application_retained,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn application_handler<J, A, C>(
    State(service): State<SharedService<J, A, C>>,
    Path(application_id): Path<String>,
) -> Response
where
    J: JobRepository + 'static,
    A: ApplicationRepository + 'static,
    C: CompletionClient + 'static,
{
    match service.application(&ApplicationId(application_id)) {
        Ok(application) => {
            let tier = application.match_score.tier();
            let payload = json!({
                "application": application,
                "tier": tier,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn review_handler<J, A, C>(
    State(service): State<SharedService<J, A, C>>,
    Path(application_id): Path<String>,
    axum::Json(request): axum::Json<ReviewRequest>,
) -> Response
where
    J: JobRepository + 'static,
    A: ApplicationRepository + 'static,
    C: CompletionClient + 'static,
{
    match service.review(&ApplicationId(application_id), request.status) {
        Ok(application) => (StatusCode::OK, axum::Json(application)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn applicants_handler<J, A, C>(
    State(service): State<SharedService<J, A, C>>,
    Path(recruiter_id): Path<String>,
    Query(query): Query<ApplicantsQuery>,
) -> Response
where
    J: JobRepository + 'static,
    A: ApplicationRepository + 'static,
    C: CompletionClient + 'static,
{
    let job_id = query.job_id.map(JobId);
    match service.applicants(&RecruiterId(recruiter_id), job_id.as_ref()) {
        Ok(applicants) => (StatusCode::OK, axum::Json(applicants)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn refine_handler<J, A, C>(
    State(service): State<SharedService<J, A, C>>,
    axum::Json(request): axum::Json<RefineRequest>,
) -> Response
where
    J: JobRepository + 'static,
    A: ApplicationRepository + 'static,
    C: CompletionClient + 'static,
{
    match service.refine(&request).await {
        Ok(refined) => (StatusCode::OK, axum::Json(refined)).into_response(),
        Err(error) => error.into_response(),
    }
}

fn receipt_payload(receipt: &SwipeReceipt) -> serde_json::Value {
    json!({
        "outcome": "committed",
        "jobId": receipt.job_id,
        "direction": receipt.direction,
        "remaining": receipt.remaining,
        "source": receipt.source,
        "applicationQueued": receipt.application_queued(),
    })
}

impl SwipeServiceError {
    /// HTTP status used wherever a swipe service failure reaches a client.
    pub fn status_code(&self) -> StatusCode {
        match self {
            SwipeServiceError::SessionNotFound(_) | SwipeServiceError::ApplicationNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            SwipeServiceError::Session(_) => StatusCode::CONFLICT,
            SwipeServiceError::Review(ReviewError::InvalidTransition { .. })
            | SwipeServiceError::Refine(RefineError::InvalidInput(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            SwipeServiceError::Refine(_) => StatusCode::BAD_GATEWAY,
            SwipeServiceError::RefinementDisabled | SwipeServiceError::Feed(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            SwipeServiceError::Repository(_) | SwipeServiceError::Review(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for SwipeServiceError {
    fn into_response(self) -> Response {
        let payload = json!({
            "error": self.to_string(),
        });
        (self.status_code(), axum::Json(payload)).into_response()
    }
}
