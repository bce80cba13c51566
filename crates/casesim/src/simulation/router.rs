use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{DecisionPointId, SimulationId, TranscriptEntry};
use super::service::{ServiceError, SimulationService};
use super::store::SimulationStore;
use super::workspace::{DecisionSubmission, SubmitOutcome, WorkspaceError};
use crate::debrief::clients::{JobQueueError, ScoringJobs};
use crate::debrief::domain::JobId;
use crate::debrief::poller::PollError;

/// Router builder exposing the simulation and debrief endpoints.
pub fn simulation_router<S, J>(service: Arc<SimulationService<S, J>>) -> Router
where
    S: SimulationStore + 'static,
    J: ScoringJobs + 'static,
{
    Router::new()
        .route(
            "/api/v1/simulations/:simulation_id",
            get(state_handler::<S, J>),
        )
        .route(
            "/api/v1/simulations/:simulation_id/decisions",
            post(submit_handler::<S, J>),
        )
        .route(
            "/api/v1/simulations/:simulation_id/paywall/dismiss",
            post(dismiss_paywall_handler::<S, J>),
        )
        .route(
            "/api/v1/simulations/:simulation_id/draft",
            put(draft_handler::<S, J>),
        )
        .route(
            "/api/v1/simulations/:simulation_id/complete",
            post(complete_handler::<S, J>),
        )
        .route(
            "/api/v1/debrief/jobs/:job_id",
            get(job_status_handler::<S, J>),
        )
        .route(
            "/api/v1/debrief/jobs/:job_id/result",
            get(job_result_handler::<S, J>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitDecisionRequest {
    pub(crate) decision_point_id: String,
    #[serde(default)]
    pub(crate) selected_option: Option<String>,
    pub(crate) justification: String,
    #[serde(default)]
    pub(crate) transcript: Vec<TranscriptEntry>,
    #[serde(default)]
    pub(crate) persona_opened: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DraftRequest {
    pub(crate) text: String,
}

pub(crate) async fn submit_handler<S, J>(
    State(service): State<Arc<SimulationService<S, J>>>,
    Path(simulation_id): Path<String>,
    axum::Json(request): axum::Json<SubmitDecisionRequest>,
) -> Response
where
    S: SimulationStore + 'static,
    J: ScoringJobs + 'static,
{
    let id = SimulationId(simulation_id);
    let submission = DecisionSubmission {
        decision_point_id: DecisionPointId(request.decision_point_id),
        selected_option: request.selected_option,
        justification: request.justification,
        transcript: request.transcript,
        persona_opened: request.persona_opened,
    };

    match service.submit_decision(&id, submission) {
        Ok(outcome @ SubmitOutcome::Rejected { .. }) => {
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(outcome)).into_response()
        }
        Ok(outcome @ SubmitOutcome::PaywallBlocked { .. }) => {
            (StatusCode::PAYMENT_REQUIRED, axum::Json(outcome)).into_response()
        }
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn state_handler<S, J>(
    State(service): State<Arc<SimulationService<S, J>>>,
    Path(simulation_id): Path<String>,
) -> Response
where
    S: SimulationStore + 'static,
    J: ScoringJobs + 'static,
{
    let id = SimulationId(simulation_id);
    match service.get_state(&id) {
        Ok(Some(state)) => (StatusCode::OK, axum::Json(state)).into_response(),
        Ok(None) => not_found("no simulation found for this id"),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn dismiss_paywall_handler<S, J>(
    State(service): State<Arc<SimulationService<S, J>>>,
    Path(simulation_id): Path<String>,
) -> Response
where
    S: SimulationStore + 'static,
    J: ScoringJobs + 'static,
{
    let id = SimulationId(simulation_id);
    match service.dismiss_paywall(&id) {
        Ok(state) => (StatusCode::OK, axum::Json(state)).into_response(),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn draft_handler<S, J>(
    State(service): State<Arc<SimulationService<S, J>>>,
    Path(simulation_id): Path<String>,
    axum::Json(request): axum::Json<DraftRequest>,
) -> Response
where
    S: SimulationStore + 'static,
    J: ScoringJobs + 'static,
{
    let id = SimulationId(simulation_id);
    let status = service.record_draft(&id, request.text);
    let snapshot = status.borrow().clone();
    (StatusCode::ACCEPTED, axum::Json(json!({ "save": snapshot }))).into_response()
}

pub(crate) async fn complete_handler<S, J>(
    State(service): State<Arc<SimulationService<S, J>>>,
    Path(simulation_id): Path<String>,
) -> Response
where
    S: SimulationStore + 'static,
    J: ScoringJobs + 'static,
{
    let id = SimulationId(simulation_id);
    match service.complete_simulation(&id).await {
        Ok(job_id) => (
            StatusCode::ACCEPTED,
            axum::Json(json!({ "job_id": job_id.0 })),
        )
            .into_response(),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn job_status_handler<S, J>(
    State(service): State<Arc<SimulationService<S, J>>>,
    Path(job_id): Path<String>,
) -> Response
where
    S: SimulationStore + 'static,
    J: ScoringJobs + 'static,
{
    match service.job_status(&JobId(job_id)).await {
        Ok(snapshot) => (StatusCode::OK, axum::Json(snapshot)).into_response(),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn job_result_handler<S, J>(
    State(service): State<Arc<SimulationService<S, J>>>,
    Path(job_id): Path<String>,
) -> Response
where
    S: SimulationStore + 'static,
    J: ScoringJobs + 'static,
{
    match service.await_result(&JobId(job_id)).await {
        Ok(debrief) => (StatusCode::OK, axum::Json(debrief)).into_response(),
        Err(PollError::Timeout) => {
            let payload = json!({
                "status": "processing",
                "message": PollError::Timeout.to_string(),
            });
            (StatusCode::ACCEPTED, axum::Json(payload)).into_response()
        }
        Err(err @ PollError::JobFailed(_)) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::BAD_GATEWAY, axum::Json(payload)).into_response()
        }
        Err(PollError::Queue(JobQueueError::UnknownJob)) => not_found("unknown job id"),
        Err(err) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

fn service_error_response(err: ServiceError) -> Response {
    let status = match &err {
        ServiceError::Workspace(WorkspaceError::StageMismatch { .. })
        | ServiceError::Workspace(WorkspaceError::AlreadyComplete { .. })
        | ServiceError::NotYetComplete { .. } => StatusCode::CONFLICT,
        ServiceError::UnknownSimulation => StatusCode::NOT_FOUND,
        ServiceError::Queue(JobQueueError::UnknownJob) => StatusCode::NOT_FOUND,
        ServiceError::Workspace(WorkspaceError::Store(_))
        | ServiceError::Store(_)
        | ServiceError::Queue(_) => StatusCode::SERVICE_UNAVAILABLE,
    };

    let payload = json!({ "error": err.to_string() });
    (status, axum::Json(payload)).into_response()
}

fn not_found(message: &str) -> Response {
    let payload = json!({ "error": message });
    (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
}
