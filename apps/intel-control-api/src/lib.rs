use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use intel_scheduler::Scheduler;
use serde::Serialize;
use tower_http::trace::TraceLayer;

/// Shared state for the control surface: just the scheduler. No dashboard
/// state, no auth glue — that lives outside this spec's scope.
#[derive(Clone)]
pub struct AppState {
    pub scheduler: Arc<Scheduler>,
}

/// Builds the job-control router: list/run_now/pause/resume/status, exactly
/// §6's surface and nothing else.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/jobs", get(list_jobs))
        .route("/jobs/:job_id/run", post(run_job_now))
        .route("/jobs/:job_id/pause", post(pause_job))
        .route("/jobs/:job_id/resume", post(resume_job))
        .route("/status", get(status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct RunResult {
    ok: bool,
}

async fn list_jobs(State(state): State<AppState>) -> Json<Vec<intel_scheduler::status::JobStatus>> {
    match state.scheduler.status().await {
        Ok(status) => Json(status.jobs),
        Err(e) => {
            tracing::error!(error = %e, "failed to build job list");
            Json(Vec::new())
        }
    }
}

async fn run_job_now(State(state): State<AppState>, Path(job_id): Path<String>) -> Json<RunResult> {
    Json(RunResult { ok: state.scheduler.run_now(&job_id).await })
}

async fn pause_job(State(state): State<AppState>, Path(job_id): Path<String>) -> Json<RunResult> {
    state.scheduler.pause(&job_id).await;
    Json(RunResult { ok: true })
}

async fn resume_job(State(state): State<AppState>, Path(job_id): Path<String>) -> Json<RunResult> {
    state.scheduler.resume(&job_id).await;
    Json(RunResult { ok: true })
}

async fn status(State(state): State<AppState>) -> Json<Option<intel_scheduler::SchedulerStatus>> {
    match state.scheduler.status().await {
        Ok(status) => Json(Some(status)),
        Err(e) => {
            tracing::error!(error = %e, "failed to build scheduler status");
            Json(None)
        }
    }
}
