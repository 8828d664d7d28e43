//! JSON endpoints used by the dashboard script.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;
use tracing::{debug, info};

use super::{AppError, AppState, FormOrJson};
use crate::duration::format_duration;
use crate::forms::{QuickJobForm, QuickJobInput};
use crate::model;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/quick-start/", post(quick_start))
        .route("/api/job/{id}/stop/", post(stop_job))
}

/// POST /api/quick-start/
///
/// Starts a job now from just a title and optional package. Invalid input
/// is reported in the body with a 200 status.
async fn quick_start(
    State(state): State<AppState>,
    FormOrJson(input): FormOrJson<QuickJobInput>,
) -> Result<Response, AppError> {
    let now = model::now();
    let active = state.db.list_active_job_boxes().await?;

    let new = match QuickJobForm::validate(&input, &active, now) {
        Ok(new) => new,
        Err(errors) => {
            debug!(title = %input.title, "Quick-start rejected");
            return Ok(Json(json!({
                "success": false,
                "message": "Invalid form data",
                "errors": errors,
            }))
            .into_response());
        }
    };

    let job = state.db.create_job(&new).await?;
    info!(job_id = job.id, title = %job.title, "Job started");
    Ok(Json(json!({
        "success": true,
        "message": format!("Job \"{}\" started successfully!", job.title),
        "job_id": job.id,
    }))
    .into_response())
}

fn stop_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "message": "Job not found or already stopped",
        })),
    )
        .into_response()
}

/// POST /api/job/{id}/stop/
///
/// Stops a running job. Of concurrent stops for one job exactly one
/// succeeds; the rest get 404.
async fn stop_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let Ok(id) = id.parse::<i64>() else {
        return Ok(stop_not_found());
    };

    let now = model::now();
    let Some(job) = state.db.stop_job(id, now).await? else {
        debug!(job_id = id, "Stop requested for a job that is not running");
        return Ok(stop_not_found());
    };

    let duration = format_duration(job.duration(now));
    info!(job_id = job.id, duration = %duration, "Job stopped");
    Ok(Json(json!({
        "success": true,
        "message": format!("Job \"{}\" stopped successfully!", job.title),
        "duration": duration,
    }))
    .into_response())
}
