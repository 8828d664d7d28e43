//! Administrative console under `/admin/`.
//!
//! Searchable, filterable tables of packages and jobs with computed
//! duration columns, a package editor, and deletes.

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;
use tracing::info;

use super::views::{
    AdminIndexView, AdminJobDetailView, AdminJobListView, AdminPackageDetailView,
    AdminPackageListView, JobRow, PackageRow, SelectOption, display_time, flag_filter_options,
};
use super::{AppError, AppState, Notice, parse_id, render_template};
use crate::duration::format_hours_minutes;
use crate::forms::{FormErrors, JobBoxForm, JobBoxFormInput};
use crate::model::{self, JobBox};
use crate::store::{JobBoxFilter, JobFilter};

pub const SITE_HEADER: &str = "Work Hours Tracker Administration";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/", get(index))
        .route("/admin/packages/", get(package_list))
        .route("/admin/packages/{id}/", get(package_detail).post(package_update))
        .route("/admin/packages/{id}/delete/", post(package_delete))
        .route("/admin/jobs/", get(job_list))
        .route("/admin/jobs/{id}/", get(job_detail))
        .route("/admin/jobs/{id}/delete/", post(job_delete))
}

/// Read a yes/no list filter; blank or unrecognized values mean "all".
pub fn parse_flag(raw: Option<&str>) -> Option<bool> {
    match raw.map(str::trim)?.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

fn search_term(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_string)
}

/// GET /admin/
async fn index(State(state): State<AppState>) -> Result<Response, AppError> {
    let packages = state.db.list_job_boxes(&JobBoxFilter::default()).await?;
    let counts = state.db.job_counts().await?;
    Ok(render_template(AdminIndexView {
        package_count: packages.len(),
        counts,
    }))
}

// ── Packages ────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct PackageListQuery {
    pub q: Option<String>,
    pub is_active: Option<String>,
    pub notice: Option<String>,
}

/// GET /admin/packages/
async fn package_list(
    State(state): State<AppState>,
    Query(query): Query<PackageListQuery>,
) -> Result<Response, AppError> {
    let is_active = parse_flag(query.is_active.as_deref());
    let filter = JobBoxFilter {
        search: search_term(query.q.as_deref()),
        is_active,
    };
    let now = model::now();
    let boxes = state.db.list_job_boxes(&filter).await?;

    let mut packages = Vec::with_capacity(boxes.len());
    for job_box in &boxes {
        let stats = state.db.job_box_stats(job_box.id, now).await?;
        packages.push(PackageRow::with_stats(
            job_box,
            stats.job_count,
            stats.total_duration,
        ));
    }

    Ok(render_template(AdminPackageListView {
        notice: Notice::message_for(query.notice.as_deref()),
        packages,
        q: query.q.unwrap_or_default(),
        active_filter: flag_filter_options(is_active),
    }))
}

async fn load_job_box(state: &AppState, raw_id: &str) -> Result<JobBox, AppError> {
    let id = parse_id(raw_id)?;
    state.db.get_job_box(id).await?.ok_or(AppError::NotFound)
}

async fn package_detail_view(
    state: &AppState,
    job_box: &JobBox,
    input: JobBoxFormInput,
    errors: FormErrors,
) -> Result<Response, AppError> {
    let stats = state.db.job_box_stats(job_box.id, model::now()).await?;
    Ok(render_template(AdminPackageDetailView {
        package: PackageRow::with_stats(job_box, stats.job_count, stats.total_duration),
        input,
        errors,
    }))
}

/// GET /admin/packages/{id}/
async fn package_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let job_box = load_job_box(&state, &id).await?;
    let input = JobBoxFormInput::from_job_box(&job_box);
    package_detail_view(&state, &job_box, input, FormErrors::new()).await
}

/// POST /admin/packages/{id}/
async fn package_update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(input): Form<JobBoxFormInput>,
) -> Result<Response, AppError> {
    let original = load_job_box(&state, &id).await?;
    let mut job_box = original.clone();
    match JobBoxForm::validate_edit(&input, &mut job_box) {
        Ok(()) => {
            let job_box = state.db.update_job_box(&job_box).await?;
            info!(job_box_id = job_box.id, active = job_box.is_active, "Job package updated by admin");
            Ok(Notice::JobBoxUpdated.redirect("/admin/packages/").into_response())
        }
        Err(errors) => package_detail_view(&state, &original, input, errors).await,
    }
}

/// POST /admin/packages/{id}/delete/
async fn package_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;
    if !state.db.delete_job_box(id).await? {
        return Err(AppError::NotFound);
    }
    Ok(Notice::JobBoxDeleted.redirect("/admin/packages/").into_response())
}

// ── Jobs ────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct JobListQuery {
    pub q: Option<String>,
    pub is_completed: Option<String>,
    pub job_box: Option<String>,
    pub notice: Option<String>,
}

/// GET /admin/jobs/
async fn job_list(
    State(state): State<AppState>,
    Query(query): Query<JobListQuery>,
) -> Result<Response, AppError> {
    let is_completed = parse_flag(query.is_completed.as_deref());
    let job_box_id = query
        .job_box
        .as_deref()
        .and_then(|raw| raw.trim().parse::<i64>().ok());
    let filter = JobFilter {
        search: search_term(query.q.as_deref()),
        is_completed,
        job_box_id,
        ..JobFilter::default()
    };

    let now = model::now();
    let listings = state.db.list_jobs(&filter).await?;
    let boxes = state.db.list_job_boxes(&JobBoxFilter::default()).await?;

    let current = job_box_id.map(|id| id.to_string()).unwrap_or_default();
    let package_filter = std::iter::once(SelectOption::new("", "All", &current))
        .chain(
            boxes
                .iter()
                .map(|b| SelectOption::new(b.id.to_string(), b.title.clone(), &current)),
        )
        .collect();

    Ok(render_template(AdminJobListView {
        notice: Notice::message_for(query.notice.as_deref()),
        jobs: listings.iter().map(|l| JobRow::from_listing(l, now)).collect(),
        q: query.q.unwrap_or_default(),
        completed_filter: flag_filter_options(is_completed),
        package_filter,
    }))
}

/// GET /admin/jobs/{id}/
async fn job_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;
    let job = state.db.get_job(id).await?.ok_or(AppError::NotFound)?;
    let job_box_title = match job.job_box_id {
        Some(box_id) => state.db.get_job_box(box_id).await?.map(|b| b.title),
        None => None,
    };
    let now = model::now();
    Ok(render_template(AdminJobDetailView {
        job: JobRow::new(&job, job_box_title.as_deref(), now),
        hours_minutes: format_hours_minutes(job.duration(now)),
        created: display_time(job.created_at),
        updated: display_time(job.updated_at),
    }))
}

/// POST /admin/jobs/{id}/delete/
async fn job_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;
    if !state.db.delete_job(id).await? {
        return Err(AppError::NotFound);
    }
    info!(job_id = id, "Job deleted by admin");
    Ok(Notice::JobDeleted.redirect("/admin/jobs/").into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_values() {
        assert_eq!(parse_flag(Some("1")), Some(true));
        assert_eq!(parse_flag(Some("Yes")), Some(true));
        assert_eq!(parse_flag(Some("false")), Some(false));
        assert_eq!(parse_flag(Some("0")), Some(false));
        assert_eq!(parse_flag(Some("")), None);
        assert_eq!(parse_flag(Some("maybe")), None);
        assert_eq!(parse_flag(None), None);
    }

    #[test]
    fn blank_search_is_no_search() {
        assert_eq!(search_term(Some("   ")), None);
        assert_eq!(search_term(Some(" acme ")).as_deref(), Some("acme"));
        assert_eq!(search_term(None), None);
    }
}
