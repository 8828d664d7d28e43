//! Server-rendered pages: dashboard, job and package CRUD.

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;
use tracing::info;

use super::views::{
    DashboardView, JobDetailView, JobFormView, JobRow, PackageDetailView, PackageFormView,
    PackageRow, Pagination, display_time, package_options,
};
use super::{AppError, AppState, Notice, parse_id, render_template};
use crate::forms::{FormErrors, JobBoxForm, JobBoxFormInput, JobForm, JobFormInput};
use crate::model::{self, Job};
use crate::store::JobFilter;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard))
        .route("/job/create/", get(new_job).post(create_job))
        .route("/job/{id}/", get(job_detail))
        .route("/job/{id}/edit/", get(edit_job).post(update_job))
        .route("/job/{id}/delete/", post(delete_job))
        .route("/package/create/", get(new_package).post(create_package))
        .route("/package/{id}/", get(package_detail))
}

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub page: Option<String>,
    pub notice: Option<String>,
}

/// GET /
async fn dashboard(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Result<Response, AppError> {
    let now = model::now();
    let counts = state.db.job_counts().await?;
    let page_size = state.config.page_size;
    let total = usize::try_from(counts.total).unwrap_or_default();
    let page = Pagination::new(query.page.as_deref(), total, page_size);

    let listings = state
        .db
        .list_jobs(&JobFilter::page(page.number, page_size))
        .await?;
    let active = state.db.list_active_job_boxes().await?;

    let view = DashboardView {
        notice: Notice::message_for(query.notice.as_deref()),
        jobs: listings.iter().map(|l| JobRow::from_listing(l, now)).collect(),
        packages: active.iter().map(PackageRow::new).collect(),
        counts,
        page,
        package_options: package_options(&active, ""),
    };
    Ok(render_template(view))
}

// ── Jobs ────────────────────────────────────────────────────────────

fn job_form_view(
    existing: Option<&Job>,
    input: JobFormInput,
    errors: FormErrors,
    active: &[model::JobBox],
) -> JobFormView {
    let (heading, action, submit_label) = match existing {
        Some(job) => (
            format!("Edit Job: {}", job.title),
            format!("/job/{}/edit/", job.id),
            "Update Job",
        ),
        None => (
            "Create New Job".to_string(),
            "/job/create/".to_string(),
            "Create Job",
        ),
    };
    JobFormView {
        heading,
        action,
        submit_label: submit_label.to_string(),
        package_options: package_options(active, &input.job_box),
        input,
        errors,
    }
}

/// GET /job/create/
async fn new_job(State(state): State<AppState>) -> Result<Response, AppError> {
    let active = state.db.list_active_job_boxes().await?;
    let input = JobFormInput::starting_at(model::now());
    Ok(render_template(job_form_view(None, input, FormErrors::new(), &active)))
}

/// POST /job/create/
async fn create_job(
    State(state): State<AppState>,
    Form(input): Form<JobFormInput>,
) -> Result<Response, AppError> {
    let active = state.db.list_active_job_boxes().await?;
    match JobForm::validate(&input, &active, None, model::now()) {
        Ok(cleaned) => {
            let job = state.db.create_job(&cleaned.into_new_job()).await?;
            info!(job_id = job.id, title = %job.title, "Job created");
            Ok(Notice::JobCreated.redirect("/").into_response())
        }
        Err(errors) => Ok(render_template(job_form_view(None, input, errors, &active))),
    }
}

async fn load_job(state: &AppState, raw_id: &str) -> Result<Job, AppError> {
    let id = parse_id(raw_id)?;
    state.db.get_job(id).await?.ok_or(AppError::NotFound)
}

/// GET /job/{id}/edit/
async fn edit_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let job = load_job(&state, &id).await?;
    let active = state.db.list_active_job_boxes().await?;
    let input = JobFormInput::from_job(&job);
    Ok(render_template(job_form_view(
        Some(&job),
        input,
        FormErrors::new(),
        &active,
    )))
}

/// POST /job/{id}/edit/
async fn update_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(input): Form<JobFormInput>,
) -> Result<Response, AppError> {
    let mut job = load_job(&state, &id).await?;
    let active = state.db.list_active_job_boxes().await?;
    match JobForm::validate(&input, &active, Some(&job), model::now()) {
        Ok(cleaned) => {
            cleaned.apply_to(&mut job);
            let job = state.db.update_job(&job).await?;
            info!(job_id = job.id, completed = job.is_completed, "Job updated");
            Ok(Notice::JobUpdated.redirect("/").into_response())
        }
        Err(errors) => Ok(render_template(job_form_view(
            Some(&job),
            input,
            errors,
            &active,
        ))),
    }
}

/// POST /job/{id}/delete/
async fn delete_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;
    if !state.db.delete_job(id).await? {
        return Err(AppError::NotFound);
    }
    info!(job_id = id, "Job deleted");
    Ok(Notice::JobDeleted.redirect("/").into_response())
}

/// GET /job/{id}/
async fn job_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let job = load_job(&state, &id).await?;
    let job_box_title = match job.job_box_id {
        Some(box_id) => state.db.get_job_box(box_id).await?.map(|b| b.title),
        None => None,
    };
    let view = JobDetailView {
        job: JobRow::new(&job, job_box_title.as_deref(), model::now()),
        created: display_time(job.created_at),
        updated: display_time(job.updated_at),
    };
    Ok(render_template(view))
}

// ── Packages ────────────────────────────────────────────────────────

/// GET /package/create/
async fn new_package() -> Response {
    render_template(PackageFormView {
        input: JobBoxFormInput::default(),
        errors: FormErrors::new(),
    })
}

/// POST /package/create/
async fn create_package(
    State(state): State<AppState>,
    Form(input): Form<JobBoxFormInput>,
) -> Result<Response, AppError> {
    match JobBoxForm::validate(&input) {
        Ok(new) => {
            let job_box = state.db.create_job_box(&new).await?;
            info!(job_box_id = job_box.id, title = %job_box.title, "Job package created");
            Ok(Notice::JobBoxCreated.redirect("/").into_response())
        }
        Err(errors) => Ok(render_template(PackageFormView { input, errors })),
    }
}

/// GET /package/{id}/
async fn package_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;
    let job_box = state.db.get_job_box(id).await?.ok_or(AppError::NotFound)?;
    let now = model::now();
    let stats = state.db.job_box_stats(id, now).await?;
    let jobs = state.db.list_jobs(&JobFilter::in_job_box(id)).await?;

    let view = PackageDetailView {
        package: PackageRow::with_stats(&job_box, stats.job_count, stats.total_duration),
        jobs: jobs.iter().map(|l| JobRow::from_listing(l, now)).collect(),
    };
    Ok(render_template(view))
}
