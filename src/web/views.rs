//! Askama view models.
//!
//! Templates only see display-ready strings and flags; all formatting
//! happens here.

use askama::Template;
use chrono::{DateTime, Utc};

use crate::duration::{
    format_admin_duration, format_duration, format_duration_compact, format_duration_hours,
    format_hours_minutes,
};
use crate::forms::{FormErrors, JobBoxFormInput, JobFormInput};
use crate::model::{Job, JobBox};
use crate::store::{JobCounts, JobListing};

const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M";

pub fn display_time(dt: DateTime<Utc>) -> String {
    dt.format(DISPLAY_FORMAT).to_string()
}

// ── Shared rows ─────────────────────────────────────────────────────

/// One job as shown in tables.
#[derive(Debug, Clone)]
pub struct JobRow {
    pub id: i64,
    pub title: String,
    pub start: String,
    pub end: String,
    pub duration: String,
    pub compact_duration: String,
    /// `"{h}h {m}m"` or `"-"`, for the admin columns.
    pub admin_duration: String,
    pub job_box_id: Option<i64>,
    pub job_box_title: String,
    pub is_running: bool,
    pub is_completed: bool,
    pub status_badge: String,
}

impl JobRow {
    pub fn new(job: &Job, job_box_title: Option<&str>, now: DateTime<Utc>) -> Self {
        let duration = job.duration(now);
        Self {
            id: job.id,
            title: job.title.clone(),
            start: display_time(job.start_time),
            end: job.end_time.map(display_time).unwrap_or_else(|| "-".to_string()),
            duration: format_duration(duration),
            compact_duration: format_duration_compact(duration),
            admin_duration: format_admin_duration(duration),
            job_box_id: job.job_box_id,
            job_box_title: job_box_title.unwrap_or("-").to_string(),
            is_running: job.is_running(),
            is_completed: job.is_completed,
            status_badge: status_badge(job.is_completed),
        }
    }

    pub fn from_listing(listing: &JobListing, now: DateTime<Utc>) -> Self {
        Self::new(&listing.job, listing.job_box_title.as_deref(), now)
    }
}

/// Colored completion label for admin tables.
pub fn status_badge(is_completed: bool) -> String {
    let (color, label) = if is_completed {
        ("#10b981", "✓ Completed")
    } else {
        ("#f59e0b", "⏱ Active")
    };
    format!(r#"<span style="color: {color}; font-weight: bold;">{label}</span>"#)
}

/// One package as shown in tables.
#[derive(Debug, Clone)]
pub struct PackageRow {
    pub id: i64,
    pub title: String,
    pub created: String,
    pub updated: String,
    pub is_active: bool,
    pub job_count: i64,
    pub total: String,
    pub total_hours: String,
}

impl PackageRow {
    /// A row without statistics, for the dashboard.
    pub fn new(job_box: &JobBox) -> Self {
        Self {
            id: job_box.id,
            title: job_box.title.clone(),
            created: display_time(job_box.created_at),
            updated: display_time(job_box.updated_at),
            is_active: job_box.is_active,
            job_count: 0,
            total: String::new(),
            total_hours: String::new(),
        }
    }

    pub fn with_stats(job_box: &JobBox, job_count: i64, total: chrono::TimeDelta) -> Self {
        Self {
            job_count,
            total: format_hours_minutes(total),
            total_hours: format_duration_hours(total),
            ..Self::new(job_box)
        }
    }
}

/// An `<option>` in a select box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>, current: &str) -> Self {
        let value = value.into();
        Self {
            selected: value == current,
            value,
            label: label.into(),
        }
    }
}

/// Package choices, led by an empty "no package" entry.
pub fn package_options(packages: &[JobBox], current: &str) -> Vec<SelectOption> {
    let current = current.trim();
    std::iter::once(SelectOption::new("", "---------", current))
        .chain(
            packages
                .iter()
                .map(|b| SelectOption::new(b.id.to_string(), b.title.clone(), current)),
        )
        .collect()
}

/// Page navigation for the dashboard.
///
/// Missing or non-numeric page numbers show the first page; numbers past
/// either end show the nearest valid page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub number: usize,
    pub num_pages: usize,
}

impl Pagination {
    pub fn new(requested: Option<&str>, total: usize, page_size: usize) -> Self {
        let num_pages = total.div_ceil(page_size.max(1)).max(1);
        let number = match requested.map(str::trim).and_then(|p| p.parse::<i64>().ok()) {
            None => 1,
            Some(n) if n < 1 => 1,
            Some(n) => usize::try_from(n).unwrap_or(num_pages).min(num_pages),
        };
        Self { number, num_pages }
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn previous(&self) -> usize {
        self.number.saturating_sub(1).max(1)
    }

    pub fn next(&self) -> usize {
        (self.number + 1).min(self.num_pages)
    }

    pub fn has_other_pages(&self) -> bool {
        self.num_pages > 1
    }
}

// ── Pages ───────────────────────────────────────────────────────────

#[derive(Template)]
#[template(path = "home.html")]
pub struct DashboardView {
    pub notice: Option<String>,
    pub jobs: Vec<JobRow>,
    pub packages: Vec<PackageRow>,
    pub counts: JobCounts,
    pub page: Pagination,
    pub package_options: Vec<SelectOption>,
}

#[derive(Template)]
#[template(path = "job_form.html")]
pub struct JobFormView {
    pub heading: String,
    pub action: String,
    pub submit_label: String,
    pub input: JobFormInput,
    pub errors: FormErrors,
    pub package_options: Vec<SelectOption>,
}

#[derive(Template)]
#[template(path = "job_detail.html")]
pub struct JobDetailView {
    pub job: JobRow,
    pub created: String,
    pub updated: String,
}

#[derive(Template)]
#[template(path = "package_form.html")]
pub struct PackageFormView {
    pub input: JobBoxFormInput,
    pub errors: FormErrors,
}

#[derive(Template)]
#[template(path = "package_detail.html")]
pub struct PackageDetailView {
    pub package: PackageRow,
    pub jobs: Vec<JobRow>,
}

#[derive(Template)]
#[template(path = "not_found.html")]
pub struct NotFoundView;

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorView {
    pub message: String,
}

// ── Admin ───────────────────────────────────────────────────────────

#[derive(Template)]
#[template(path = "admin/index.html")]
pub struct AdminIndexView {
    pub package_count: usize,
    pub counts: JobCounts,
}

#[derive(Template)]
#[template(path = "admin/package_list.html")]
pub struct AdminPackageListView {
    pub notice: Option<String>,
    pub packages: Vec<PackageRow>,
    pub q: String,
    pub active_filter: Vec<SelectOption>,
}

#[derive(Template)]
#[template(path = "admin/package_detail.html")]
pub struct AdminPackageDetailView {
    pub package: PackageRow,
    pub input: JobBoxFormInput,
    pub errors: FormErrors,
}

#[derive(Template)]
#[template(path = "admin/job_list.html")]
pub struct AdminJobListView {
    pub notice: Option<String>,
    pub jobs: Vec<JobRow>,
    pub q: String,
    pub completed_filter: Vec<SelectOption>,
    pub package_filter: Vec<SelectOption>,
}

#[derive(Template)]
#[template(path = "admin/job_detail.html")]
pub struct AdminJobDetailView {
    pub job: JobRow,
    pub hours_minutes: String,
    pub created: String,
    pub updated: String,
}

/// Yes/No/All choices for a boolean list filter.
pub fn flag_filter_options(current: Option<bool>) -> Vec<SelectOption> {
    let current = match current {
        None => "",
        Some(true) => "1",
        Some(false) => "0",
    };
    vec![
        SelectOption::new("", "All", current),
        SelectOption::new("1", "Yes", current),
        SelectOption::new("0", "No", current),
    ]
}
