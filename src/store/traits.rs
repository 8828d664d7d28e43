//! `Database` trait: single async interface for all persistence.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};

use crate::error::DatabaseError;
use crate::model::{Job, JobBox, NewJob, NewJobBox};

/// Aggregate job counts shown on the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobCounts {
    pub total: i64,
    /// Jobs without an end time.
    pub running: i64,
    /// Jobs flagged completed.
    pub completed: i64,
}

/// Computed statistics for one package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobBoxStats {
    pub job_count: i64,
    /// Sum of completed job durations.
    pub total_duration: TimeDelta,
}

/// A job joined with its package title.
#[derive(Debug, Clone, PartialEq)]
pub struct JobListing {
    pub job: Job,
    pub job_box_title: Option<String>,
}

/// Selection for job listings, newest start time first.
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    /// Case-insensitive substring of the job title or package title.
    pub search: Option<String>,
    pub is_completed: Option<bool>,
    pub job_box_id: Option<i64>,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl JobFilter {
    pub fn in_job_box(job_box_id: i64) -> Self {
        Self {
            job_box_id: Some(job_box_id),
            ..Self::default()
        }
    }

    /// One page of `page_size` jobs; pages count from 1.
    pub fn page(page: usize, page_size: usize) -> Self {
        Self {
            limit: Some(page_size),
            offset: page.saturating_sub(1) * page_size,
            ..Self::default()
        }
    }
}

/// Selection for package listings, newest first.
#[derive(Debug, Clone, Default)]
pub struct JobBoxFilter {
    /// Case-insensitive substring of the title.
    pub search: Option<String>,
    pub is_active: Option<bool>,
}

/// Backend-agnostic database trait covering jobs and packages.
///
/// Writes apply the model's save-time rules and invariants; a row that
/// breaks them is rejected with [`DatabaseError::Validation`].
#[async_trait]
pub trait Database: Send + Sync {
    /// Run all pending schema migrations.
    async fn run_migrations(&self) -> Result<(), DatabaseError>;

    // ── Packages ────────────────────────────────────────────────────

    /// Insert a package and return it as stored.
    async fn create_job_box(&self, new: &NewJobBox) -> Result<JobBox, DatabaseError>;

    async fn get_job_box(&self, id: i64) -> Result<Option<JobBox>, DatabaseError>;

    /// Persist title and active flag, refreshing `updated_at`.
    async fn update_job_box(&self, job_box: &JobBox) -> Result<JobBox, DatabaseError>;

    /// Delete a package and every job in it. Returns `false` if it did not exist.
    async fn delete_job_box(&self, id: i64) -> Result<bool, DatabaseError>;

    async fn list_job_boxes(&self, filter: &JobBoxFilter) -> Result<Vec<JobBox>, DatabaseError>;

    /// Active packages, newest first.
    async fn list_active_job_boxes(&self) -> Result<Vec<JobBox>, DatabaseError> {
        self.list_job_boxes(&JobBoxFilter {
            is_active: Some(true),
            ..JobBoxFilter::default()
        })
        .await
    }

    /// Job count and completed total for one package, as of `now`.
    async fn job_box_stats(
        &self,
        id: i64,
        now: DateTime<Utc>,
    ) -> Result<JobBoxStats, DatabaseError>;

    // ── Jobs ────────────────────────────────────────────────────────

    /// Insert a job and return it as stored.
    async fn create_job(&self, new: &NewJob) -> Result<Job, DatabaseError>;

    async fn get_job(&self, id: i64) -> Result<Option<Job>, DatabaseError>;

    /// Persist the editable fields of a job, refreshing `updated_at`.
    async fn update_job(&self, job: &Job) -> Result<Job, DatabaseError>;

    /// Returns `false` if the job did not exist.
    async fn delete_job(&self, id: i64) -> Result<bool, DatabaseError>;

    /// Stop a running job at `at`.
    ///
    /// Returns `None` when no job with this id is running, including when a
    /// concurrent stop got there first; the end time is then left untouched.
    async fn stop_job(&self, id: i64, at: DateTime<Utc>) -> Result<Option<Job>, DatabaseError>;

    async fn list_jobs(&self, filter: &JobFilter) -> Result<Vec<JobListing>, DatabaseError>;

    async fn job_counts(&self) -> Result<JobCounts, DatabaseError>;
}
