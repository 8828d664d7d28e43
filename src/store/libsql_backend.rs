//! libSQL backend: async `Database` trait implementation.
//!
//! Supports local file and in-memory databases. Timestamps are stored as
//! fixed-width RFC 3339 UTC strings so that text ordering is time ordering.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};

use crate::error::DatabaseError;
use crate::model::{self, Job, JobBox, NewJob, NewJobBox, total_duration};
use crate::store::migrations;
use crate::store::traits::{
    Database, JobBoxFilter, JobBoxStats, JobCounts, JobFilter, JobListing,
};

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations. Every
/// write is one statement, so no explicit transaction is ever open on it.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let backend = Self::from_database(db)?;
        backend.init_schema().await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let backend = Self::from_database(db)?;
        backend.init_schema().await?;
        Ok(backend)
    }

    fn from_database(db: LibSqlDatabase) -> Result<Self, DatabaseError> {
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;
        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }

    /// Enable foreign keys, then migrate.
    async fn init_schema(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to enable foreign keys: {e}")))?;
        self.run_migrations().await
    }

    /// Get the connection.
    fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Canonical write format: `2026-03-02T09:30:00.000000Z`.
fn format_ts(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

fn opt_integer(v: Option<i64>) -> libsql::Value {
    match v {
        Some(v) => libsql::Value::Integer(v),
        None => libsql::Value::Null,
    }
}

fn opt_bool(v: Option<bool>) -> libsql::Value {
    opt_integer(v.map(i64::from))
}

fn opt_text(v: Option<String>) -> libsql::Value {
    match v {
        Some(s) => libsql::Value::Text(s),
        None => libsql::Value::Null,
    }
}

/// `%term%` for LIKE, with `\` escaping the wildcards in `term`.
fn like_pattern(term: Option<&str>) -> libsql::Value {
    let term = term.map(str::trim).filter(|t| !t.is_empty());
    opt_text(term.map(|t| {
        let escaped = t
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        format!("%{escaped}%")
    }))
}

/// Classify a failed write: constraint failures are reported separately.
fn write_error(op: &str, e: libsql::Error) -> DatabaseError {
    let message = e.to_string();
    if message.contains("constraint") {
        DatabaseError::Constraint(format!("{op}: {message}"))
    } else {
        DatabaseError::Query(format!("{op}: {message}"))
    }
}

fn query_error(op: &'static str) -> impl Fn(libsql::Error) -> DatabaseError {
    move |e| DatabaseError::Query(format!("{op}: {e}"))
}

const JOB_COLUMNS: &str = "jobs.id, jobs.title, jobs.start_time, jobs.end_time, jobs.job_box_id, jobs.is_completed, jobs.created_at, jobs.updated_at";

const JOB_BOX_COLUMNS: &str = "id, title, created_at, updated_at, is_active";

/// Map a libsql Row to a Job. Column order matches JOB_COLUMNS.
fn row_to_job(row: &libsql::Row) -> Result<Job, DatabaseError> {
    let parse = query_error("row_to_job");
    let start: String = row.get(2).map_err(&parse)?;
    let created: String = row.get(6).map_err(&parse)?;
    let updated: String = row.get(7).map_err(&parse)?;
    Ok(Job {
        id: row.get(0).map_err(&parse)?,
        title: row.get(1).map_err(&parse)?,
        start_time: parse_datetime(&start),
        end_time: row.get::<String>(3).ok().map(|s| parse_datetime(&s)),
        job_box_id: row.get::<i64>(4).ok(),
        is_completed: row.get::<i64>(5).map_err(&parse)? != 0,
        created_at: parse_datetime(&created),
        updated_at: parse_datetime(&updated),
    })
}

/// Map a libsql Row to a JobBox. Column order matches JOB_BOX_COLUMNS.
fn row_to_job_box(row: &libsql::Row) -> Result<JobBox, DatabaseError> {
    let parse = query_error("row_to_job_box");
    let created: String = row.get(2).map_err(&parse)?;
    let updated: String = row.get(3).map_err(&parse)?;
    Ok(JobBox {
        id: row.get(0).map_err(&parse)?,
        title: row.get(1).map_err(&parse)?,
        created_at: parse_datetime(&created),
        updated_at: parse_datetime(&updated),
        is_active: row.get::<i64>(4).map_err(&parse)? != 0,
    })
}

impl LibSqlBackend {
    async fn query_jobs(
        &self,
        op: &'static str,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Vec<Job>, DatabaseError> {
        let mut rows = self.conn().query(sql, params).await.map_err(query_error(op))?;
        let mut jobs = Vec::new();
        while let Some(row) = rows.next().await.map_err(query_error(op))? {
            jobs.push(row_to_job(&row)?);
        }
        Ok(jobs)
    }

    async fn inserted_id(
        &self,
        op: &'static str,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<i64, DatabaseError> {
        let mut rows = self
            .conn()
            .query(sql, params)
            .await
            .map_err(|e| write_error(op, e))?;
        let row = rows
            .next()
            .await
            .map_err(|e| write_error(op, e))?
            .ok_or_else(|| DatabaseError::Query(format!("{op}: no id returned")))?;
        row.get::<i64>(0).map_err(query_error(op))
    }
}

// ── Trait implementation ────────────────────────────────────────────

#[async_trait]
impl Database for LibSqlBackend {
    async fn run_migrations(&self) -> Result<(), DatabaseError> {
        migrations::run_migrations(self.conn()).await
    }

    // ── Packages ────────────────────────────────────────────────────

    async fn create_job_box(&self, new: &NewJobBox) -> Result<JobBox, DatabaseError> {
        new.validate()?;
        let now = format_ts(&model::now());
        let id = self
            .inserted_id(
                "create_job_box",
                "INSERT INTO job_boxes (title, created_at, updated_at, is_active)
                 VALUES (?1, ?2, ?3, ?4) RETURNING id",
                params![new.title.as_str(), now.as_str(), now.as_str(), i64::from(new.is_active)],
            )
            .await?;

        debug!(job_box_id = id, "Job package inserted into DB");
        self.get_job_box(id).await?.ok_or(DatabaseError::NotFound {
            entity: "job_box".to_string(),
            id,
        })
    }

    async fn get_job_box(&self, id: i64) -> Result<Option<JobBox>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {JOB_BOX_COLUMNS} FROM job_boxes WHERE id = ?1"),
                params![id],
            )
            .await
            .map_err(query_error("get_job_box"))?;

        match rows.next().await.map_err(query_error("get_job_box"))? {
            Some(row) => Ok(Some(row_to_job_box(&row)?)),
            None => Ok(None),
        }
    }

    async fn update_job_box(&self, job_box: &JobBox) -> Result<JobBox, DatabaseError> {
        job_box.validate()?;
        let now = format_ts(&model::now());
        let count = self
            .conn()
            .execute(
                "UPDATE job_boxes SET title = ?1, is_active = ?2, updated_at = ?3 WHERE id = ?4",
                params![
                    job_box.title.as_str(),
                    i64::from(job_box.is_active),
                    now,
                    job_box.id
                ],
            )
            .await
            .map_err(|e| write_error("update_job_box", e))?;

        let not_found = || DatabaseError::NotFound {
            entity: "job_box".to_string(),
            id: job_box.id,
        };
        if count == 0 {
            return Err(not_found());
        }
        debug!(job_box_id = job_box.id, active = job_box.is_active, "Job package updated in DB");
        self.get_job_box(job_box.id).await?.ok_or_else(not_found)
    }

    async fn delete_job_box(&self, id: i64) -> Result<bool, DatabaseError> {
        // Jobs go with it through the `ON DELETE CASCADE` foreign key.
        let count = self
            .conn()
            .execute("DELETE FROM job_boxes WHERE id = ?1", params![id])
            .await
            .map_err(|e| write_error("delete_job_box", e))?;
        if count > 0 {
            info!(job_box_id = id, "Job package deleted");
        }
        Ok(count > 0)
    }

    async fn list_job_boxes(&self, filter: &JobBoxFilter) -> Result<Vec<JobBox>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {JOB_BOX_COLUMNS} FROM job_boxes \
                     WHERE (?1 IS NULL OR title LIKE ?1 ESCAPE '\\') \
                       AND (?2 IS NULL OR is_active = ?2) \
                     ORDER BY created_at DESC, id DESC"
                ),
                params![like_pattern(filter.search.as_deref()), opt_bool(filter.is_active)],
            )
            .await
            .map_err(query_error("list_job_boxes"))?;

        let mut boxes = Vec::new();
        while let Some(row) = rows.next().await.map_err(query_error("list_job_boxes"))? {
            boxes.push(row_to_job_box(&row)?);
        }
        Ok(boxes)
    }

    async fn job_box_stats(
        &self,
        id: i64,
        now: DateTime<Utc>,
    ) -> Result<JobBoxStats, DatabaseError> {
        let mut rows = self
            .conn()
            .query("SELECT COUNT(*) FROM jobs WHERE job_box_id = ?1", params![id])
            .await
            .map_err(query_error("job_box_stats"))?;
        let job_count = match rows.next().await.map_err(query_error("job_box_stats"))? {
            Some(row) => row.get::<i64>(0).map_err(query_error("job_box_stats"))?,
            None => 0,
        };

        let completed = self
            .query_jobs(
                "job_box_stats",
                &format!("SELECT {JOB_COLUMNS} FROM jobs WHERE job_box_id = ?1 AND is_completed = 1"),
                params![id],
            )
            .await?;

        Ok(JobBoxStats {
            job_count,
            total_duration: total_duration(&completed, now),
        })
    }

    // ── Jobs ────────────────────────────────────────────────────────

    async fn create_job(&self, new: &NewJob) -> Result<Job, DatabaseError> {
        let mut new = new.clone();
        new.validate()?;
        new.prepare_for_save();

        let now = format_ts(&model::now());
        let id = self
            .inserted_id(
                "create_job",
                "INSERT INTO jobs (title, start_time, end_time, job_box_id, is_completed, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) RETURNING id",
                params![
                    new.title.as_str(),
                    format_ts(&new.start_time),
                    opt_text(new.end_time.as_ref().map(format_ts)),
                    opt_integer(new.job_box_id),
                    i64::from(new.is_completed),
                    now.as_str(),
                    now.as_str(),
                ],
            )
            .await?;

        debug!(job_id = id, "Job inserted into DB");
        self.get_job(id).await?.ok_or(DatabaseError::NotFound {
            entity: "job".to_string(),
            id,
        })
    }

    async fn get_job(&self, id: i64) -> Result<Option<Job>, DatabaseError> {
        let mut jobs = self
            .query_jobs(
                "get_job",
                &format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = ?1"),
                params![id],
            )
            .await?;
        Ok(jobs.pop())
    }

    async fn update_job(&self, job: &Job) -> Result<Job, DatabaseError> {
        let mut job = job.clone();
        job.validate()?;
        job.prepare_for_save();

        let count = self
            .conn()
            .execute(
                "UPDATE jobs SET title = ?1, start_time = ?2, end_time = ?3, job_box_id = ?4, is_completed = ?5, updated_at = ?6 WHERE id = ?7",
                params![
                    job.title.as_str(),
                    format_ts(&job.start_time),
                    opt_text(job.end_time.as_ref().map(format_ts)),
                    opt_integer(job.job_box_id),
                    i64::from(job.is_completed),
                    format_ts(&model::now()),
                    job.id,
                ],
            )
            .await
            .map_err(|e| write_error("update_job", e))?;

        let not_found = || DatabaseError::NotFound {
            entity: "job".to_string(),
            id: job.id,
        };
        if count == 0 {
            return Err(not_found());
        }
        debug!(job_id = job.id, "Job updated in DB");
        self.get_job(job.id).await?.ok_or_else(not_found)
    }

    async fn delete_job(&self, id: i64) -> Result<bool, DatabaseError> {
        let count = self
            .conn()
            .execute("DELETE FROM jobs WHERE id = ?1", params![id])
            .await
            .map_err(|e| write_error("delete_job", e))?;
        Ok(count > 0)
    }

    async fn stop_job(&self, id: i64, at: DateTime<Utc>) -> Result<Option<Job>, DatabaseError> {
        let Some(job) = self.get_job(id).await? else {
            return Ok(None);
        };
        if !job.is_running() {
            return Ok(None);
        }

        // The end must fall strictly after the start, even for a job stopped
        // within the same microsecond it was started.
        let end = at.max(job.start_time + TimeDelta::microseconds(1));

        // Re-checked in the WHERE clause: a concurrent stop that committed
        // first leaves nothing for this one to update.
        let count = self
            .conn()
            .execute(
                "UPDATE jobs SET end_time = ?1, is_completed = 1, updated_at = ?2 WHERE id = ?3 AND end_time IS NULL",
                params![format_ts(&end), format_ts(&model::now()), id],
            )
            .await
            .map_err(|e| write_error("stop_job", e))?;

        if count == 0 {
            debug!(job_id = id, "Stop lost the race; job already stopped");
            return Ok(None);
        }
        self.get_job(id).await
    }

    async fn list_jobs(&self, filter: &JobFilter) -> Result<Vec<JobListing>, DatabaseError> {
        let limit = filter
            .limit
            .map(|l| i64::try_from(l).unwrap_or(i64::MAX))
            .unwrap_or(-1);
        let offset = i64::try_from(filter.offset).unwrap_or(i64::MAX);

        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {JOB_COLUMNS}, job_boxes.title FROM jobs \
                     LEFT JOIN job_boxes ON job_boxes.id = jobs.job_box_id \
                     WHERE (?1 IS NULL OR jobs.title LIKE ?1 ESCAPE '\\' OR job_boxes.title LIKE ?1 ESCAPE '\\') \
                       AND (?2 IS NULL OR jobs.is_completed = ?2) \
                       AND (?3 IS NULL OR jobs.job_box_id = ?3) \
                     ORDER BY jobs.start_time DESC, jobs.id DESC \
                     LIMIT ?4 OFFSET ?5"
                ),
                params![
                    like_pattern(filter.search.as_deref()),
                    opt_bool(filter.is_completed),
                    opt_integer(filter.job_box_id),
                    limit,
                    offset,
                ],
            )
            .await
            .map_err(query_error("list_jobs"))?;

        let mut listings = Vec::new();
        while let Some(row) = rows.next().await.map_err(query_error("list_jobs"))? {
            listings.push(JobListing {
                job: row_to_job(&row)?,
                job_box_title: row.get::<String>(8).ok(),
            });
        }
        Ok(listings)
    }

    async fn job_counts(&self) -> Result<JobCounts, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT COUNT(*), \
                        COALESCE(SUM(CASE WHEN end_time IS NULL THEN 1 ELSE 0 END), 0), \
                        COALESCE(SUM(is_completed), 0) \
                 FROM jobs",
                (),
            )
            .await
            .map_err(query_error("job_counts"))?;

        match rows.next().await.map_err(query_error("job_counts"))? {
            Some(row) => {
                let parse = query_error("job_counts");
                Ok(JobCounts {
                    total: row.get(0).map_err(&parse)?,
                    running: row.get(1).map_err(&parse)?,
                    completed: row.get(2).map_err(&parse)?,
                })
            }
            None => Ok(JobCounts::default()),
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────
