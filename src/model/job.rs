//! A single timed work session.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::validate_title;
use crate::error::ValidationError;

/// Whether a job's timer is still going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    /// No end time yet.
    Running,
    /// End time recorded.
    Completed,
}

/// A persisted job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: i64,
    pub title: String,
    pub start_time: DateTime<Utc>,
    /// `None` while the job is running.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Owning package, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_box_id: Option<i64>,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Elapsed time: `end - start` once stopped, `now - start` while running.
    pub fn duration(&self, now: DateTime<Utc>) -> TimeDelta {
        elapsed(self.start_time, self.end_time, now)
    }

    pub fn status(&self) -> JobStatus {
        if self.end_time.is_some() {
            JobStatus::Completed
        } else {
            JobStatus::Running
        }
    }

    pub fn is_running(&self) -> bool {
        self.status() == JobStatus::Running
    }

    /// Check the model invariants.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_times(&self.title, self.start_time, self.end_time)
    }

    /// Apply the save-time rules: a job with an end time is always completed.
    pub fn prepare_for_save(&mut self) {
        if self.end_time.is_some() {
            self.is_completed = true;
        }
    }
}

/// A job that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewJob {
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub job_box_id: Option<i64>,
    pub is_completed: bool,
}

impl NewJob {
    pub fn new(title: impl Into<String>, start_time: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            start_time,
            end_time: None,
            job_box_id: None,
            is_completed: false,
        }
    }

    /// A running job whose timer starts at `now`.
    pub fn started_at(title: impl Into<String>, job_box_id: Option<i64>, now: DateTime<Utc>) -> Self {
        Self::new(title, now).with_job_box(job_box_id)
    }

    /// Builder: set the end time.
    pub fn with_end_time(mut self, end_time: Option<DateTime<Utc>>) -> Self {
        self.end_time = end_time;
        self
    }

    /// Builder: set the owning package.
    pub fn with_job_box(mut self, job_box_id: Option<i64>) -> Self {
        self.job_box_id = job_box_id;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_times(&self.title, self.start_time, self.end_time)
    }

    /// Same rule as [`Job::prepare_for_save`].
    pub fn prepare_for_save(&mut self) {
        if self.end_time.is_some() {
            self.is_completed = true;
        }
    }
}

fn validate_times(
    title: &str,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
) -> Result<(), ValidationError> {
    validate_title(title)?;
    if let Some(end) = end_time {
        if end <= start_time {
            return Err(ValidationError::EndBeforeStart);
        }
    }
    Ok(())
}

fn elapsed(start: DateTime<Utc>, end: Option<DateTime<Utc>>, now: DateTime<Utc>) -> TimeDelta {
    end.unwrap_or(now) - start
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, h, m, 0).unwrap()
    }

    fn job(end: Option<DateTime<Utc>>) -> Job {
        Job {
            id: 1,
            title: "Write report".into(),
            start_time: at(9, 0),
            end_time: end,
            job_box_id: None,
            is_completed: false,
            created_at: at(9, 0),
            updated_at: at(9, 0),
        }
    }

    #[test]
    fn duration_of_stopped_job() {
        let job = job(Some(at(10, 30)));
        assert_eq!(job.duration(at(23, 0)), TimeDelta::minutes(90));
        assert_eq!(job.status(), JobStatus::Completed);
    }

    #[test]
    fn duration_of_running_job_grows() {
        let job = job(None);
        assert_eq!(job.duration(at(9, 15)), TimeDelta::minutes(15));
        assert_eq!(job.duration(at(9, 45)), TimeDelta::minutes(45));
        assert!(job.is_running());
    }

    #[test]
    fn end_time_forces_completed() {
        let mut job = job(Some(at(10, 0)));
        assert!(!job.is_completed);
        job.prepare_for_save();
        assert!(job.is_completed);

        let mut running = self::job(None);
        running.prepare_for_save();
        assert!(!running.is_completed);
    }

    #[test]
    fn end_must_follow_start() {
        assert_eq!(
            job(Some(at(9, 0))).validate(),
            Err(ValidationError::EndBeforeStart)
        );
        assert_eq!(
            job(Some(at(8, 0))).validate(),
            Err(ValidationError::EndBeforeStart)
        );
        assert!(job(Some(at(9, 1))).validate().is_ok());
    }

    #[test]
    fn new_job_builder() {
        let mut new = NewJob::new("Meeting", at(9, 0))
            .with_end_time(Some(at(9, 30)))
            .with_job_box(Some(4));
        new.prepare_for_save();
        assert!(new.is_completed);
        assert_eq!(new.job_box_id, Some(4));
        assert!(new.validate().is_ok());

        let quick = NewJob::started_at("ab", None, at(9, 0));
        assert!(quick.validate().is_err());
    }
}
