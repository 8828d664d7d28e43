//! Job packages: named groupings of jobs.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::{Job, validate_title};
use crate::error::ValidationError;

/// A persisted job package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobBox {
    pub id: i64,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Inactive packages are hidden from job forms but keep their jobs.
    pub is_active: bool,
}

impl JobBox {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_title(&self.title)
    }
}

/// A package that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewJobBox {
    pub title: String,
    pub is_active: bool,
}

impl NewJobBox {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            is_active: true,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_title(&self.title)
    }
}

/// Sum of the durations of the completed jobs in `jobs`.
///
/// Running jobs are ignored; an empty or all-running slice sums to zero.
pub fn total_duration<'a>(jobs: impl IntoIterator<Item = &'a Job>, now: DateTime<Utc>) -> TimeDelta {
    jobs.into_iter()
        .filter(|job| job.is_completed)
        .map(|job| job.duration(now))
        .fold(TimeDelta::zero(), |acc, d| acc + d)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, h, m, 0).unwrap()
    }

    fn job(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Job {
        Job {
            id: 0,
            title: "Task".into(),
            start_time: start,
            end_time: end,
            job_box_id: Some(1),
            is_completed: end.is_some(),
            created_at: start,
            updated_at: start,
        }
    }

    #[test]
    fn total_counts_completed_only() {
        let jobs = vec![
            job(at(9, 0), Some(at(10, 0))),
            job(at(11, 0), Some(at(11, 30))),
            job(at(12, 0), None),
        ];
        assert_eq!(total_duration(&jobs, at(18, 0)), TimeDelta::minutes(90));
    }

    #[test]
    fn total_of_nothing_is_zero() {
        let running = vec![job(at(9, 0), None)];
        assert_eq!(total_duration(&running, at(18, 0)), TimeDelta::zero());
        assert_eq!(total_duration(&Vec::<Job>::new(), at(18, 0)), TimeDelta::zero());
    }

    #[test]
    fn new_package_is_active() {
        let new = NewJobBox::new("Client work");
        assert!(new.is_active);
        assert!(new.validate().is_ok());
        assert!(NewJobBox::new(" x ").validate().is_err());
    }
}
