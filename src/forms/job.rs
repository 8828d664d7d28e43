//! Full job form: title, start/end times and an optional package.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    FormErrors, INVALID_DATETIME, REQUIRED, clean_job_box, clean_title, format_datetime_input,
    lenient_string, parse_datetime_input,
};
use crate::model::{Job, JobBox, NewJob};

pub const END_BEFORE_START: &str = "End time must be after start time.";
pub const START_IN_FUTURE: &str = "Start time cannot be in the future.";
pub const END_REQUIRED_WHEN_COMPLETED: &str = "A completed job must keep its end time.";

/// Raw job form submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobFormInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub job_box: String,
}

impl JobFormInput {
    /// Blank form with the start time pre-filled.
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            start_time: format_datetime_input(now),
            ..Self::default()
        }
    }

    /// Form values mirroring an existing job, for editing.
    pub fn from_job(job: &Job) -> Self {
        Self {
            title: job.title.clone(),
            start_time: format_datetime_input(job.start_time),
            end_time: job.end_time.map(format_datetime_input).unwrap_or_default(),
            job_box: job.job_box_id.map(|id| id.to_string()).unwrap_or_default(),
        }
    }
}

/// Validated job fields.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedJob {
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub job_box_id: Option<i64>,
}

impl CleanedJob {
    pub fn into_new_job(self) -> NewJob {
        NewJob::new(self.title, self.start_time)
            .with_end_time(self.end_time)
            .with_job_box(self.job_box_id)
    }

    /// Overwrite the editable fields of `job`.
    pub fn apply_to(self, job: &mut Job) {
        job.title = self.title;
        job.start_time = self.start_time;
        job.end_time = self.end_time;
        job.job_box_id = self.job_box_id;
    }
}

/// Validation rules for creating and editing jobs.
pub struct JobForm;

impl JobForm {
    /// Validate a submission.
    ///
    /// `active` lists the packages a job may be assigned to. `existing` is
    /// the job being edited, if any; a completed job may not lose its end
    /// time. `now` bounds the start time.
    pub fn validate(
        input: &JobFormInput,
        active: &[JobBox],
        existing: Option<&Job>,
        now: DateTime<Utc>,
    ) -> Result<CleanedJob, FormErrors> {
        let mut errors = FormErrors::new();

        let title = clean_title(&input.title, "title", &mut errors);

        let start_time = if input.start_time.trim().is_empty() {
            errors.add("start_time", REQUIRED);
            None
        } else {
            let parsed = parse_time(&input.start_time, existing.map(|job| job.start_time));
            if parsed.is_none() {
                errors.add("start_time", INVALID_DATETIME);
            }
            parsed
        };

        let end_time = if input.end_time.trim().is_empty() {
            if existing.is_some_and(|job| job.end_time.is_some()) {
                errors.add("end_time", END_REQUIRED_WHEN_COMPLETED);
            }
            Some(None)
        } else {
            match parse_time(&input.end_time, existing.and_then(|job| job.end_time)) {
                Some(end) => Some(Some(end)),
                None => {
                    errors.add("end_time", INVALID_DATETIME);
                    None
                }
            }
        };

        let job_box_id = clean_job_box(&input.job_box, active, "job_box", &mut errors);

        if let Some(start) = start_time {
            if matches!(end_time, Some(Some(end)) if end <= start) {
                errors.add_non_field(END_BEFORE_START);
            } else if start > now {
                errors.add_non_field(START_IN_FUTURE);
            }
        }

        match (title, start_time, end_time, job_box_id) {
            (Some(title), Some(start_time), Some(end_time), Some(job_box_id)) if errors.is_empty() => {
                Ok(CleanedJob {
                    title,
                    start_time,
                    end_time,
                    job_box_id,
                })
            }
            _ => Err(errors),
        }
    }
}

/// Parse a submitted time. A value equal to the pre-filled `stored` time
/// yields `stored` itself, keeping the precision the input cannot show.
fn parse_time(raw: &str, stored: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    match stored {
        Some(stored) if raw.trim() == format_datetime_input(stored) => Some(stored),
        _ => parse_datetime_input(raw),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, TimeZone};

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap()
    }

    fn package(id: i64) -> JobBox {
        JobBox {
            id,
            title: format!("Package {id}"),
            created_at: now(),
            updated_at: now(),
            is_active: true,
        }
    }

    fn input(title: &str, start: &str, end: &str, job_box: &str) -> JobFormInput {
        JobFormInput {
            title: title.into(),
            start_time: start.into(),
            end_time: end.into(),
            job_box: job_box.into(),
        }
    }

    #[test]
    fn valid_completed_job() {
        let cleaned = JobForm::validate(
            &input(" Design review ", "2026-03-02T09:00", "2026-03-02T10:15", "2"),
            &[package(2)],
            None,
            now(),
        )
        .unwrap();
        assert_eq!(cleaned.title, "Design review");
        assert_eq!(cleaned.job_box_id, Some(2));
        assert_eq!(
            cleaned.end_time.unwrap() - cleaned.start_time,
            TimeDelta::minutes(75)
        );
    }

    #[test]
    fn running_job_without_package() {
        let cleaned =
            JobForm::validate(&input("Standup", "2026-03-02T11:00", "", ""), &[], None, now())
                .unwrap();
        assert_eq!(cleaned.end_time, None);
        assert_eq!(cleaned.job_box_id, None);
        let new = cleaned.into_new_job();
        assert!(!new.is_completed);
    }

    #[test]
    fn end_not_after_start_rejected() {
        for end in ["2026-03-02T09:00", "2026-03-02T08:00"] {
            let errors = JobForm::validate(
                &input("Standup", "2026-03-02T09:00", end, ""),
                &[],
                None,
                now(),
            )
            .unwrap_err();
            assert_eq!(errors.non_field(), [END_BEFORE_START.to_string()]);
        }
    }

    #[test]
    fn future_start_rejected() {
        let errors = JobForm::validate(
            &input("Tomorrow's work", "2026-03-03T09:00", "", ""),
            &[],
            None,
            now(),
        )
        .unwrap_err();
        assert_eq!(errors.non_field(), [START_IN_FUTURE.to_string()]);
    }

    #[test]
    fn missing_and_malformed_fields() {
        let errors = JobForm::validate(&input("", "", "soon", ""), &[], None, now()).unwrap_err();
        assert_eq!(errors.field("title"), [REQUIRED.to_string()]);
        assert_eq!(errors.field("start_time"), [REQUIRED.to_string()]);
        assert_eq!(errors.field("end_time"), [INVALID_DATETIME.to_string()]);
    }

    #[test]
    fn inactive_or_unknown_package_rejected() {
        // Callers pass active packages only; package 3 is not among them.
        let errors = JobForm::validate(
            &input("Standup", "2026-03-02T09:00", "", "3"),
            &[package(1)],
            None,
            now(),
        )
        .unwrap_err();
        assert!(errors.has_field("job_box"));

        let errors = JobForm::validate(
            &input("Standup", "2026-03-02T09:00", "", "abc"),
            &[package(1)],
            None,
            now(),
        )
        .unwrap_err();
        assert!(errors.has_field("job_box"));
    }

    #[test]
    fn completed_job_keeps_end_time() {
        let existing = Job {
            id: 9,
            title: "Done".into(),
            start_time: now() - TimeDelta::hours(2),
            end_time: Some(now() - TimeDelta::hours(1)),
            job_box_id: None,
            is_completed: true,
            created_at: now(),
            updated_at: now(),
        };
        let mut edit = JobFormInput::from_job(&existing);
        edit.end_time.clear();
        let errors = JobForm::validate(&edit, &[], Some(&existing), now()).unwrap_err();
        assert_eq!(
            errors.field("end_time"),
            [END_REQUIRED_WHEN_COMPLETED.to_string()]
        );

        let unchanged = JobFormInput::from_job(&existing);
        assert!(JobForm::validate(&unchanged, &[], Some(&existing), now()).is_ok());
    }

    #[test]
    fn unchanged_edit_keeps_stored_times() {
        let at = |h, m, s| Utc.with_ymd_and_hms(2026, 3, 2, h, m, s).unwrap();
        let sub_second = at(9, 0, 30) + TimeDelta::microseconds(250_000);
        for (start, end) in [
            (at(9, 0, 30), at(9, 0, 50)),
            (at(9, 0, 40), at(9, 5, 10)),
            (sub_second, sub_second + TimeDelta::microseconds(500_000)),
        ] {
            let existing = Job {
                id: 4,
                title: "Quick fix".into(),
                start_time: start,
                end_time: Some(end),
                job_box_id: None,
                is_completed: true,
                created_at: end,
                updated_at: end,
            };
            let edit = JobFormInput::from_job(&existing);
            let cleaned = JobForm::validate(&edit, &[], Some(&existing), now()).unwrap();
            assert_eq!(cleaned.start_time, start);
            assert_eq!(cleaned.end_time, Some(end));
        }
    }

    #[test]
    fn edited_time_replaces_stored_time() {
        let existing = Job {
            id: 4,
            title: "Quick fix".into(),
            start_time: now() - TimeDelta::hours(2),
            end_time: Some(now() - TimeDelta::hours(1)),
            job_box_id: None,
            is_completed: true,
            created_at: now(),
            updated_at: now(),
        };
        let mut edit = JobFormInput::from_job(&existing);
        edit.end_time = "2026-03-02T11:30:15".into();
        let cleaned = JobForm::validate(&edit, &[], Some(&existing), now()).unwrap();
        assert_eq!(cleaned.start_time, existing.start_time);
        assert_eq!(
            cleaned.end_time,
            Some(Utc.with_ymd_and_hms(2026, 3, 2, 11, 30, 15).unwrap())
        );
    }
}
