//! Quick-start form: a title and optional package, nothing else.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{FormErrors, clean_job_box, clean_title, lenient_string};
use crate::model::{JobBox, NewJob};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuickJobInput {
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub job_box: String,
}

pub struct QuickJobForm;

impl QuickJobForm {
    /// Validate a quick-start request into a job that starts at `now`.
    pub fn validate(
        input: &QuickJobInput,
        active: &[JobBox],
        now: DateTime<Utc>,
    ) -> Result<NewJob, FormErrors> {
        let mut errors = FormErrors::new();
        let title = clean_title(&input.title, "title", &mut errors);
        let job_box_id = clean_job_box(&input.job_box, active, "job_box", &mut errors);

        match (title, job_box_id) {
            (Some(title), Some(job_box_id)) if errors.is_empty() => {
                Ok(NewJob::started_at(title, job_box_id, now))
            }
            _ => Err(errors),
        }
    }
}
