//! Package form: just a title, plus the active flag on the admin side.

use serde::{Deserialize, Serialize};

use super::{FormErrors, clean_title};
use crate::model::{JobBox, NewJobBox};

/// Raw package form submission.
///
/// `is_active` is only present on the admin edit form, where an unchecked
/// checkbox is simply omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobBoxFormInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub is_active: Option<String>,
}

impl JobBoxFormInput {
    pub fn from_job_box(job_box: &JobBox) -> Self {
        Self {
            title: job_box.title.clone(),
            is_active: job_box.is_active.then(|| "on".to_string()),
        }
    }

    /// Checkbox semantics: any value other than an explicit false means on.
    pub fn is_active_checked(&self) -> bool {
        self.is_active
            .as_deref()
            .is_some_and(|v| !matches!(v, "" | "0" | "false" | "off"))
    }
}

pub struct JobBoxForm;

impl JobBoxForm {
    /// Validate a new package; the stored title is the trimmed value.
    pub fn validate(input: &JobBoxFormInput) -> Result<NewJobBox, FormErrors> {
        let mut errors = FormErrors::new();
        let title = clean_title(&input.title, "title", &mut errors);
        match title {
            Some(title) if errors.is_empty() => Ok(NewJobBox::new(title)),
            _ => Err(errors),
        }
    }

    /// Validate an admin edit and apply it to `job_box`.
    pub fn validate_edit(input: &JobBoxFormInput, job_box: &mut JobBox) -> Result<(), FormErrors> {
        let new = Self::validate(input)?;
        job_box.title = new.title;
        job_box.is_active = input.is_active_checked();
        Ok(())
    }
}
