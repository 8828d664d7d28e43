//! Input validation for the job, package and quick-start forms.
//!
//! Forms take the raw strings an HTML form submits and return either a
//! cleaned, typed value or a [`FormErrors`] describing what to fix.

pub mod job;
pub mod job_box;
pub mod quick;

pub use job::{CleanedJob, JobForm, JobFormInput};
pub use job_box::{JobBoxForm, JobBoxFormInput};
pub use quick::{QuickJobForm, QuickJobInput};

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::model::{JobBox, TITLE_MAX_LEN, TITLE_MIN_LEN};

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_DATETIME: &str = "Enter a valid date/time.";
pub const INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";

/// Key under which whole-form errors are serialized.
pub const NON_FIELD_KEY: &str = "__all__";

/// Validation messages, keyed by field, plus whole-form messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    fields: BTreeMap<&'static str, Vec<String>>,
    non_field: Vec<String>,
}

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_default().push(message.into());
    }

    pub fn add_non_field(&mut self, message: impl Into<String>) {
        self.non_field.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.non_field.is_empty()
    }

    /// Messages for one field; empty when the field is valid.
    pub fn field(&self, name: &str) -> &[String] {
        self.fields.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn non_field(&self) -> &[String] {
        &self.non_field
    }
}

impl Serialize for FormErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let extra = usize::from(!self.non_field.is_empty());
        let mut map = serializer.serialize_map(Some(self.fields.len() + extra))?;
        for (field, messages) in &self.fields {
            map.serialize_entry(field, messages)?;
        }
        if !self.non_field.is_empty() {
            map.serialize_entry(NON_FIELD_KEY, &self.non_field)?;
        }
        map.end()
    }
}

/// Trim and length-check a title, recording failures under `field`.
pub(crate) fn clean_title(raw: &str, field: &'static str, errors: &mut FormErrors) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        errors.add(field, REQUIRED);
        return None;
    }
    let len = trimmed.chars().count();
    if len < TITLE_MIN_LEN {
        errors.add(
            field,
            format!("Title must be at least {TITLE_MIN_LEN} characters long."),
        );
        return None;
    }
    if len > TITLE_MAX_LEN {
        errors.add(
            field,
            format!("Ensure this value has at most {TITLE_MAX_LEN} characters (it has {len})."),
        );
        return None;
    }
    Some(trimmed.to_string())
}

/// Resolve an optional package choice against the active packages.
///
/// `Some(None)` means no package was chosen; `None` means the choice was invalid.
pub(crate) fn clean_job_box(
    raw: &str,
    active: &[JobBox],
    field: &'static str,
    errors: &mut FormErrors,
) -> Option<Option<i64>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Some(None);
    }
    let chosen = raw
        .parse::<i64>()
        .ok()
        .filter(|id| active.iter().any(|b| b.id == *id));
    match chosen {
        Some(id) => Some(Some(id)),
        None => {
            errors.add(field, INVALID_CHOICE);
            None
        }
    }
}

/// Parse a timestamp as submitted by a `datetime-local` input or an API
/// client. Naive values are taken as UTC.
pub fn parse_datetime_input(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    const FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
    ];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|ndt| ndt.and_utc())
}

/// Format a timestamp for a `datetime-local` input's `value`, to the second.
///
/// The inputs carry `step="1"` so browsers keep the seconds on submit.
pub fn format_datetime_input(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Accept a string, a number, or null, yielding a string (empty for null).
///
/// Lets JSON clients send `"job_box": 3` where an HTML form sends `"3"`.
pub(crate) fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Int(i64),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Str(s)) => s,
        Some(Raw::Int(n)) => n.to_string(),
        None => String::new(),
    })
}
