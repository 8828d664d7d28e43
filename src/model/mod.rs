//! Data model: jobs, job packages, and their derived durations.

pub mod job;
pub mod job_box;

pub use job::{Job, JobStatus, NewJob};
pub use job_box::{JobBox, NewJobBox, total_duration};

use chrono::{DateTime, SubsecRound, Utc};

use crate::error::ValidationError;

/// Minimum title length after trimming.
pub const TITLE_MIN_LEN: usize = 3;
/// Maximum title length.
pub const TITLE_MAX_LEN: usize = 120;

/// Current time at the precision the store keeps (microseconds).
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Check a title against the length limits, counting characters of the
/// trimmed value.
pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    let len = title.trim().chars().count();
    if len < TITLE_MIN_LEN {
        return Err(ValidationError::TitleTooShort { min: TITLE_MIN_LEN });
    }
    if len > TITLE_MAX_LEN {
        return Err(ValidationError::TitleTooLong {
            max: TITLE_MAX_LEN,
            actual: len,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_bounds() {
        assert!(validate_title("abc").is_ok());
        assert_eq!(
            validate_title("  ab  "),
            Err(ValidationError::TitleTooShort { min: 3 })
        );
        assert!(validate_title(&"x".repeat(120)).is_ok());
        assert_eq!(
            validate_title(&"x".repeat(121)),
            Err(ValidationError::TitleTooLong {
                max: 120,
                actual: 121
            })
        );
    }
}
