//! Project membership and field rules.

use crate::error::CoreError;
use crate::macros::define_code_enum;
use crate::types::Timestamp;

pub const MAX_PROJECT_NAME_LENGTH: usize = 100;
pub const MAX_DESCRIPTION_LENGTH: usize = 20_000;

define_code_enum! {
    MemberType {
        User => "USER",
        Dept => "DEPT",
        Group => "GROUP",
    }
}

pub fn normalize_project_name(name: &str) -> Result<String, CoreError> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > MAX_PROJECT_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "Project name must be 1 to {MAX_PROJECT_NAME_LENGTH} characters"
        )));
    }
    Ok(name.to_string())
}

/// Project dates only need to be ordered; they may lie in the past.
pub fn check_project_dates(
    start: Option<Timestamp>,
    deadline: Option<Timestamp>,
) -> Result<(), CoreError> {
    match (start, deadline) {
        (Some(s), Some(d)) if s > d => Err(CoreError::Validation(
            "Start date must not be after the deadline".to_string(),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn names() {
        assert_eq!(normalize_project_name(" Payments ").unwrap(), "Payments");
        assert!(normalize_project_name("").is_err());
        assert!(normalize_project_name(&"p".repeat(101)).is_err());
    }

    #[test]
    fn dates() {
        let now = Utc::now();
        assert!(check_project_dates(Some(now - Duration::days(30)), Some(now)).is_ok());
        assert!(check_project_dates(Some(now), Some(now - Duration::days(1))).is_err());
        assert!(check_project_dates(None, Some(now)).is_ok());
    }
}
