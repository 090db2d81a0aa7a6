//! Task sprint lifecycle and date-range rules.

use chrono::Duration;

use crate::error::CoreError;
use crate::macros::define_code_enum;
use crate::types::Timestamp;

/// How far in the past a start date may lie when a sprint or plan is saved.
pub const START_DATE_GRACE_MINUTES: i64 = 10;

/// Maximum length of sprint and plan names.
pub const MAX_NAME_LENGTH: usize = 200;

define_code_enum! {
    SprintStatus {
        Pending => "PENDING",
        InProgress => "IN_PROGRESS",
        Blocked => "BLOCKED",
        Completed => "COMPLETED",
    }
}

define_code_enum! {
    /// Lifecycle command applied to a sprint or a functional plan.
    LifecycleAction {
        Start => "start",
        Block => "block",
        Unblock => "unblock",
        Complete => "complete",
        Reopen => "reopen",
        Restart => "restart",
    }
}

/// Compute the status a sprint moves to under `action`.
///
/// `unfinished_tasks` is the number of live tasks of the sprint that are
/// neither completed nor canceled; completion is refused while it is non-zero.
pub fn next_status(
    current: SprintStatus,
    action: LifecycleAction,
    unfinished_tasks: i64,
) -> Result<SprintStatus, CoreError> {
    use LifecycleAction as A;
    use SprintStatus as S;

    match (current, action) {
        (S::Pending, A::Start) => Ok(S::InProgress),
        (S::InProgress, A::Block) => Ok(S::Blocked),
        (S::Blocked, A::Unblock) => Ok(S::InProgress),
        (S::InProgress, A::Complete) => {
            if unfinished_tasks > 0 {
                Err(CoreError::Business("sprint tasks incomplete".to_string()))
            } else {
                Ok(S::Completed)
            }
        }
        (S::Completed, A::Reopen) => Ok(S::Pending),
        (_, A::Restart) => Ok(S::Pending),
        (from, action) => Err(invalid_transition("sprint", from.as_str(), action)),
    }
}

pub(crate) fn invalid_transition(entity: &str, from: &str, action: LifecycleAction) -> CoreError {
    CoreError::Business(format!(
        "Cannot {} {entity} in status {from}",
        action.as_str()
    ))
}

/// Reject a start/deadline pair that is inverted or that starts more than
/// [`START_DATE_GRACE_MINUTES`] before `now`.
pub fn check_sprint_date_range(
    start: Timestamp,
    deadline: Timestamp,
    now: Timestamp,
) -> Result<(), CoreError> {
    if start > deadline {
        return Err(CoreError::Validation(
            "Start date must not be after the deadline".to_string(),
        ));
    }
    if start < now - Duration::minutes(START_DATE_GRACE_MINUTES) {
        return Err(CoreError::Validation(
            "Start date must not be in the past".to_string(),
        ));
    }
    Ok(())
}

/// Validate a sprint or plan name and return it trimmed.
pub fn normalize_name(name: &str) -> Result<String, CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Name must not be empty".to_string()));
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "Name must be at most {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn start_after_deadline_rejected() {
        let start = now() + Duration::days(2);
        let deadline = now() + Duration::days(1);
        assert_matches!(
            check_sprint_date_range(start, deadline, now()),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn start_far_in_past_rejected() {
        let start = now() - Duration::minutes(11);
        assert!(check_sprint_date_range(start, now() + Duration::days(1), now()).is_err());
    }

    #[test]
    fn start_within_grace_accepted() {
        let start = now() - Duration::minutes(9);
        assert!(check_sprint_date_range(start, now() + Duration::days(1), now()).is_ok());
    }

    #[test]
    fn equal_start_and_deadline_accepted() {
        assert!(check_sprint_date_range(now(), now(), now()).is_ok());
    }

    #[test]
    fn happy_lifecycle() {
        let s = next_status(SprintStatus::Pending, LifecycleAction::Start, 0).unwrap();
        assert_eq!(s, SprintStatus::InProgress);
        let s = next_status(s, LifecycleAction::Block, 0).unwrap();
        assert_eq!(s, SprintStatus::Blocked);
        let s = next_status(s, LifecycleAction::Unblock, 0).unwrap();
        let s = next_status(s, LifecycleAction::Complete, 0).unwrap();
        assert_eq!(s, SprintStatus::Completed);
        let s = next_status(s, LifecycleAction::Reopen, 0).unwrap();
        assert_eq!(s, SprintStatus::Pending);
    }

    #[test]
    fn complete_with_open_tasks_rejected() {
        let err = next_status(SprintStatus::InProgress, LifecycleAction::Complete, 3).unwrap_err();
        assert_eq!(err.to_string(), "sprint tasks incomplete");
    }

    #[test]
    fn restart_from_any_status() {
        for status in SprintStatus::ALL {
            assert_eq!(
                next_status(*status, LifecycleAction::Restart, 5).unwrap(),
                SprintStatus::Pending
            );
        }
    }

    #[test]
    fn start_twice_rejected() {
        assert_matches!(
            next_status(SprintStatus::InProgress, LifecycleAction::Start, 0),
            Err(CoreError::Business(_))
        );
    }

    #[test]
    fn name_is_trimmed() {
        assert_eq!(normalize_name("  Sprint 1 ").unwrap(), "Sprint 1");
        assert!(normalize_name("   ").is_err());
        assert!(normalize_name(&"x".repeat(MAX_NAME_LENGTH + 1)).is_err());
    }

    #[test]
    fn status_codes_parse() {
        assert_eq!(
            SprintStatus::from_str_value("IN_PROGRESS").unwrap(),
            SprintStatus::InProgress
        );
        assert!(SprintStatus::from_str_value("DONE").is_err());
        assert_eq!(LifecycleAction::from_str_value("unblock").unwrap(), LifecycleAction::Unblock);
    }
}
