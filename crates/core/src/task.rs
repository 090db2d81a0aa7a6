//! Task workflow.
//!
//! A task moves `PENDING → IN_PROGRESS → (CONFIRMING) → COMPLETED`. When a
//! confirmer is assigned, processing hands the task over for confirmation;
//! a failed confirmation sends it back to `PENDING` and counts the failure.

use crate::error::CoreError;
use crate::macros::define_code_enum;
use crate::types::Timestamp;

/// Maximum length of a task name.
pub const MAX_TASK_NAME_LENGTH: usize = 400;

/// Prefix of generated task codes.
pub const TASK_CODE_PREFIX: &str = "T";

define_code_enum! {
    TaskStatus {
        Pending => "PENDING",
        InProgress => "IN_PROGRESS",
        Confirming => "CONFIRMING",
        Completed => "COMPLETED",
        Canceled => "CANCELED",
    }
}

impl TaskStatus {
    /// Completed and canceled tasks are finished.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Canceled)
    }
}

define_code_enum! {
    TaskType {
        Requirement => "REQUIREMENT",
        Story => "STORY",
        Task => "TASK",
        Bug => "BUG",
        ApiTest => "API_TEST",
        ScenarioTest => "SCENARIO_TEST",
    }
}

/// Date column stamped by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskDate {
    Start,
    Processed,
    Confirmed,
    Completed,
    Canceled,
}

impl TaskDate {
    pub fn column(self) -> &'static str {
        match self {
            TaskDate::Start => "start_date",
            TaskDate::Processed => "processed_date",
            TaskDate::Confirmed => "confirmed_date",
            TaskDate::Completed => "completed_date",
            TaskDate::Canceled => "canceled_date",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAction {
    Start,
    Process,
    Confirm { passed: bool },
    Cancel,
    Reopen,
}

impl TaskAction {
    /// Parse the path form of the argument-free actions.
    pub fn from_path(action: &str) -> Result<Self, CoreError> {
        match action {
            "start" => Ok(TaskAction::Start),
            "process" => Ok(TaskAction::Process),
            "cancel" => Ok(TaskAction::Cancel),
            "reopen" => Ok(TaskAction::Reopen),
            other => Err(CoreError::Validation(format!(
                "Invalid task action '{other}'. Must be one of: start, process, cancel, reopen"
            ))),
        }
    }
}

/// Everything a status change writes to the task row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskTransition {
    pub status: TaskStatus,
    pub stamps: &'static [TaskDate],
    pub failure_increment: i32,
    /// Clear the processing/confirmation/completion dates (reopen).
    pub clear_progress_dates: bool,
}

impl TaskTransition {
    fn to(status: TaskStatus, stamps: &'static [TaskDate]) -> Self {
        Self {
            status,
            stamps,
            failure_increment: 0,
            clear_progress_dates: false,
        }
    }
}

pub fn transition(
    current: TaskStatus,
    action: TaskAction,
    has_confirmer: bool,
) -> Result<TaskTransition, CoreError> {
    use TaskStatus as S;

    match (current, action) {
        (S::Pending, TaskAction::Start) => Ok(TaskTransition::to(S::InProgress, &[TaskDate::Start])),
        (S::InProgress, TaskAction::Process) if has_confirmer => Ok(TaskTransition::to(
            S::Confirming,
            &[TaskDate::Processed],
        )),
        (S::InProgress, TaskAction::Process) => Ok(TaskTransition::to(
            S::Completed,
            &[TaskDate::Processed, TaskDate::Completed],
        )),
        (S::Confirming, TaskAction::Confirm { passed: true }) => Ok(TaskTransition::to(
            S::Completed,
            &[TaskDate::Confirmed, TaskDate::Completed],
        )),
        (S::Confirming, TaskAction::Confirm { passed: false }) => Ok(TaskTransition {
            failure_increment: 1,
            ..TaskTransition::to(S::Pending, &[TaskDate::Confirmed])
        }),
        (s, TaskAction::Cancel) if !s.is_terminal() => {
            Ok(TaskTransition::to(S::Canceled, &[TaskDate::Canceled]))
        }
        (S::Completed | S::Canceled, TaskAction::Reopen) => Ok(TaskTransition {
            clear_progress_dates: true,
            ..TaskTransition::to(S::Pending, &[])
        }),
        (from, action) => Err(CoreError::Business(format!(
            "Cannot apply {action:?} to a task in status {from}"
        ))),
    }
}

/// A live task is overdue once its deadline has passed.
pub fn is_overdue(status: TaskStatus, deadline: Option<Timestamp>, now: Timestamp) -> bool {
    !status.is_terminal() && deadline.is_some_and(|d| d < now)
}

/// Render a sequential code such as `T000042`.
pub fn format_code(prefix: &str, seq: i64) -> String {
    format!("{prefix}{seq:06}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{Duration, Utc};

    #[test]
    fn process_without_confirmer_completes() {
        let t = transition(TaskStatus::InProgress, TaskAction::Process, false).unwrap();
        assert_eq!(t.status, TaskStatus::Completed);
        assert_eq!(t.stamps, &[TaskDate::Processed, TaskDate::Completed]);
    }

    #[test]
    fn process_with_confirmer_waits_for_confirmation() {
        let t = transition(TaskStatus::InProgress, TaskAction::Process, true).unwrap();
        assert_eq!(t.status, TaskStatus::Confirming);
    }

    #[test]
    fn failed_confirmation_counts_failure() {
        let t = transition(
            TaskStatus::Confirming,
            TaskAction::Confirm { passed: false },
            true,
        )
        .unwrap();
        assert_eq!(t.status, TaskStatus::Pending);
        assert_eq!(t.failure_increment, 1);
    }

    #[test]
    fn passed_confirmation_completes() {
        let t = transition(TaskStatus::Confirming, TaskAction::Confirm { passed: true }, true)
            .unwrap();
        assert_eq!(t.status, TaskStatus::Completed);
        assert_eq!(t.failure_increment, 0);
    }

    #[test]
    fn cancel_only_live_tasks() {
        assert!(transition(TaskStatus::Confirming, TaskAction::Cancel, false).is_ok());
        assert_matches!(
            transition(TaskStatus::Completed, TaskAction::Cancel, false),
            Err(CoreError::Business(_))
        );
    }

    #[test]
    fn reopen_clears_progress() {
        let t = transition(TaskStatus::Canceled, TaskAction::Reopen, false).unwrap();
        assert_eq!(t.status, TaskStatus::Pending);
        assert!(t.clear_progress_dates);
        assert!(transition(TaskStatus::Pending, TaskAction::Reopen, false).is_err());
    }

    #[test]
    fn confirm_requires_confirming() {
        assert!(transition(TaskStatus::InProgress, TaskAction::Confirm { passed: true }, true).is_err());
    }

    #[test]
    fn overdue_ignores_finished_tasks() {
        let now = Utc::now();
        let past = Some(now - Duration::hours(1));
        assert!(is_overdue(TaskStatus::InProgress, past, now));
        assert!(!is_overdue(TaskStatus::Completed, past, now));
        assert!(!is_overdue(TaskStatus::Pending, None, now));
    }

    #[test]
    fn path_actions_parse() {
        assert_eq!(TaskAction::from_path("start").unwrap(), TaskAction::Start);
        assert!(TaskAction::from_path("confirm").is_err());
    }

    #[test]
    fn code_is_zero_padded() {
        assert_eq!(format_code(TASK_CODE_PREFIX, 42), "T000042");
    }
}
