//! Execution job records.
//!
//! Executions are run by an external runner that polls `PENDING` rows. This
//! side only moves a row into and out of the queue and accepts the runner's
//! status reports.

use crate::error::CoreError;
use crate::macros::define_code_enum;

/// Upper bound on concurrent virtual users per execution.
pub const MAX_THREAD_COUNT: i32 = 10_000;

/// Upper bound on the configured execution duration (7 days).
pub const MAX_DURATION_SECS: i64 = 7 * 24 * 3600;

define_code_enum! {
    ExecStatus {
        Created => "CREATED",
        Pending => "PENDING",
        Running => "RUNNING",
        Stopped => "STOPPED",
        Failed => "FAILED",
        Completed => "COMPLETED",
        Timeout => "TIMEOUT",
    }
}

impl ExecStatus {
    /// Runner-side terminal states.
    pub fn is_finished(self) -> bool {
        matches!(
            self,
            ExecStatus::Stopped | ExecStatus::Failed | ExecStatus::Completed | ExecStatus::Timeout
        )
    }
}

define_code_enum! {
    ScriptType {
        TestFunctionality => "TEST_FUNCTIONALITY",
        TestPerformance => "TEST_PERFORMANCE",
        TestStability => "TEST_STABILITY",
        TestCustomization => "TEST_CUSTOMIZATION",
        MockData => "MOCK_DATA",
        MockApis => "MOCK_APIS",
    }
}

/// Queue an execution for the runner.
pub fn check_start(current: ExecStatus) -> Result<ExecStatus, CoreError> {
    if current == ExecStatus::Created || current.is_finished() {
        Ok(ExecStatus::Pending)
    } else {
        Err(CoreError::Business(format!(
            "Execution is already {current}"
        )))
    }
}

pub fn check_stop(current: ExecStatus) -> Result<ExecStatus, CoreError> {
    match current {
        ExecStatus::Pending | ExecStatus::Running => Ok(ExecStatus::Stopped),
        other => Err(CoreError::Business(format!(
            "Execution in status {other} cannot be stopped"
        ))),
    }
}

/// Validate a status reported by the runner.
pub fn check_runner_report(current: ExecStatus, reported: ExecStatus) -> Result<(), CoreError> {
    match reported {
        ExecStatus::Running | ExecStatus::Completed | ExecStatus::Failed | ExecStatus::Timeout => {}
        other => {
            return Err(CoreError::Validation(format!(
                "Runner cannot report status {other}"
            )))
        }
    }
    match current {
        ExecStatus::Pending | ExecStatus::Running => Ok(()),
        other => Err(CoreError::Conflict(format!(
            "Execution in status {other} is not accepting results"
        ))),
    }
}

/// Validate load parameters shared by create and update.
pub fn validate_load(
    thread_count: i32,
    iterations: Option<i64>,
    duration_secs: Option<i64>,
) -> Result<(), CoreError> {
    if !(1..=MAX_THREAD_COUNT).contains(&thread_count) {
        return Err(CoreError::Validation(format!(
            "Thread count must be between 1 and {MAX_THREAD_COUNT}"
        )));
    }
    if iterations.is_none() && duration_secs.is_none() {
        return Err(CoreError::Validation(
            "Either iterations or duration must be set".to_string(),
        ));
    }
    if iterations.is_some_and(|i| i < 1) {
        return Err(CoreError::Validation("Iterations must be positive".to_string()));
    }
    if duration_secs.is_some_and(|d| !(1..=MAX_DURATION_SECS).contains(&d)) {
        return Err(CoreError::Validation(format!(
            "Duration must be between 1 and {MAX_DURATION_SECS} seconds"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn start_from_created_or_finished() {
        assert_eq!(check_start(ExecStatus::Created).unwrap(), ExecStatus::Pending);
        assert_eq!(check_start(ExecStatus::Timeout).unwrap(), ExecStatus::Pending);
        assert!(check_start(ExecStatus::Running).is_err());
        assert!(check_start(ExecStatus::Pending).is_err());
    }

    #[test]
    fn stop_only_queued_or_running() {
        assert_eq!(check_stop(ExecStatus::Running).unwrap(), ExecStatus::Stopped);
        assert!(check_stop(ExecStatus::Completed).is_err());
    }

    #[test]
    fn runner_reports() {
        assert!(check_runner_report(ExecStatus::Pending, ExecStatus::Running).is_ok());
        assert!(check_runner_report(ExecStatus::Running, ExecStatus::Completed).is_ok());
        assert_matches!(
            check_runner_report(ExecStatus::Running, ExecStatus::Created),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            check_runner_report(ExecStatus::Stopped, ExecStatus::Completed),
            Err(CoreError::Conflict(_))
        );
    }

    #[test]
    fn load_parameters() {
        assert!(validate_load(10, Some(100), None).is_ok());
        assert!(validate_load(10, None, Some(60)).is_ok());
        assert!(validate_load(0, Some(1), None).is_err());
        assert!(validate_load(10, None, None).is_err());
        assert!(validate_load(10, None, Some(MAX_DURATION_SECS + 1)).is_err());
    }
}
