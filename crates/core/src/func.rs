//! Functional testing rules: plans, case results, reviews and baselines.

use crate::error::CoreError;
use crate::macros::define_code_enum;
use crate::sprint::{invalid_transition, LifecycleAction};
use crate::types::Timestamp;

/// Prefix of generated case codes.
pub const CASE_CODE_PREFIX: &str = "C";

/// Maximum number of steps a case may carry.
pub const MAX_CASE_STEPS: usize = 200;

define_code_enum! {
    PlanStatus {
        Pending => "PENDING",
        InProgress => "IN_PROGRESS",
        Blocked => "BLOCKED",
        Completed => "COMPLETED",
    }
}

define_code_enum! {
    CaseTestResult {
        Pending => "PENDING",
        Passed => "PASSED",
        NotPassed => "NOT_PASSED",
        Blocked => "BLOCKED",
        Canceled => "CANCELED",
    }
}

define_code_enum! {
    CaseReviewStatus {
        Pending => "PENDING",
        Passed => "PASSED",
        Failed => "FAILED",
    }
}

define_code_enum! {
    ReviewStatus {
        Pending => "PENDING",
        InProgress => "IN_PROGRESS",
        Completed => "COMPLETED",
    }
}

define_code_enum! {
    ReviewAction {
        Start => "start",
        End => "end",
    }
}

define_code_enum! {
    /// Kind of item a case is associated with.
    CaseRefType {
        Task => "task",
        Case => "case",
    }
}

// ---------------------------------------------------------------------------
// Plan lifecycle
// ---------------------------------------------------------------------------

/// Plans follow the sprint lifecycle without the task gate.
pub fn next_plan_status(
    current: PlanStatus,
    action: LifecycleAction,
) -> Result<PlanStatus, CoreError> {
    use LifecycleAction as A;
    use PlanStatus as S;

    match (current, action) {
        (S::Pending, A::Start) => Ok(S::InProgress),
        (S::InProgress, A::Block) => Ok(S::Blocked),
        (S::Blocked, A::Unblock) => Ok(S::InProgress),
        (S::InProgress, A::Complete) => Ok(S::Completed),
        (S::Completed, A::Reopen) => Ok(S::Pending),
        (_, A::Restart) => Ok(S::Pending),
        (from, action) => Err(invalid_transition("plan", from.as_str(), action)),
    }
}

// ---------------------------------------------------------------------------
// Case results
// ---------------------------------------------------------------------------

/// Counter and date changes produced by recording a test result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultUpdate {
    pub result: CaseTestResult,
    pub test_num_increment: i32,
    pub test_fail_num_increment: i32,
    /// `true` stamps the handle date, `false` clears it.
    pub stamp_handle_date: bool,
}

/// Validate and compute a result change.
///
/// Plans with `review_flag` only accept results on reviewed-and-passed cases.
pub fn result_update(
    review_flag: bool,
    review_status: CaseReviewStatus,
    result: CaseTestResult,
) -> Result<ResultUpdate, CoreError> {
    if review_flag && review_status != CaseReviewStatus::Passed {
        return Err(CoreError::Business(
            "Case must pass review before a test result is recorded".to_string(),
        ));
    }

    let (test_num_increment, test_fail_num_increment) = match result {
        CaseTestResult::Passed => (1, 0),
        CaseTestResult::NotPassed => (1, 1),
        _ => (0, 0),
    };

    Ok(ResultUpdate {
        result,
        test_num_increment,
        test_fail_num_increment,
        stamp_handle_date: result != CaseTestResult::Pending,
    })
}

/// A case is finished once it has a passing or canceled result.
pub fn is_case_finished(result: CaseTestResult) -> bool {
    matches!(result, CaseTestResult::Passed | CaseTestResult::Canceled)
}

pub fn is_case_overdue(
    result: CaseTestResult,
    deadline: Option<Timestamp>,
    now: Timestamp,
) -> bool {
    !is_case_finished(result) && deadline.is_some_and(|d| d < now)
}

// ---------------------------------------------------------------------------
// Reviews
// ---------------------------------------------------------------------------

pub fn next_review_status(
    current: ReviewStatus,
    action: ReviewAction,
) -> Result<ReviewStatus, CoreError> {
    match (current, action) {
        (ReviewStatus::Pending, ReviewAction::Start) => Ok(ReviewStatus::InProgress),
        (ReviewStatus::InProgress, ReviewAction::End) => Ok(ReviewStatus::Completed),
        (from, action) => Err(CoreError::Business(format!(
            "Cannot {action} review in status {from}"
        ))),
    }
}

/// Cases are reviewed one by one while the review is running, and only to a
/// definite outcome.
pub fn check_case_review(
    review: ReviewStatus,
    outcome: CaseReviewStatus,
) -> Result<(), CoreError> {
    if review != ReviewStatus::InProgress {
        return Err(CoreError::Business(
            "Cases can only be reviewed while the review is in progress".to_string(),
        ));
    }
    if outcome == CaseReviewStatus::Pending {
        return Err(CoreError::Validation(
            "Review outcome must be PASSED or FAILED".to_string(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Baselines
// ---------------------------------------------------------------------------

/// Established baselines are frozen.
pub fn check_baseline_editable(established: bool) -> Result<(), CoreError> {
    if established {
        Err(CoreError::Business(
            "Baseline is established and can no longer change".to_string(),
        ))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn plan_complete_has_no_gate() {
        assert_eq!(
            next_plan_status(PlanStatus::InProgress, LifecycleAction::Complete).unwrap(),
            PlanStatus::Completed
        );
        assert!(next_plan_status(PlanStatus::Pending, LifecycleAction::Complete).is_err());
    }

    #[test]
    fn result_requires_passed_review_when_flagged() {
        assert_matches!(
            result_update(true, CaseReviewStatus::Pending, CaseTestResult::Passed),
            Err(CoreError::Business(_))
        );
        assert!(result_update(true, CaseReviewStatus::Passed, CaseTestResult::Passed).is_ok());
        assert!(result_update(false, CaseReviewStatus::Pending, CaseTestResult::Passed).is_ok());
    }

    #[test]
    fn not_passed_counts_failure() {
        let u = result_update(false, CaseReviewStatus::Pending, CaseTestResult::NotPassed).unwrap();
        assert_eq!((u.test_num_increment, u.test_fail_num_increment), (1, 1));
        assert!(u.stamp_handle_date);
    }

    #[test]
    fn pending_clears_handle_date() {
        let u = result_update(false, CaseReviewStatus::Pending, CaseTestResult::Pending).unwrap();
        assert_eq!((u.test_num_increment, u.test_fail_num_increment), (0, 0));
        assert!(!u.stamp_handle_date);
    }

    #[test]
    fn review_lifecycle() {
        let s = next_review_status(ReviewStatus::Pending, ReviewAction::Start).unwrap();
        assert_eq!(s, ReviewStatus::InProgress);
        assert_eq!(
            next_review_status(s, ReviewAction::End).unwrap(),
            ReviewStatus::Completed
        );
        assert!(next_review_status(ReviewStatus::Completed, ReviewAction::Start).is_err());
    }

    #[test]
    fn case_review_only_in_progress() {
        assert!(check_case_review(ReviewStatus::InProgress, CaseReviewStatus::Passed).is_ok());
        assert_matches!(
            check_case_review(ReviewStatus::Pending, CaseReviewStatus::Passed),
            Err(CoreError::Business(_))
        );
        assert_matches!(
            check_case_review(ReviewStatus::InProgress, CaseReviewStatus::Pending),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn established_baseline_is_frozen() {
        assert!(check_baseline_editable(false).is_ok());
        assert!(check_baseline_editable(true).is_err());
    }
}
