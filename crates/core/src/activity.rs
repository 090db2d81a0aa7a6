//! Activity log vocabulary.
//!
//! Every mutating command appends one activity row describing who did what
//! to which target. Rows are never updated.

use crate::macros::define_code_enum;

/// Maximum stored length of an activity detail line.
pub const MAX_DETAIL_LENGTH: usize = 1_000;

define_code_enum! {
    ActivityType {
        Created => "CREATED",
        Updated => "UPDATED",
        Deleted => "DELETED",
        StatusUpdated => "STATUS_UPDATED",
        TagUpdated => "TAG_UPDATED",
        AssigneeUpdated => "ASSIGNEE_UPDATED",
        ResultUpdated => "RESULT_UPDATED",
        Reviewed => "REVIEWED",
        BaselineEstablished => "BASELINE_ESTABLISHED",
        ExecStarted => "EXEC_STARTED",
        ExecStopped => "EXEC_STOPPED",
        ReportGenerated => "REPORT_GENERATED",
        Restored => "RESTORED",
    }
}

define_code_enum! {
    /// Kind of business object an activity, tag, comment or trash entry
    /// refers to.
    TargetType {
        Project => "PROJECT",
        TaskSprint => "TASK_SPRINT",
        Task => "TASK",
        FuncPlan => "FUNC_PLAN",
        FuncCase => "FUNC_CASE",
        FuncBaseline => "FUNC_BASELINE",
        FuncReview => "FUNC_REVIEW",
        Exec => "EXEC",
        Report => "REPORT",
        Node => "NODE",
        Setting => "SETTING",
    }
}

impl TargetType {
    /// Targets that can carry tags and comments.
    pub fn is_taggable(self) -> bool {
        matches!(self, TargetType::Task | TargetType::FuncCase)
    }

    /// Targets that go to the trash instead of being deleted.
    pub fn is_trashable(self) -> bool {
        matches!(
            self,
            TargetType::Project
                | TargetType::TaskSprint
                | TargetType::Task
                | TargetType::FuncPlan
                | TargetType::FuncCase
                | TargetType::Report
        )
    }

    /// Table holding rows of this kind.
    pub fn table(self) -> &'static str {
        match self {
            TargetType::Project => "projects",
            TargetType::TaskSprint => "task_sprints",
            TargetType::Task => "tasks",
            TargetType::FuncPlan => "func_plans",
            TargetType::FuncCase => "func_cases",
            TargetType::FuncBaseline => "func_baselines",
            TargetType::FuncReview => "func_reviews",
            TargetType::Exec => "execs",
            TargetType::Report => "reports",
            TargetType::Node => "nodes",
            TargetType::Setting => "tenant_settings",
        }
    }
}

/// Human-readable one-line description stored alongside the activity.
pub fn describe(activity: ActivityType, target: TargetType, name: &str) -> String {
    let noun = target.as_str().to_lowercase().replace('_', " ");
    let verb = match activity {
        ActivityType::Created => "created",
        ActivityType::Updated => "updated",
        ActivityType::Deleted => "deleted",
        ActivityType::StatusUpdated => "changed the status of",
        ActivityType::TagUpdated => "updated the tags of",
        ActivityType::AssigneeUpdated => "reassigned",
        ActivityType::ResultUpdated => "recorded a result for",
        ActivityType::Reviewed => "reviewed",
        ActivityType::BaselineEstablished => "established",
        ActivityType::ExecStarted => "started",
        ActivityType::ExecStopped => "stopped",
        ActivityType::ReportGenerated => "generated",
        ActivityType::Restored => "restored",
    };
    let mut detail = format!("{verb} {noun} \"{name}\"");
    truncate_chars(&mut detail, MAX_DETAIL_LENGTH);
    detail
}

fn truncate_chars(s: &mut String, max: usize) {
    if let Some((idx, _)) = s.char_indices().nth(max) {
        s.truncate(idx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_reads_naturally() {
        assert_eq!(
            describe(ActivityType::TagUpdated, TargetType::FuncCase, "Login works"),
            "updated the tags of func case \"Login works\""
        );
    }

    #[test]
    fn describe_truncates_long_names() {
        let detail = describe(ActivityType::Created, TargetType::Task, &"é".repeat(2_000));
        assert_eq!(detail.chars().count(), MAX_DETAIL_LENGTH);
    }

    #[test]
    fn only_tasks_and_cases_are_taggable() {
        let taggable: Vec<_> = TargetType::ALL.iter().filter(|t| t.is_taggable()).collect();
        assert_eq!(taggable, vec![&TargetType::Task, &TargetType::FuncCase]);
    }

    #[test]
    fn trashable_targets() {
        assert!(TargetType::Report.is_trashable());
        assert!(!TargetType::Exec.is_trashable());
    }
}
