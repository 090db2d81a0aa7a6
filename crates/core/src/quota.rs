//! Per-tenant resource quotas.

use crate::error::CoreError;
use crate::macros::define_code_enum;

define_code_enum! {
    QuotaKind {
        Projects => "PROJECTS",
        SprintsPerProject => "SPRINTS_PER_PROJECT",
        TasksPerSprint => "TASKS_PER_SPRINT",
        PlansPerProject => "PLANS_PER_PROJECT",
        CasesPerPlan => "CASES_PER_PLAN",
        TagsPerProject => "TAGS_PER_PROJECT",
        Nodes => "NODES",
        ReportsPerProject => "REPORTS_PER_PROJECT",
    }
}

impl QuotaKind {
    /// Limit applied when the tenant has no override row.
    pub fn default_limit(self) -> i64 {
        match self {
            QuotaKind::Projects => 200,
            QuotaKind::SprintsPerProject => 200,
            QuotaKind::TasksPerSprint => 2_000,
            QuotaKind::PlansPerProject => 200,
            QuotaKind::CasesPerPlan => 5_000,
            QuotaKind::TagsPerProject => 500,
            QuotaKind::Nodes => 50,
            QuotaKind::ReportsPerProject => 200,
        }
    }
}

/// Refuse adding `increment` items when it would push `current` past `limit`.
pub fn check_quota(
    kind: QuotaKind,
    current: i64,
    increment: i64,
    limit: i64,
) -> Result<(), CoreError> {
    if current + increment > limit {
        return Err(CoreError::QuotaExceeded(format!(
            "{kind} quota of {limit} reached ({current} in use, {increment} requested)"
        )));
    }
    Ok(())
}
