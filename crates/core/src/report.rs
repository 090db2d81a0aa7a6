//! Report templates and generation states.

use crate::activity::TargetType;
use crate::macros::define_code_enum;

define_code_enum! {
    ReportTemplate {
        ProjectProgress => "PROJECT_PROGRESS",
        TaskSprint => "TASK_SPRINT",
        Task => "TASK",
        FuncTestingPlan => "FUNC_TESTING_PLAN",
        FuncTestingCase => "FUNC_TESTING_CASE",
        ExecFunctionalResult => "EXEC_FUNCTIONAL_RESULT",
        ExecPerfResult => "EXEC_PERF_RESULT",
        ExecStabilityResult => "EXEC_STABILITY_RESULT",
    }
}

define_code_enum! {
    ReportCategory {
        Project => "PROJECT",
        Task => "TASK",
        Functional => "FUNCTIONAL",
        Execution => "EXECUTION",
    }
}

define_code_enum! {
    ReportStatus {
        Pending => "PENDING",
        Success => "SUCCESS",
        Failure => "FAILURE",
    }
}

impl ReportTemplate {
    pub fn category(self) -> ReportCategory {
        use ReportTemplate as T;
        match self {
            T::ProjectProgress => ReportCategory::Project,
            T::TaskSprint | T::Task => ReportCategory::Task,
            T::FuncTestingPlan | T::FuncTestingCase => ReportCategory::Functional,
            T::ExecFunctionalResult | T::ExecPerfResult | T::ExecStabilityResult => {
                ReportCategory::Execution
            }
        }
    }

    /// Kind of row the report's `target_id` points at.
    pub fn target_type(self) -> TargetType {
        use ReportTemplate as T;
        match self {
            T::ProjectProgress => TargetType::Project,
            T::TaskSprint => TargetType::TaskSprint,
            T::Task => TargetType::Task,
            T::FuncTestingPlan => TargetType::FuncPlan,
            T::FuncTestingCase => TargetType::FuncCase,
            T::ExecFunctionalResult | T::ExecPerfResult | T::ExecStabilityResult => {
                TargetType::Exec
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_follows_template() {
        assert_eq!(ReportTemplate::ProjectProgress.category(), ReportCategory::Project);
        assert_eq!(ReportTemplate::TaskSprint.category(), ReportCategory::Task);
        assert_eq!(ReportTemplate::FuncTestingCase.category(), ReportCategory::Functional);
        assert_eq!(ReportTemplate::ExecPerfResult.category(), ReportCategory::Execution);
    }

    #[test]
    fn every_template_has_a_target() {
        for template in ReportTemplate::ALL {
            let _ = template.target_type();
        }
        assert_eq!(ReportTemplate::ExecStabilityResult.target_type(), TargetType::Exec);
    }
}
