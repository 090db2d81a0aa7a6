//! Functional test case model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use angus_core::error::CoreError;
use angus_core::func::{CaseReviewStatus, CaseTestResult};
use angus_core::priority::Priority;
use angus_core::stats::CaseStat;
use angus_core::types::{DbId, Timestamp};

use crate::models::tag::TagInfo;
use crate::models::RefItem;

/// A row from the `func_cases` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FuncCase {
    pub id: DbId,
    pub tenant_id: DbId,
    pub project_id: DbId,
    pub plan_id: DbId,
    pub name: String,
    pub code: String,
    pub priority: String,
    pub tester_id: DbId,
    pub developer_id: Option<DbId>,
    pub review_status: String,
    pub test_result: String,
    pub deadline_date: Option<Timestamp>,
    pub test_result_handle_date: Option<Timestamp>,
    pub review_date: Option<Timestamp>,
    pub eval_workload: Option<f64>,
    pub actual_workload: Option<f64>,
    pub test_num: i32,
    pub test_fail_num: i32,
    pub review_num: i32,
    pub precondition: Option<String>,
    pub steps: serde_json::Value,
    pub description: Option<String>,
    pub deleted_at: Option<Timestamp>,
    pub created_by: DbId,
    pub created_at: Timestamp,
    pub last_modified_by: DbId,
    pub updated_at: Timestamp,
}

impl FuncCase {
    pub fn review_status(&self) -> Result<CaseReviewStatus, CoreError> {
        CaseReviewStatus::from_str_value(&self.review_status)
    }

    pub fn to_stat(&self) -> Result<CaseStat, CoreError> {
        Ok(CaseStat {
            test_result: CaseTestResult::from_str_value(&self.test_result)?,
            review_status: self.review_status()?,
            deadline_date: self.deadline_date,
            test_fail_num: self.test_fail_num,
            eval_workload: self.eval_workload,
            actual_workload: self.actual_workload,
            created_at: self.created_at,
            test_result_handle_date: self.test_result_handle_date,
        })
    }

    /// Frozen copy stored by baselines and reviews.
    pub fn snapshot(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// One step of a case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseStep {
    pub step: String,
    pub expected_result: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCase {
    pub plan_id: DbId,
    #[validate(length(min = 1, max = 400))]
    pub name: String,
    pub priority: Option<Priority>,
    /// Defaults to the caller.
    pub tester_id: Option<DbId>,
    pub developer_id: Option<DbId>,
    pub deadline_date: Option<Timestamp>,
    #[validate(range(min = 0.0, max = 100000.0))]
    pub eval_workload: Option<f64>,
    #[validate(length(max = 20000))]
    pub precondition: Option<String>,
    #[serde(default)]
    pub steps: Vec<CaseStep>,
    #[validate(length(max = 20000))]
    pub description: Option<String>,
    #[serde(default)]
    pub tag_ids: Vec<DbId>,
    #[serde(default)]
    pub ref_task_ids: Vec<DbId>,
    #[serde(default)]
    pub ref_case_ids: Vec<DbId>,
}

#[derive(Debug, Clone)]
pub struct NewCase {
    pub tenant_id: DbId,
    pub project_id: DbId,
    pub plan_id: DbId,
    pub name: String,
    pub priority: Priority,
    pub tester_id: DbId,
    pub developer_id: Option<DbId>,
    pub deadline_date: Option<Timestamp>,
    pub eval_workload: Option<f64>,
    pub precondition: Option<String>,
    pub steps: serde_json::Value,
    pub description: Option<String>,
    pub created_by: DbId,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCase {
    #[validate(length(min = 1, max = 400))]
    pub name: Option<String>,
    pub priority: Option<Priority>,
    pub tester_id: Option<DbId>,
    pub developer_id: Option<DbId>,
    pub deadline_date: Option<Timestamp>,
    #[validate(range(min = 0.0, max = 100000.0))]
    pub eval_workload: Option<f64>,
    #[validate(length(max = 20000))]
    pub precondition: Option<String>,
    pub steps: Option<Vec<CaseStep>>,
    #[validate(length(max = 20000))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SetCaseResult {
    pub result: CaseTestResult,
    #[validate(range(min = 0.0, max = 100000.0))]
    pub actual_workload: Option<f64>,
}

/// Replace the task and case associations of a case.
#[derive(Debug, Clone, Deserialize)]
pub struct SetCaseRefs {
    #[serde(default)]
    pub task_ids: Vec<DbId>,
    #[serde(default)]
    pub case_ids: Vec<DbId>,
}

/// A row from the `func_case_refs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CaseRef {
    pub id: DbId,
    pub case_id: DbId,
    pub ref_type: String,
    pub ref_id: DbId,
    pub created_by: DbId,
    pub created_at: Timestamp,
}

/// Case with its live associations.
#[derive(Debug, Clone, Serialize)]
pub struct CaseDetail {
    #[serde(flatten)]
    pub case: FuncCase,
    pub tags: Vec<TagInfo>,
    pub ref_tasks: Vec<RefItem>,
    pub ref_cases: Vec<RefItem>,
    pub tester_name: Option<String>,
    pub comment_count: i64,
}
