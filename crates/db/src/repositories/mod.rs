//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods. Reads
//! accept `&PgPool`; writes accept the caller's transaction so the
//! mutation and its activity row commit together.

use angus_core::types::DbId;

use crate::PgTx;

pub mod activity_repo;
pub mod comment_repo;
pub mod exec_repo;
pub mod func_baseline_repo;
pub mod func_case_repo;
pub mod func_plan_repo;
pub mod func_review_repo;
pub mod indicator_repo;
pub mod node_repo;
pub mod project_repo;
pub mod report_repo;
pub mod setting_repo;
pub mod sprint_repo;
pub mod tag_repo;
pub mod task_repo;
pub mod trash_repo;
pub mod user_repo;

pub use activity_repo::ActivityRepo;
pub use comment_repo::CommentRepo;
pub use exec_repo::ExecRepo;
pub use func_baseline_repo::FuncBaselineRepo;
pub use func_case_repo::FuncCaseRepo;
pub use func_plan_repo::FuncPlanRepo;
pub use func_review_repo::FuncReviewRepo;
pub use indicator_repo::IndicatorRepo;
pub use node_repo::NodeRepo;
pub use project_repo::ProjectRepo;
pub use report_repo::ReportRepo;
pub use setting_repo::SettingRepo;
pub use sprint_repo::SprintRepo;
pub use tag_repo::TagRepo;
pub use task_repo::TaskRepo;
pub use trash_repo::TrashRepo;
pub use user_repo::UserRepo;

/// Next sequence number for `<prefix><digits>` codes within a project.
///
/// Locks the project row so concurrent inserts in the same project
/// allocate distinct codes. Trashed rows keep their codes.
pub(crate) async fn next_code_seq(
    tx: &mut PgTx<'_>,
    table: &'static str,
    project_id: DbId,
    prefix: &'static str,
) -> Result<i64, sqlx::Error> {
    sqlx::query("SELECT id FROM projects WHERE id = $1 FOR UPDATE")
        .bind(project_id)
        .execute(&mut **tx)
        .await?;

    let query = format!(
        "SELECT COALESCE(MAX(CAST(SUBSTRING(code FROM $2) AS BIGINT)), 0) \
         FROM {table} WHERE project_id = $1 AND code ~ $3"
    );
    let (max,): (i64,) = sqlx::query_as(&query)
        .bind(project_id)
        .bind(prefix.len() as i32 + 1)
        .bind(format!("^{prefix}[0-9]+$"))
        .fetch_one(&mut **tx)
        .await?;
    Ok(max + 1)
}
