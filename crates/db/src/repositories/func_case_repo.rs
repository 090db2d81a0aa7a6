//! Repository for the `func_cases` and `func_case_refs` tables.

use sqlx::PgPool;

use angus_core::context::RequestContext;
use angus_core::func::{CaseRefType, CaseReviewStatus, ResultUpdate, CASE_CODE_PREFIX};
use angus_core::task::format_code;
use angus_core::types::DbId;

use crate::models::func_case::{CaseRef, FuncCase, NewCase, UpdateCase};
use crate::models::RefItem;
use crate::repositories::next_code_seq;
use crate::PgTx;

pub(crate) const COLUMNS: &str = "\
    t.id, t.tenant_id, t.project_id, t.plan_id, t.name, t.code, t.priority, \
    t.tester_id, t.developer_id, t.review_status, t.test_result, t.deadline_date, \
    t.test_result_handle_date, t.review_date, t.eval_workload, t.actual_workload, \
    t.test_num, t.test_fail_num, t.review_num, t.precondition, t.steps, \
    t.description, t.deleted_at, t.created_by, t.created_at, \
    t.last_modified_by, t.updated_at";

const REF_COLUMNS: &str = "id, case_id, ref_type, ref_id, created_by, created_at";

pub struct FuncCaseRepo;

impl FuncCaseRepo {
    // -----------------------------------------------------------------------
    // Cases
    // -----------------------------------------------------------------------

    /// Insert a case, allocating the next `C000123` code of its project.
    pub async fn insert(tx: &mut PgTx<'_>, new: &NewCase) -> Result<FuncCase, sqlx::Error> {
        let seq = next_code_seq(tx, "func_cases", new.project_id, CASE_CODE_PREFIX).await?;
        let code = format_code(CASE_CODE_PREFIX, seq);

        let query = format!(
            "INSERT INTO func_cases AS t \
                 (tenant_id, project_id, plan_id, name, code, priority, tester_id, \
                  developer_id, deadline_date, eval_workload, precondition, steps, \
                  description, created_by, last_modified_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $14) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FuncCase>(&query)
            .bind(new.tenant_id)
            .bind(new.project_id)
            .bind(new.plan_id)
            .bind(&new.name)
            .bind(&code)
            .bind(new.priority.as_str())
            .bind(new.tester_id)
            .bind(new.developer_id)
            .bind(new.deadline_date)
            .bind(new.eval_workload)
            .bind(&new.precondition)
            .bind(&new.steps)
            .bind(&new.description)
            .bind(new.created_by)
            .fetch_one(&mut **tx)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        tenant_id: DbId,
        id: DbId,
    ) -> Result<Option<FuncCase>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM func_cases t \
             WHERE t.tenant_id = $1 AND t.id = $2 AND t.deleted_at IS NULL"
        );
        sqlx::query_as::<_, FuncCase>(&query)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Live cases of one plan among `ids`, in id order.
    pub async fn find_in_plan(
        pool: &PgPool,
        tenant_id: DbId,
        plan_id: DbId,
        ids: &[DbId],
    ) -> Result<Vec<FuncCase>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM func_cases t \
             WHERE t.tenant_id = $1 AND t.plan_id = $2 AND t.id = ANY($3) \
               AND t.deleted_at IS NULL \
             ORDER BY t.id"
        );
        sqlx::query_as::<_, FuncCase>(&query)
            .bind(tenant_id)
            .bind(plan_id)
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    /// Live cases of a project, optionally restricted to one plan.
    pub async fn list_for_stats(
        pool: &PgPool,
        tenant_id: DbId,
        project_id: DbId,
        plan_id: Option<DbId>,
    ) -> Result<Vec<FuncCase>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM func_cases t \
             WHERE t.tenant_id = $1 AND t.project_id = $2 AND t.deleted_at IS NULL \
               AND ($3::BIGINT IS NULL OR t.plan_id = $3) \
             ORDER BY t.id"
        );
        sqlx::query_as::<_, FuncCase>(&query)
            .bind(tenant_id)
            .bind(project_id)
            .bind(plan_id)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        tx: &mut PgTx<'_>,
        ctx: &RequestContext,
        id: DbId,
        name: Option<&str>,
        steps: Option<&serde_json::Value>,
        input: &UpdateCase,
    ) -> Result<Option<FuncCase>, sqlx::Error> {
        let query = format!(
            "UPDATE func_cases t SET \
                 name = COALESCE($3, t.name), \
                 priority = COALESCE($4, t.priority), \
                 tester_id = COALESCE($5, t.tester_id), \
                 developer_id = COALESCE($6, t.developer_id), \
                 deadline_date = COALESCE($7, t.deadline_date), \
                 eval_workload = COALESCE($8, t.eval_workload), \
                 precondition = COALESCE($9, t.precondition), \
                 steps = COALESCE($10, t.steps), \
                 description = COALESCE($11, t.description), \
                 last_modified_by = $12, \
                 updated_at = NOW() \
             WHERE t.tenant_id = $1 AND t.id = $2 AND t.deleted_at IS NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FuncCase>(&query)
            .bind(ctx.tenant_id)
            .bind(id)
            .bind(name)
            .bind(input.priority.map(|p| p.as_str()))
            .bind(input.tester_id)
            .bind(input.developer_id)
            .bind(input.deadline_date)
            .bind(input.eval_workload)
            .bind(&input.precondition)
            .bind(steps)
            .bind(&input.description)
            .bind(ctx.user_id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Record a test result and bump the counters it implies.
    pub async fn set_result(
        tx: &mut PgTx<'_>,
        ctx: &RequestContext,
        id: DbId,
        update: &ResultUpdate,
        actual_workload: Option<f64>,
    ) -> Result<Option<FuncCase>, sqlx::Error> {
        let query = format!(
            "UPDATE func_cases t SET \
                 test_result = $3, \
                 test_num = t.test_num + $4, \
                 test_fail_num = t.test_fail_num + $5, \
                 test_result_handle_date = CASE WHEN $6 THEN NOW() ELSE NULL END, \
                 actual_workload = COALESCE($7, t.actual_workload), \
                 last_modified_by = $8, \
                 updated_at = NOW() \
             WHERE t.tenant_id = $1 AND t.id = $2 AND t.deleted_at IS NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FuncCase>(&query)
            .bind(ctx.tenant_id)
            .bind(id)
            .bind(update.result.as_str())
            .bind(update.test_num_increment)
            .bind(update.test_fail_num_increment)
            .bind(update.stamp_handle_date)
            .bind(actual_workload)
            .bind(ctx.user_id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Write a review outcome onto the case.
    pub async fn set_review(
        tx: &mut PgTx<'_>,
        ctx: &RequestContext,
        id: DbId,
        outcome: CaseReviewStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE func_cases SET \
                 review_status = $3, review_num = review_num + 1, review_date = NOW(), \
                 last_modified_by = $4, updated_at = NOW() \
             WHERE tenant_id = $1 AND id = $2 AND deleted_at IS NULL",
        )
        .bind(ctx.tenant_id)
        .bind(id)
        .bind(outcome.as_str())
        .bind(ctx.user_id)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn soft_delete(
        tx: &mut PgTx<'_>,
        ctx: &RequestContext,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE func_cases SET deleted_at = NOW(), last_modified_by = $3, updated_at = NOW() \
             WHERE tenant_id = $1 AND id = $2 AND deleted_at IS NULL",
        )
        .bind(ctx.tenant_id)
        .bind(id)
        .bind(ctx.user_id)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count_in_plan(pool: &PgPool, plan_id: DbId) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM func_cases WHERE plan_id = $1 AND deleted_at IS NULL",
        )
        .bind(plan_id)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    /// How many of `ids` are live cases of `project_id`.
    pub async fn count_in_project(
        pool: &PgPool,
        project_id: DbId,
        ids: &[DbId],
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM func_cases \
             WHERE project_id = $1 AND id = ANY($2) AND deleted_at IS NULL",
        )
        .bind(project_id)
        .bind(ids)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    pub async fn ref_items(pool: &PgPool, ids: &[DbId]) -> Result<Vec<RefItem>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, RefItem>(
            "SELECT id, name, code FROM func_cases \
             WHERE id = ANY($1) AND deleted_at IS NULL ORDER BY id",
        )
        .bind(ids)
        .fetch_all(pool)
        .await
    }

    // -----------------------------------------------------------------------
    // Associations
    // -----------------------------------------------------------------------

    /// Replace every association of a case.
    pub async fn replace_refs(
        tx: &mut PgTx<'_>,
        case_id: DbId,
        task_ids: &[DbId],
        case_ids: &[DbId],
        user_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM func_case_refs WHERE case_id = $1")
            .bind(case_id)
            .execute(&mut **tx)
            .await?;

        for (ref_type, ids) in [(CaseRefType::Task, task_ids), (CaseRefType::Case, case_ids)] {
            if ids.is_empty() {
                continue;
            }
            sqlx::query(
                "INSERT INTO func_case_refs (case_id, ref_type, ref_id, created_by) \
                 SELECT $1, $2, r, $4 FROM UNNEST($3::BIGINT[]) AS r \
                 ON CONFLICT ON CONSTRAINT uq_func_case_refs DO NOTHING",
            )
            .bind(case_id)
            .bind(ref_type.as_str())
            .bind(ids)
            .bind(user_id)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    pub async fn list_refs(pool: &PgPool, case_id: DbId) -> Result<Vec<CaseRef>, sqlx::Error> {
        let query = format!(
            "SELECT {REF_COLUMNS} FROM func_case_refs WHERE case_id = $1 ORDER BY ref_type, ref_id"
        );
        sqlx::query_as::<_, CaseRef>(&query)
            .bind(case_id)
            .fetch_all(pool)
            .await
    }

    /// Live tasks and cases associated with a case.
    pub async fn ref_targets(
        pool: &PgPool,
        case_id: DbId,
    ) -> Result<(Vec<RefItem>, Vec<RefItem>), sqlx::Error> {
        let refs = Self::list_refs(pool, case_id).await?;
        let ids_of = |ref_type: CaseRefType| -> Vec<DbId> {
            refs.iter()
                .filter(|r| r.ref_type == ref_type.as_str())
                .map(|r| r.ref_id)
                .collect()
        };
        let tasks = crate::repositories::TaskRepo::ref_items(pool, &ids_of(CaseRefType::Task)).await?;
        let cases = Self::ref_items(pool, &ids_of(CaseRefType::Case)).await?;
        Ok((tasks, cases))
    }
}
