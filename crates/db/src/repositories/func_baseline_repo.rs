//! Repository for the `func_baselines` and `func_baseline_cases` tables.

use sqlx::PgPool;

use angus_core::activity::TargetType;
use angus_core::context::RequestContext;
use angus_core::types::DbId;

use crate::models::func_baseline::{
    BaselineCaseDetail, FuncBaseline, FuncBaselineCase, UpdateBaseline,
};
use crate::models::func_case::FuncCase;
use crate::repositories::{CommentRepo, FuncCaseRepo, TagRepo, UserRepo};
use crate::PgTx;

pub(crate) const COLUMNS: &str = "\
    t.id, t.tenant_id, t.project_id, t.plan_id, t.name, t.description, \
    t.established, t.created_by, t.created_at, t.last_modified_by, t.updated_at";

const CASE_COLUMNS: &str = "id, baseline_id, case_id, case_snapshot, created_by, created_at";

pub struct FuncBaselineRepo;

impl FuncBaselineRepo {
    // -----------------------------------------------------------------------
    // Baselines
    // -----------------------------------------------------------------------

    pub async fn insert(
        tx: &mut PgTx<'_>,
        ctx: &RequestContext,
        project_id: DbId,
        plan_id: DbId,
        name: &str,
        description: Option<&str>,
    ) -> Result<FuncBaseline, sqlx::Error> {
        let query = format!(
            "INSERT INTO func_baselines AS t \
                 (tenant_id, project_id, plan_id, name, description, created_by, last_modified_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FuncBaseline>(&query)
            .bind(ctx.tenant_id)
            .bind(project_id)
            .bind(plan_id)
            .bind(name)
            .bind(description)
            .bind(ctx.user_id)
            .fetch_one(&mut **tx)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        tenant_id: DbId,
        id: DbId,
    ) -> Result<Option<FuncBaseline>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM func_baselines t WHERE t.tenant_id = $1 AND t.id = $2");
        sqlx::query_as::<_, FuncBaseline>(&query)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn update(
        tx: &mut PgTx<'_>,
        ctx: &RequestContext,
        id: DbId,
        name: Option<&str>,
        input: &UpdateBaseline,
    ) -> Result<Option<FuncBaseline>, sqlx::Error> {
        let query = format!(
            "UPDATE func_baselines t SET \
                 name = COALESCE($3, t.name), \
                 description = COALESCE($4, t.description), \
                 last_modified_by = $5, \
                 updated_at = NOW() \
             WHERE t.tenant_id = $1 AND t.id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FuncBaseline>(&query)
            .bind(ctx.tenant_id)
            .bind(id)
            .bind(name)
            .bind(&input.description)
            .bind(ctx.user_id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Freeze a baseline. Returns `None` when it was already established.
    pub async fn establish(
        tx: &mut PgTx<'_>,
        ctx: &RequestContext,
        id: DbId,
    ) -> Result<Option<FuncBaseline>, sqlx::Error> {
        let query = format!(
            "UPDATE func_baselines t SET established = TRUE, last_modified_by = $3, updated_at = NOW() \
             WHERE t.tenant_id = $1 AND t.id = $2 AND NOT t.established \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FuncBaseline>(&query)
            .bind(ctx.tenant_id)
            .bind(id)
            .bind(ctx.user_id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Hard delete; baselines are not trashable.
    pub async fn count_in_project(pool: &PgPool, project_id: DbId) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM func_baselines WHERE project_id = $1")
            .bind(project_id)
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    pub async fn delete(tx: &mut PgTx<'_>, tenant_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM func_baselines WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Baseline cases
    // -----------------------------------------------------------------------

    /// Snapshot `cases` into the baseline; cases already present are kept
    /// as they were. Returns the number added.
    pub async fn add_cases(
        tx: &mut PgTx<'_>,
        baseline_id: DbId,
        cases: &[FuncCase],
        user_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let mut added = 0;
        for case in cases {
            let result = sqlx::query(
                "INSERT INTO func_baseline_cases (baseline_id, case_id, case_snapshot, created_by) \
                 VALUES ($1, $2, $3, $4) \
                 ON CONFLICT ON CONSTRAINT uq_func_baseline_cases DO NOTHING",
            )
            .bind(baseline_id)
            .bind(case.id)
            .bind(case.snapshot())
            .bind(user_id)
            .execute(&mut **tx)
            .await?;
            added += result.rows_affected();
        }
        Ok(added)
    }

    pub async fn remove_cases(
        tx: &mut PgTx<'_>,
        baseline_id: DbId,
        case_ids: &[DbId],
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM func_baseline_cases WHERE baseline_id = $1 AND case_id = ANY($2)",
        )
        .bind(baseline_id)
        .bind(case_ids)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn list_cases(
        pool: &PgPool,
        baseline_id: DbId,
    ) -> Result<Vec<FuncBaselineCase>, sqlx::Error> {
        let query = format!(
            "SELECT {CASE_COLUMNS} FROM func_baseline_cases WHERE baseline_id = $1 ORDER BY case_id"
        );
        sqlx::query_as::<_, FuncBaselineCase>(&query)
            .bind(baseline_id)
            .fetch_all(pool)
            .await
    }

    pub async fn find_case(
        pool: &PgPool,
        baseline_id: DbId,
        case_id: DbId,
    ) -> Result<Option<FuncBaselineCase>, sqlx::Error> {
        let query = format!(
            "SELECT {CASE_COLUMNS} FROM func_baseline_cases WHERE baseline_id = $1 AND case_id = $2"
        );
        sqlx::query_as::<_, FuncBaselineCase>(&query)
            .bind(baseline_id)
            .bind(case_id)
            .fetch_optional(pool)
            .await
    }

    /// Snapshot of one baseline case plus the live state around it: tags,
    /// associated tasks and cases, case creator and tester, comment count.
    ///
    /// When the underlying case has since been trashed the enrichment is
    /// empty but the snapshot is still returned.
    pub async fn case_detail(
        pool: &PgPool,
        tenant_id: DbId,
        baseline_id: DbId,
        case_id: DbId,
    ) -> Result<Option<BaselineCaseDetail>, sqlx::Error> {
        let Some(row) = Self::find_case(pool, baseline_id, case_id).await? else {
            return Ok(None);
        };

        let tags = TagRepo::tags_of(pool, TargetType::FuncCase, case_id).await?;
        let (ref_tasks, ref_cases) = FuncCaseRepo::ref_targets(pool, case_id).await?;
        let comment_count = CommentRepo::count_for(pool, TargetType::FuncCase, case_id).await?;
        let live = FuncCaseRepo::find_by_id(pool, tenant_id, case_id).await?;
        let tester_id = live.as_ref().map(|c| c.tester_id);
        let created_by = live.as_ref().map_or(row.created_by, |c| c.created_by);

        let creator = UserRepo::name_of(pool, tenant_id, created_by).await?;
        let tester = match tester_id {
            Some(id) => UserRepo::name_of(pool, tenant_id, id).await?,
            None => None,
        };

        Ok(Some(BaselineCaseDetail {
            baseline_id: row.baseline_id,
            case_id: row.case_id,
            snapshot: row.case_snapshot,
            tags,
            ref_tasks,
            ref_cases,
            created_by,
            creator_name: creator.as_ref().map(|u| u.full_name.clone()),
            creator_avatar: creator.and_then(|u| u.avatar),
            tester_id,
            tester_name: tester.map(|u| u.full_name),
            comment_count,
        }))
    }
}
