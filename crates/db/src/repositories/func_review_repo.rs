//! Repository for the `func_reviews` and `func_review_cases` tables.

use sqlx::PgPool;

use angus_core::context::RequestContext;
use angus_core::func::{CaseReviewStatus, ReviewStatus};
use angus_core::types::{DbId, Timestamp};

use crate::models::func_case::FuncCase;
use crate::models::func_review::{FuncReview, FuncReviewCase};
use crate::PgTx;

pub(crate) const COLUMNS: &str = "\
    t.id, t.tenant_id, t.project_id, t.plan_id, t.name, t.status, t.owner_id, \
    t.participant_ids, t.start_date, t.deadline_date, t.description, \
    t.created_by, t.created_at, t.last_modified_by, t.updated_at";

const CASE_COLUMNS: &str = "\
    id, review_id, case_id, review_status, reviewer_id, review_remark, \
    review_date, case_snapshot, created_at";

#[derive(Debug, Clone)]
pub struct NewReview<'a> {
    pub project_id: DbId,
    pub plan_id: DbId,
    pub name: &'a str,
    pub owner_id: DbId,
    pub participant_ids: &'a [DbId],
    pub start_date: Option<Timestamp>,
    pub deadline_date: Option<Timestamp>,
    pub description: Option<&'a str>,
}

pub struct FuncReviewRepo;

impl FuncReviewRepo {
    pub async fn insert(
        tx: &mut PgTx<'_>,
        ctx: &RequestContext,
        new: &NewReview<'_>,
    ) -> Result<FuncReview, sqlx::Error> {
        let query = format!(
            "INSERT INTO func_reviews AS t \
                 (tenant_id, project_id, plan_id, name, owner_id, participant_ids, \
                  start_date, deadline_date, description, created_by, last_modified_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FuncReview>(&query)
            .bind(ctx.tenant_id)
            .bind(new.project_id)
            .bind(new.plan_id)
            .bind(new.name)
            .bind(new.owner_id)
            .bind(new.participant_ids)
            .bind(new.start_date)
            .bind(new.deadline_date)
            .bind(new.description)
            .bind(ctx.user_id)
            .fetch_one(&mut **tx)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        tenant_id: DbId,
        id: DbId,
    ) -> Result<Option<FuncReview>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM func_reviews t WHERE t.tenant_id = $1 AND t.id = $2");
        sqlx::query_as::<_, FuncReview>(&query)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Move a review from `from` to `to`; `None` when the status changed meanwhile.
    pub async fn set_status(
        tx: &mut PgTx<'_>,
        ctx: &RequestContext,
        id: DbId,
        from: ReviewStatus,
        to: ReviewStatus,
    ) -> Result<Option<FuncReview>, sqlx::Error> {
        let query = format!(
            "UPDATE func_reviews t SET status = $4, last_modified_by = $5, updated_at = NOW() \
             WHERE t.tenant_id = $1 AND t.id = $2 AND t.status = $3 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FuncReview>(&query)
            .bind(ctx.tenant_id)
            .bind(id)
            .bind(from.as_str())
            .bind(to.as_str())
            .bind(ctx.user_id)
            .fetch_optional(&mut **tx)
            .await
    }

    pub async fn count_in_project(pool: &PgPool, project_id: DbId) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM func_reviews WHERE project_id = $1")
            .bind(project_id)
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    pub async fn delete(tx: &mut PgTx<'_>, tenant_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM func_reviews WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Review cases
    // -----------------------------------------------------------------------

    pub async fn add_cases(
        tx: &mut PgTx<'_>,
        review_id: DbId,
        cases: &[FuncCase],
    ) -> Result<u64, sqlx::Error> {
        let mut added = 0;
        for case in cases {
            let result = sqlx::query(
                "INSERT INTO func_review_cases (review_id, case_id, case_snapshot) \
                 VALUES ($1, $2, $3) \
                 ON CONFLICT ON CONSTRAINT uq_func_review_cases DO NOTHING",
            )
            .bind(review_id)
            .bind(case.id)
            .bind(case.snapshot())
            .execute(&mut **tx)
            .await?;
            added += result.rows_affected();
        }
        Ok(added)
    }

    pub async fn list_cases(
        pool: &PgPool,
        review_id: DbId,
    ) -> Result<Vec<FuncReviewCase>, sqlx::Error> {
        let query = format!(
            "SELECT {CASE_COLUMNS} FROM func_review_cases WHERE review_id = $1 ORDER BY case_id"
        );
        sqlx::query_as::<_, FuncReviewCase>(&query)
            .bind(review_id)
            .fetch_all(pool)
            .await
    }

    /// Record the outcome for one case of the review.
    pub async fn review_case(
        tx: &mut PgTx<'_>,
        review_id: DbId,
        case_id: DbId,
        outcome: CaseReviewStatus,
        remark: Option<&str>,
        reviewer_id: DbId,
    ) -> Result<Option<FuncReviewCase>, sqlx::Error> {
        let query = format!(
            "UPDATE func_review_cases SET \
                 review_status = $3, review_remark = $4, reviewer_id = $5, review_date = NOW() \
             WHERE review_id = $1 AND case_id = $2 \
             RETURNING {CASE_COLUMNS}"
        );
        sqlx::query_as::<_, FuncReviewCase>(&query)
            .bind(review_id)
            .bind(case_id)
            .bind(outcome.as_str())
            .bind(remark)
            .bind(reviewer_id)
            .fetch_optional(&mut **tx)
            .await
    }
}
