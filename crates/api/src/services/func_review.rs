//! Case reviews of a functional plan.

use angus_core::activity::{ActivityType, TargetType};
use angus_core::biz;
use angus_core::context::RequestContext;
use angus_core::error::CoreError;
use angus_core::func::{
    check_case_review, next_review_status, ReviewAction, ReviewStatus,
};
use angus_core::search::SearchRequest;
use angus_core::types::DbId;
use angus_db::models::activity::NewActivity;
use angus_db::models::func_review::{CreateReview, FuncReview, FuncReviewCase, ReviewCaseInput};
use angus_db::models::Paged;
use angus_db::repositories::func_review_repo::NewReview;
use angus_db::repositories::{ActivityRepo, FuncCaseRepo, FuncReviewRepo};
use angus_db::search::REVIEW_SEARCH;
use sqlx::PgPool;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::{access, func_baseline, func_case, func_plan, search};

pub async fn create(
    pool: &PgPool,
    ctx: &RequestContext,
    input: CreateReview,
) -> AppResult<FuncReview> {
    let input = &input;
    biz::run(
        async {
            input.validate().map_err(CoreError::from)?;
            let plan = func_plan::load(pool, ctx, input.plan_id).await?;
            if !plan.review_flag {
                return Err(AppError::Core(CoreError::Business(format!(
                    "Plan {} does not require case review",
                    plan.id
                ))));
            }
            let name = access::required_name(&input.name)?;
            if let (Some(start), Some(deadline)) = (input.start_date, input.deadline_date) {
                if start > deadline {
                    return Err(AppError::Core(CoreError::Validation(
                        "Review start date must not be after its deadline".to_string(),
                    )));
                }
            }
            let cases = func_baseline::plan_cases(pool, ctx, plan.id, &input.case_ids).await?;
            Ok::<_, AppError>((plan, name, cases))
        },
        |(plan, name, cases)| async move {
            let mut tx = pool.begin().await?;
            let review = FuncReviewRepo::insert(
                &mut tx,
                ctx,
                &NewReview {
                    project_id: plan.project_id,
                    plan_id: plan.id,
                    name: &name,
                    owner_id: input.owner_id.unwrap_or(ctx.user_id),
                    participant_ids: &input.participant_ids,
                    start_date: input.start_date,
                    deadline_date: input.deadline_date,
                    description: input.description.as_deref(),
                },
            )
            .await?;
            let added = FuncReviewRepo::add_cases(&mut tx, review.id, &cases).await?;
            ActivityRepo::insert(&mut tx, &activity(ctx, &review, ActivityType::Created)).await?;
            tx.commit().await?;

            tracing::info!(
                tenant_id = ctx.tenant_id,
                plan_id = plan.id,
                review_id = review.id,
                cases = added,
                "Review created"
            );
            Ok(review)
        },
    )
    .await
}

/// Start or end a review.
pub async fn change_status(
    pool: &PgPool,
    ctx: &RequestContext,
    id: DbId,
    action: ReviewAction,
) -> AppResult<FuncReview> {
    biz::run(
        async {
            let review = load(pool, ctx, id).await?;
            let from = ReviewStatus::from_str_value(&review.status)?;
            let to = next_review_status(from, action)?;
            Ok::<_, AppError>((from, to))
        },
        |(from, to)| async move {
            let mut tx = pool.begin().await?;
            let review = FuncReviewRepo::set_status(&mut tx, ctx, id, from, to)
                .await?
                .ok_or_else(|| {
                    AppError::Core(CoreError::Conflict(format!(
                        "Review {id} changed status concurrently"
                    )))
                })?;
            ActivityRepo::insert(
                &mut tx,
                &activity(ctx, &review, ActivityType::StatusUpdated),
            )
            .await?;
            tx.commit().await?;

            tracing::info!(review_id = id, from = %from, to = %to, "Review status changed");
            Ok(review)
        },
    )
    .await
}

/// Record a PASSED/FAILED outcome for one case of a running review.
///
/// The outcome is written both to the review row and to the case itself.
pub async fn review_case(
    pool: &PgPool,
    ctx: &RequestContext,
    id: DbId,
    case_id: DbId,
    input: ReviewCaseInput,
) -> AppResult<FuncReviewCase> {
    let input = &input;
    biz::run(
        async {
            input.validate().map_err(CoreError::from)?;
            let review = load(pool, ctx, id).await?;
            check_case_review(ReviewStatus::from_str_value(&review.status)?, input.review_status)?;
            let case = func_case::load(pool, ctx, case_id).await?;
            Ok::<_, AppError>(case)
        },
        |case| async move {
            let mut tx = pool.begin().await?;
            let row = FuncReviewRepo::review_case(
                &mut tx,
                id,
                case_id,
                input.review_status,
                input.review_remark.as_deref(),
                ctx.user_id,
            )
            .await?
            .ok_or(AppError::not_found("FuncReviewCase", case_id))?;
            FuncCaseRepo::set_review(&mut tx, ctx, case_id, input.review_status).await?;
            ActivityRepo::insert(
                &mut tx,
                &NewActivity::new(
                    ctx,
                    Some(case.project_id),
                    TargetType::FuncCase,
                    case.id,
                    &case.name,
                    ActivityType::Reviewed,
                ),
            )
            .await?;
            tx.commit().await?;

            tracing::info!(
                review_id = id,
                case_id,
                outcome = %input.review_status,
                "Case reviewed"
            );
            Ok(row)
        },
    )
    .await
}

pub async fn delete(pool: &PgPool, ctx: &RequestContext, id: DbId) -> AppResult<()> {
    biz::run(load(pool, ctx, id), |review| async move {
        let mut tx = pool.begin().await?;
        if !FuncReviewRepo::delete(&mut tx, ctx.tenant_id, id).await? {
            return Err(AppError::not_found("FuncReview", id));
        }
        ActivityRepo::insert(&mut tx, &activity(ctx, &review, ActivityType::Deleted)).await?;
        tx.commit().await?;

        tracing::info!(tenant_id = ctx.tenant_id, review_id = id, "Review deleted");
        Ok(())
    })
    .await
}

pub async fn get(pool: &PgPool, ctx: &RequestContext, id: DbId) -> AppResult<FuncReview> {
    load(pool, ctx, id).await
}

pub async fn cases(
    pool: &PgPool,
    ctx: &RequestContext,
    id: DbId,
) -> AppResult<Vec<FuncReviewCase>> {
    load(pool, ctx, id).await?;
    Ok(FuncReviewRepo::list_cases(pool, id).await?)
}

pub async fn search(
    pool: &PgPool,
    ctx: &RequestContext,
    req: &SearchRequest,
    project_id: Option<DbId>,
) -> AppResult<Paged<FuncReview>> {
    search::scoped_search(pool, ctx, &REVIEW_SEARCH, req, project_id).await
}

async fn load(pool: &PgPool, ctx: &RequestContext, id: DbId) -> AppResult<FuncReview> {
    let review = FuncReviewRepo::find_by_id(pool, ctx.tenant_id, id)
        .await?
        .ok_or(AppError::not_found("FuncReview", id))?;
    access::require_member(pool, ctx, review.project_id).await?;
    Ok(review)
}

fn activity(ctx: &RequestContext, review: &FuncReview, kind: ActivityType) -> NewActivity {
    NewActivity::new(
        ctx,
        Some(review.project_id),
        TargetType::FuncReview,
        review.id,
        &review.name,
        kind,
    )
}
