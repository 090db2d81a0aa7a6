//! Read side of the activity log.

use angus_core::context::RequestContext;
use angus_core::search::SearchRequest;
use angus_core::types::DbId;
use angus_db::models::activity::{Activity, TargetActivityParams};
use angus_db::models::Paged;
use angus_db::repositories::ActivityRepo;
use angus_db::search::ACTIVITY_SEARCH;
use sqlx::PgPool;

use crate::error::AppResult;
use crate::services::search;

/// Newest-first activities of one target.
///
/// Activities outlive their targets, so no target lookup happens here.
pub async fn list_for_target(
    pool: &PgPool,
    ctx: &RequestContext,
    params: &TargetActivityParams,
) -> AppResult<Vec<Activity>> {
    Ok(ActivityRepo::list_for_target(
        pool,
        ctx.tenant_id,
        params.target_type,
        params.target_id,
        params.limit,
        params.offset,
    )
    .await?)
}

pub async fn search(
    pool: &PgPool,
    ctx: &RequestContext,
    req: &SearchRequest,
    project_id: Option<DbId>,
) -> AppResult<Paged<Activity>> {
    search::scoped_search(pool, ctx, &ACTIVITY_SEARCH, req, project_id).await
}
