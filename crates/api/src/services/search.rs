//! Criteria search shared by every listing endpoint.

use angus_core::context::RequestContext;
use angus_core::search::SearchRequest;
use angus_core::types::DbId;
use angus_db::models::Paged;
use angus_db::search::{search, SearchScope, SearchSpec};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool};

use crate::error::AppResult;
use crate::services::access;

/// Compile `req` against `spec` and run it inside the caller's tenant.
///
/// A `project_id` narrows project-scoped specs and requires membership.
/// Without one, non-admins only see rows of live projects they belong to.
pub async fn scoped_search<T>(
    pool: &PgPool,
    ctx: &RequestContext,
    spec: &SearchSpec,
    req: &SearchRequest,
    project_id: Option<DbId>,
) -> AppResult<Paged<T>>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let compiled = spec.compile(req)?;
    if let Some(project_id) = project_id {
        access::require_member(pool, ctx, project_id).await?;
    }
    let page = search::<T>(
        pool,
        spec,
        &compiled,
        SearchScope {
            tenant_id: ctx.tenant_id,
            project_id,
            member_id: (!ctx.is_admin).then_some(ctx.user_id),
        },
    )
    .await?;
    Ok(page)
}
