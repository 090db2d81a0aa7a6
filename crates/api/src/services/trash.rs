//! Trash: listing, restoring and purging soft-deleted items.

use angus_core::activity::{ActivityType, TargetType};
use angus_core::biz;
use angus_core::context::RequestContext;
use angus_core::error::CoreError;
use angus_core::types::DbId;
use angus_db::models::activity::NewActivity;
use angus_db::models::trash::{TrashListParams, TrashedItem};
use angus_db::repositories::{ActivityRepo, TrashRepo};
use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use crate::services::access;

/// Trashed items, newest first. Non-admins must narrow to a project.
pub async fn list(
    pool: &PgPool,
    ctx: &RequestContext,
    params: &TrashListParams,
) -> AppResult<Vec<TrashedItem>> {
    match params.project_id {
        Some(project_id) => access::require_member(pool, ctx, project_id).await?,
        None if ctx.is_admin => {}
        None => {
            return Err(AppError::BadRequest(
                "project_id is required to list the trash".to_string(),
            ))
        }
    }
    if let Some(target_type) = params.target_type {
        trashable(target_type)?;
    }
    Ok(TrashRepo::list(pool, ctx.tenant_id, params.target_type, params.project_id).await?)
}

/// Bring an item back. Fails with 409 while its parent is still trashed.
pub async fn restore(
    pool: &PgPool,
    ctx: &RequestContext,
    target_type: TargetType,
    id: DbId,
) -> AppResult<()> {
    biz::run(
        async {
            let item = load(pool, ctx, target_type, id).await?;
            if let Some(parent) = TrashRepo::trashed_parent(pool, target_type, id).await? {
                return Err(AppError::Core(CoreError::Conflict(format!(
                    "Restore the trashed {parent} of {target_type} {id} first"
                ))));
            }
            Ok::<_, AppError>(item)
        },
        |item| async move {
            let mut tx = pool.begin().await?;
            if !TrashRepo::restore(&mut tx, ctx.tenant_id, target_type, id, ctx.user_id).await? {
                return Err(AppError::not_found("TrashedItem", id));
            }
            ActivityRepo::insert(&mut tx, &activity(ctx, &item, target_type, ActivityType::Restored))
                .await?;
            tx.commit().await?;

            tracing::info!(
                tenant_id = ctx.tenant_id,
                target_type = %target_type,
                target_id = id,
                "Item restored from trash"
            );
            Ok(())
        },
    )
    .await
}

pub async fn purge_one(
    pool: &PgPool,
    ctx: &RequestContext,
    target_type: TargetType,
    id: DbId,
) -> AppResult<()> {
    biz::run(load(pool, ctx, target_type, id), |item| async move {
        let mut tx = pool.begin().await?;
        if !TrashRepo::purge_one(&mut tx, ctx.tenant_id, target_type, id).await? {
            return Err(AppError::not_found("TrashedItem", id));
        }
        ActivityRepo::insert(&mut tx, &activity(ctx, &item, target_type, ActivityType::Deleted))
            .await?;
        tx.commit().await?;

        tracing::info!(
            tenant_id = ctx.tenant_id,
            target_type = %target_type,
            target_id = id,
            "Trashed item purged"
        );
        Ok(())
    })
    .await
}

/// Empty the tenant's trash. Returns the number of trashed rows removed.
pub async fn purge_all(pool: &PgPool, ctx: &RequestContext) -> AppResult<u64> {
    ctx.require_admin()?;
    let mut tx = pool.begin().await?;
    let purged = TrashRepo::purge_all(&mut tx, ctx.tenant_id).await?;
    tx.commit().await?;

    tracing::info!(tenant_id = ctx.tenant_id, user_id = ctx.user_id, purged, "Trash emptied");
    Ok(purged)
}

async fn load(
    pool: &PgPool,
    ctx: &RequestContext,
    target_type: TargetType,
    id: DbId,
) -> AppResult<TrashedItem> {
    trashable(target_type)?;
    let item = TrashRepo::find(pool, ctx.tenant_id, target_type, id)
        .await?
        .ok_or(AppError::not_found("TrashedItem", id))?;
    access::require_member(pool, ctx, item.project_id).await?;
    Ok(item)
}

fn trashable(target_type: TargetType) -> Result<(), CoreError> {
    if target_type.is_trashable() {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "{target_type} items are never trashed"
        )))
    }
}

fn activity(
    ctx: &RequestContext,
    item: &TrashedItem,
    target_type: TargetType,
    kind: ActivityType,
) -> NewActivity {
    NewActivity::new(ctx, Some(item.project_id), target_type, item.id, &item.name, kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_trashable_types_accepted() {
        assert!(trashable(TargetType::Task).is_ok());
        assert!(trashable(TargetType::Report).is_ok());
        assert!(trashable(TargetType::Node).is_err());
        assert!(trashable(TargetType::FuncBaseline).is_err());
    }
}
