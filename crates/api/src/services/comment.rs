//! Comments on tasks and cases.

use angus_core::biz;
use angus_core::context::RequestContext;
use angus_core::error::CoreError;
use angus_core::types::DbId;
use angus_db::models::comment::{Comment, CommentTarget, CommentView, CreateComment};
use angus_db::repositories::CommentRepo;
use sqlx::PgPool;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::access;

pub async fn add(pool: &PgPool, ctx: &RequestContext, input: CreateComment) -> AppResult<Comment> {
    let input = &input;
    biz::run(
        async {
            input.validate().map_err(CoreError::from)?;
            let content = input.content.trim();
            if content.is_empty() {
                return Err(AppError::Core(CoreError::Validation(
                    "Comment must not be blank".to_string(),
                )));
            }
            let target =
                access::require_taggable(pool, ctx, input.target_type, input.target_id).await?;
            Ok::<_, AppError>((target, content.to_string()))
        },
        |(target, content)| async move {
            let mut tx = pool.begin().await?;
            let comment = CommentRepo::insert(
                &mut tx,
                ctx.tenant_id,
                target.project_id,
                target.target_type,
                target.id,
                &content,
                ctx.user_id,
            )
            .await?;
            tx.commit().await?;

            tracing::info!(
                tenant_id = ctx.tenant_id,
                comment_id = comment.id,
                target_type = %target.target_type,
                target_id = target.id,
                "Comment added"
            );
            Ok(comment)
        },
    )
    .await
}

pub async fn list(
    pool: &PgPool,
    ctx: &RequestContext,
    target: CommentTarget,
) -> AppResult<Vec<CommentView>> {
    access::require_taggable(pool, ctx, target.target_type, target.target_id).await?;
    Ok(CommentRepo::list_for(pool, ctx.tenant_id, target.target_type, target.target_id).await?)
}

/// Authors delete their own comments; tenant admins delete any.
pub async fn delete(pool: &PgPool, ctx: &RequestContext, id: DbId) -> AppResult<()> {
    biz::run(
        async {
            let comment = CommentRepo::find_by_id(pool, ctx.tenant_id, id)
                .await?
                .ok_or(AppError::not_found("Comment", id))?;
            if comment.created_by != ctx.user_id && !ctx.is_admin {
                return Err(AppError::Core(CoreError::Forbidden(
                    "Only the author may delete this comment".to_string(),
                )));
            }
            Ok::<_, AppError>(())
        },
        |()| async move {
            let mut tx = pool.begin().await?;
            if !CommentRepo::delete(&mut tx, ctx.tenant_id, id).await? {
                return Err(AppError::not_found("Comment", id));
            }
            tx.commit().await?;

            tracing::info!(tenant_id = ctx.tenant_id, comment_id = id, "Comment deleted");
            Ok(())
        },
    )
    .await
}
