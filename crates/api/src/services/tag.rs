//! Project tags and the tag sets of tasks and cases.

use angus_core::activity::TargetType;
use angus_core::biz;
use angus_core::context::RequestContext;
use angus_core::error::CoreError;
use angus_core::quota::QuotaKind;
use angus_core::tagging::{normalize_tag_ids, normalize_tag_name};
use angus_core::types::DbId;
use angus_db::models::tag::{CreateTags, Tag, TagInfo, TagUsage, UpdateTag};
use angus_db::repositories::tag_repo::TagTarget;
use angus_db::repositories::TagRepo;
use sqlx::PgPool;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::access;

/// Create tags by name; names already used in the project return the existing tag.
pub async fn create(pool: &PgPool, ctx: &RequestContext, input: CreateTags) -> AppResult<Vec<Tag>> {
    let input = &input;
    biz::run(
        async {
            input.validate().map_err(CoreError::from)?;
            access::require_project(pool, ctx, input.project_id).await?;
            let mut names: Vec<String> = Vec::with_capacity(input.names.len());
            for raw in &input.names {
                let name = normalize_tag_name(raw)?;
                if !names.contains(&name) {
                    names.push(name);
                }
            }
            // Existing names are returned as is and do not count against the quota.
            let existing = TagRepo::count_named(pool, input.project_id, &names).await?;
            let added = names.len() as i64 - existing;
            if added > 0 {
                let current = TagRepo::count_in_project(pool, input.project_id).await?;
                access::enforce_quota(pool, ctx, QuotaKind::TagsPerProject, current, added)
                    .await?;
            }
            Ok::<_, AppError>(names)
        },
        |names| async move {
            let mut tx = pool.begin().await?;
            let tags = TagRepo::create_or_get(&mut tx, ctx, input.project_id, &names).await?;
            tx.commit().await?;

            tracing::info!(
                tenant_id = ctx.tenant_id,
                project_id = input.project_id,
                count = tags.len(),
                "Tags created"
            );
            Ok(tags)
        },
    )
    .await
}

pub async fn list(
    pool: &PgPool,
    ctx: &RequestContext,
    project_id: DbId,
    keyword: Option<&str>,
) -> AppResult<Vec<TagUsage>> {
    access::require_member(pool, ctx, project_id).await?;
    Ok(TagRepo::list_by_project(pool, ctx.tenant_id, project_id, keyword).await?)
}

pub async fn rename(pool: &PgPool, ctx: &RequestContext, id: DbId, input: UpdateTag) -> AppResult<Tag> {
    biz::run(
        async {
            input.validate().map_err(CoreError::from)?;
            load(pool, ctx, id).await?;
            Ok::<_, AppError>(normalize_tag_name(&input.name)?)
        },
        |name| async move {
            let mut tx = pool.begin().await?;
            let tag = TagRepo::rename(&mut tx, ctx, id, &name)
                .await?
                .ok_or(AppError::not_found("Tag", id))?;
            tx.commit().await?;
            tracing::info!(tag_id = id, "Tag renamed");
            Ok(tag)
        },
    )
    .await
}

/// Delete a tag and every association to it.
pub async fn delete(pool: &PgPool, ctx: &RequestContext, id: DbId) -> AppResult<()> {
    biz::run(load(pool, ctx, id), |_| async move {
        let mut tx = pool.begin().await?;
        if !TagRepo::delete(&mut tx, ctx.tenant_id, id).await? {
            return Err(AppError::not_found("Tag", id));
        }
        tx.commit().await?;
        tracing::info!(tenant_id = ctx.tenant_id, tag_id = id, "Tag deleted");
        Ok(())
    })
    .await
}

/// Replace the full tag set of a task or case and return the new set.
///
/// Repeating a call with the same ids changes nothing and logs no activity.
pub async fn replace(
    pool: &PgPool,
    ctx: &RequestContext,
    target_type: TargetType,
    target_id: DbId,
    tag_ids: &[DbId],
) -> AppResult<Vec<TagInfo>> {
    biz::run(
        async {
            let target = access::require_taggable(pool, ctx, target_type, target_id).await?;
            let ids = check_tags(pool, ctx, target.project_id, tag_ids).await?;
            Ok::<_, AppError>((target, ids))
        },
        |(target, ids)| async move {
            TagRepo::replace_targets(
                pool,
                ctx,
                TagTarget {
                    project_id: target.project_id,
                    target_type,
                    target_id,
                    name: &target.name,
                },
                &ids,
            )
            .await?;
            Ok(TagRepo::tags_of(pool, target_type, target_id).await?)
        },
    )
    .await
}

pub async fn tags_of(
    pool: &PgPool,
    ctx: &RequestContext,
    target_type: TargetType,
    target_id: DbId,
) -> AppResult<Vec<TagInfo>> {
    access::require_taggable(pool, ctx, target_type, target_id).await?;
    Ok(TagRepo::tags_of(pool, target_type, target_id).await?)
}

/// Deduplicate `tag_ids` and require each to be a tag of `project_id`.
pub(crate) async fn check_tags(
    pool: &PgPool,
    ctx: &RequestContext,
    project_id: DbId,
    tag_ids: &[DbId],
) -> AppResult<Vec<DbId>> {
    let ids = normalize_tag_ids(tag_ids)?;
    if ids.is_empty() {
        return Ok(ids);
    }
    let found = TagRepo::find_in_project(pool, ctx.tenant_id, project_id, &ids).await?;
    if found.len() != ids.len() {
        let missing: Vec<String> = ids
            .iter()
            .filter(|id| !found.iter().any(|t| t.id == **id))
            .map(|id| id.to_string())
            .collect();
        return Err(AppError::Core(CoreError::Validation(format!(
            "Tags not found in project {project_id}: {}",
            missing.join(", ")
        ))));
    }
    Ok(ids)
}

async fn load(pool: &PgPool, ctx: &RequestContext, id: DbId) -> AppResult<Tag> {
    let tag = TagRepo::find_by_id(pool, ctx.tenant_id, id)
        .await?
        .ok_or(AppError::not_found("Tag", id))?;
    access::require_member(pool, ctx, tag.project_id).await?;
    Ok(tag)
}
