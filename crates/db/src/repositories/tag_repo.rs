//! Repository for the `tags` and `tag_targets` tables.
//!
//! Provides per-project tag CRUD and the full-replacement flow that keeps a
//! target's tag set equal to the requested one.

use sqlx::PgPool;

use angus_core::activity::{ActivityType, TargetType};
use angus_core::context::RequestContext;
use angus_core::tagging::{reconcile, TagDiff};
use angus_core::types::DbId;

use crate::models::activity::NewActivity;
use crate::models::tag::{Tag, TagInfo, TagUsage};
use crate::repositories::ActivityRepo;
use crate::PgTx;

const COLUMNS: &str = "\
    t.id, t.tenant_id, t.project_id, t.name, t.created_by, t.created_at, \
    t.last_modified_by, t.updated_at";

/// The tagged object a replacement applies to.
#[derive(Debug, Clone, Copy)]
pub struct TagTarget<'a> {
    pub project_id: DbId,
    pub target_type: TargetType,
    pub target_id: DbId,
    pub name: &'a str,
}

pub struct TagRepo;

impl TagRepo {
    // -----------------------------------------------------------------------
    // Tag CRUD
    // -----------------------------------------------------------------------

    /// Create tags by name, returning existing rows for names already taken.
    pub async fn create_or_get(
        tx: &mut PgTx<'_>,
        ctx: &RequestContext,
        project_id: DbId,
        names: &[String],
    ) -> Result<Vec<Tag>, sqlx::Error> {
        let query = format!(
            "INSERT INTO tags AS t (tenant_id, project_id, name, created_by, last_modified_by) \
             VALUES ($1, $2, $3, $4, $4) \
             ON CONFLICT ON CONSTRAINT uq_tags_project_name DO UPDATE SET name = EXCLUDED.name \
             RETURNING {COLUMNS}"
        );
        let mut tags = Vec::with_capacity(names.len());
        for name in names {
            let tag = sqlx::query_as::<_, Tag>(&query)
                .bind(ctx.tenant_id)
                .bind(project_id)
                .bind(name)
                .bind(ctx.user_id)
                .fetch_one(&mut **tx)
                .await?;
            tags.push(tag);
        }
        Ok(tags)
    }

    pub async fn find_by_id(
        pool: &PgPool,
        tenant_id: DbId,
        id: DbId,
    ) -> Result<Option<Tag>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tags t WHERE t.tenant_id = $1 AND t.id = $2");
        sqlx::query_as::<_, Tag>(&query)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Tags among `ids` that belong to `project_id`.
    pub async fn find_in_project(
        pool: &PgPool,
        tenant_id: DbId,
        project_id: DbId,
        ids: &[DbId],
    ) -> Result<Vec<Tag>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!(
            "SELECT {COLUMNS} FROM tags t \
             WHERE t.tenant_id = $1 AND t.project_id = $2 AND t.id = ANY($3) \
             ORDER BY t.id"
        );
        sqlx::query_as::<_, Tag>(&query)
            .bind(tenant_id)
            .bind(project_id)
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    /// Tags of a project with how many targets carry each.
    pub async fn list_by_project(
        pool: &PgPool,
        tenant_id: DbId,
        project_id: DbId,
        keyword: Option<&str>,
    ) -> Result<Vec<TagUsage>, sqlx::Error> {
        sqlx::query_as::<_, TagUsage>(
            "SELECT t.id, t.name, COUNT(tt.id) AS usage_count \
             FROM tags t \
             LEFT JOIN tag_targets tt ON tt.tag_id = t.id \
             WHERE t.tenant_id = $1 AND t.project_id = $2 \
               AND ($3::TEXT IS NULL OR t.name ILIKE $3) \
             GROUP BY t.id, t.name \
             ORDER BY t.name",
        )
        .bind(tenant_id)
        .bind(project_id)
        .bind(keyword)
        .fetch_all(pool)
        .await
    }

    pub async fn rename(
        tx: &mut PgTx<'_>,
        ctx: &RequestContext,
        id: DbId,
        name: &str,
    ) -> Result<Option<Tag>, sqlx::Error> {
        let query = format!(
            "UPDATE tags t SET name = $3, last_modified_by = $4, updated_at = NOW() \
             WHERE t.tenant_id = $1 AND t.id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Tag>(&query)
            .bind(ctx.tenant_id)
            .bind(id)
            .bind(name)
            .bind(ctx.user_id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Delete a tag; its associations cascade.
    pub async fn delete(tx: &mut PgTx<'_>, tenant_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tags WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count_in_project(pool: &PgPool, project_id: DbId) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tags WHERE project_id = $1")
            .bind(project_id)
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    /// How many of `names` already exist in the project.
    pub async fn count_named(
        pool: &PgPool,
        project_id: DbId,
        names: &[String],
    ) -> Result<i64, sqlx::Error> {
        if names.is_empty() {
            return Ok(0);
        }
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM tags WHERE project_id = $1 AND name = ANY($2)")
                .bind(project_id)
                .bind(names)
                .fetch_one(pool)
                .await?;
        Ok(count)
    }

    // -----------------------------------------------------------------------
    // Target associations
    // -----------------------------------------------------------------------

    /// Tags attached to a target, by name.
    pub async fn tags_of(
        pool: &PgPool,
        target_type: TargetType,
        target_id: DbId,
    ) -> Result<Vec<TagInfo>, sqlx::Error> {
        sqlx::query_as::<_, TagInfo>(
            "SELECT t.id, t.name FROM tag_targets tt \
             JOIN tags t ON t.id = tt.tag_id \
             WHERE tt.target_type = $1 AND tt.target_id = $2 \
             ORDER BY t.name, t.id",
        )
        .bind(target_type.as_str())
        .bind(target_id)
        .fetch_all(pool)
        .await
    }

    /// Make the target's tag set equal to `tag_ids` inside the caller's
    /// transaction. The current rows are locked before diffing.
    pub async fn replace_targets_in(
        tx: &mut PgTx<'_>,
        ctx: &RequestContext,
        target_type: TargetType,
        target_id: DbId,
        tag_ids: &[DbId],
    ) -> Result<TagDiff, sqlx::Error> {
        let existing: Vec<DbId> = sqlx::query_scalar(
            "SELECT tag_id FROM tag_targets \
             WHERE target_type = $1 AND target_id = $2 \
             ORDER BY id FOR UPDATE",
        )
        .bind(target_type.as_str())
        .bind(target_id)
        .fetch_all(&mut **tx)
        .await?;

        let diff = reconcile(&existing, tag_ids);

        if !diff.to_delete.is_empty() {
            sqlx::query(
                "DELETE FROM tag_targets \
                 WHERE target_type = $1 AND target_id = $2 AND tag_id = ANY($3)",
            )
            .bind(target_type.as_str())
            .bind(target_id)
            .bind(&diff.to_delete)
            .execute(&mut **tx)
            .await?;
        }

        if !diff.to_add.is_empty() {
            sqlx::query(
                "INSERT INTO tag_targets (tenant_id, tag_id, target_type, target_id, created_by) \
                 SELECT $1, tag, $2, $3, $4 FROM UNNEST($5::BIGINT[]) AS tag \
                 ON CONFLICT ON CONSTRAINT uq_tag_targets DO NOTHING",
            )
            .bind(ctx.tenant_id)
            .bind(target_type.as_str())
            .bind(target_id)
            .bind(ctx.user_id)
            .bind(&diff.to_add)
            .execute(&mut **tx)
            .await?;
        }

        Ok(diff)
    }

    /// Replace a target's tags in one transaction, logging `TAG_UPDATED`
    /// when the set changed. Repeating the call with the same set is a no-op.
    pub async fn replace_targets(
        pool: &PgPool,
        ctx: &RequestContext,
        target: TagTarget<'_>,
        tag_ids: &[DbId],
    ) -> Result<TagDiff, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let diff =
            Self::replace_targets_in(&mut tx, ctx, target.target_type, target.target_id, tag_ids)
                .await?;

        if !diff.is_empty() {
            let activity = NewActivity::new(
                ctx,
                Some(target.project_id),
                target.target_type,
                target.target_id,
                target.name,
                ActivityType::TagUpdated,
            );
            ActivityRepo::insert(&mut tx, &activity).await?;
        }

        tx.commit().await?;
        tracing::debug!(
            tenant_id = ctx.tenant_id,
            target_type = %target.target_type,
            target_id = target.target_id,
            added = diff.to_add.len(),
            removed = diff.to_delete.len(),
            "Replaced target tags",
        );
        Ok(diff)
    }

    /// Drop every association of a target (purge).
    pub async fn clear_target(
        tx: &mut PgTx<'_>,
        target_type: TargetType,
        target_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM tag_targets WHERE target_type = $1 AND target_id = $2")
                .bind(target_type.as_str())
                .bind(target_id)
                .execute(&mut **tx)
                .await?;
        Ok(result.rows_affected())
    }
}
