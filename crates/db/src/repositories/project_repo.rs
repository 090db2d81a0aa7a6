//! Repository for the `projects` and `project_members` tables.

use sqlx::PgPool;

use angus_core::project::MemberType;
use angus_core::types::DbId;

use crate::models::project::{MemberView, NewProject, Project, ProjectMember, UpdateProject};
use crate::PgTx;

pub(crate) const COLUMNS: &str = "\
    t.id, t.tenant_id, t.name, t.description, t.owner_id, t.start_date, \
    t.deadline_date, t.deleted_at, t.created_by, t.created_at, \
    t.last_modified_by, t.updated_at";

const MEMBER_COLUMNS: &str = "id, project_id, member_type, member_id, created_by, created_at";

pub struct ProjectRepo;

impl ProjectRepo {
    // -----------------------------------------------------------------------
    // Projects
    // -----------------------------------------------------------------------

    /// Insert a project and its initial USER members.
    pub async fn insert(tx: &mut PgTx<'_>, new: &NewProject) -> Result<Project, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects AS t \
                 (tenant_id, name, description, owner_id, start_date, deadline_date, \
                  created_by, last_modified_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $7) \
             RETURNING {COLUMNS}"
        );
        let project = sqlx::query_as::<_, Project>(&query)
            .bind(new.tenant_id)
            .bind(&new.name)
            .bind(&new.description)
            .bind(new.owner_id)
            .bind(new.start_date)
            .bind(new.deadline_date)
            .bind(new.created_by)
            .fetch_one(&mut **tx)
            .await?;

        Self::add_members(tx, project.id, MemberType::User, &new.member_user_ids, new.created_by)
            .await?;
        Ok(project)
    }

    /// Find a live project.
    pub async fn find_by_id(
        pool: &PgPool,
        tenant_id: DbId,
        id: DbId,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM projects t \
             WHERE t.tenant_id = $1 AND t.id = $2 AND t.deleted_at IS NULL"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn update(
        tx: &mut PgTx<'_>,
        tenant_id: DbId,
        id: DbId,
        input: &UpdateProject,
        name: Option<&str>,
        user_id: DbId,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "UPDATE projects t SET \
                 name = COALESCE($3, t.name), \
                 description = COALESCE($4, t.description), \
                 owner_id = COALESCE($5, t.owner_id), \
                 start_date = COALESCE($6, t.start_date), \
                 deadline_date = COALESCE($7, t.deadline_date), \
                 last_modified_by = $8, \
                 updated_at = NOW() \
             WHERE t.tenant_id = $1 AND t.id = $2 AND t.deleted_at IS NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(tenant_id)
            .bind(id)
            .bind(name)
            .bind(&input.description)
            .bind(input.owner_id)
            .bind(input.start_date)
            .bind(input.deadline_date)
            .bind(user_id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Move a project to the trash.
    pub async fn soft_delete(
        tx: &mut PgTx<'_>,
        tenant_id: DbId,
        id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE projects SET deleted_at = NOW(), last_modified_by = $3, updated_at = NOW() \
             WHERE tenant_id = $1 AND id = $2 AND deleted_at IS NULL",
        )
        .bind(tenant_id)
        .bind(id)
        .bind(user_id)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Live projects of a tenant.
    pub async fn count(pool: &PgPool, tenant_id: DbId) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM projects WHERE tenant_id = $1 AND deleted_at IS NULL",
        )
        .bind(tenant_id)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    /// Owners and USER members may act on a project.
    pub async fn is_member(
        pool: &PgPool,
        project_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let (member,): (bool,) = sqlx::query_as(
            "SELECT EXISTS ( \
                 SELECT 1 FROM projects p WHERE p.id = $1 AND p.owner_id = $2 \
                 UNION ALL \
                 SELECT 1 FROM project_members m \
                 WHERE m.project_id = $1 AND m.member_type = $3 AND m.member_id = $2 \
             )",
        )
        .bind(project_id)
        .bind(user_id)
        .bind(MemberType::User.as_str())
        .fetch_one(pool)
        .await?;
        Ok(member)
    }

    // -----------------------------------------------------------------------
    // Members
    // -----------------------------------------------------------------------

    /// Add members, ignoring ones already present. Returns the number added.
    pub async fn add_members(
        tx: &mut PgTx<'_>,
        project_id: DbId,
        member_type: MemberType,
        member_ids: &[DbId],
        created_by: DbId,
    ) -> Result<u64, sqlx::Error> {
        if member_ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query(
            "INSERT INTO project_members (project_id, member_type, member_id, created_by) \
             SELECT $1, $2, m, $4 FROM UNNEST($3::BIGINT[]) AS m \
             ON CONFLICT ON CONSTRAINT uq_project_members DO NOTHING",
        )
        .bind(project_id)
        .bind(member_type.as_str())
        .bind(member_ids)
        .bind(created_by)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn remove_member(
        tx: &mut PgTx<'_>,
        project_id: DbId,
        member_type: MemberType,
        member_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM project_members \
             WHERE project_id = $1 AND member_type = $2 AND member_id = $3",
        )
        .bind(project_id)
        .bind(member_type.as_str())
        .bind(member_id)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_members(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<ProjectMember>, sqlx::Error> {
        let query = format!(
            "SELECT {MEMBER_COLUMNS} FROM project_members \
             WHERE project_id = $1 ORDER BY member_type, id"
        );
        sqlx::query_as::<_, ProjectMember>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Members with USER names resolved from the directory mirror.
    pub async fn member_views(
        pool: &PgPool,
        tenant_id: DbId,
        project_id: DbId,
    ) -> Result<Vec<MemberView>, sqlx::Error> {
        let rows: Vec<(String, DbId, Option<String>, Option<String>)> = sqlx::query_as(
            "SELECT m.member_type, m.member_id, u.full_name, u.avatar \
             FROM project_members m \
             LEFT JOIN users u \
                 ON m.member_type = 'USER' AND u.id = m.member_id AND u.tenant_id = $2 \
             WHERE m.project_id = $1 \
             ORDER BY m.member_type, m.id",
        )
        .bind(project_id)
        .bind(tenant_id)
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(member_type, member_id, name, avatar)| MemberView {
                member_type,
                member_id,
                name,
                avatar,
            })
            .collect())
    }
}
