//! Project entity model, DTOs and the create/detail assemblers.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use angus_core::context::RequestContext;
use angus_core::error::CoreError;
use angus_core::project::{check_project_dates, normalize_project_name};
use angus_core::types::{DbId, Timestamp};

/// A row from the `projects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: DbId,
    pub tenant_id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: DbId,
    pub start_date: Option<Timestamp>,
    pub deadline_date: Option<Timestamp>,
    pub deleted_at: Option<Timestamp>,
    pub created_by: DbId,
    pub created_at: Timestamp,
    pub last_modified_by: DbId,
    pub updated_at: Timestamp,
}

/// A row from the `project_members` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProjectMember {
    pub id: DbId,
    pub project_id: DbId,
    pub member_type: String,
    pub member_id: DbId,
    pub created_by: DbId,
    pub created_at: Timestamp,
}

/// Request body for creating a project.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProject {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 20000))]
    pub description: Option<String>,
    /// Defaults to the caller.
    pub owner_id: Option<DbId>,
    pub start_date: Option<Timestamp>,
    pub deadline_date: Option<Timestamp>,
    /// Users added as members besides the owner.
    #[serde(default)]
    pub member_ids: Vec<DbId>,
}

/// DTO for updating an existing project. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProject {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 20000))]
    pub description: Option<String>,
    pub owner_id: Option<DbId>,
    pub start_date: Option<Timestamp>,
    pub deadline_date: Option<Timestamp>,
}

/// Request body for adding members.
#[derive(Debug, Clone, Deserialize)]
pub struct AddMembers {
    pub member_type: angus_core::project::MemberType,
    pub member_ids: Vec<DbId>,
}

/// A normalized project ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProject {
    pub tenant_id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: DbId,
    pub start_date: Option<Timestamp>,
    pub deadline_date: Option<Timestamp>,
    pub created_by: DbId,
    /// Owner first, then the requested members, without duplicates.
    pub member_user_ids: Vec<DbId>,
}

impl NewProject {
    pub fn assemble(ctx: &RequestContext, input: CreateProject) -> Result<Self, CoreError> {
        input.validate()?;
        let name = normalize_project_name(&input.name)?;
        check_project_dates(input.start_date, input.deadline_date)?;

        let owner_id = input.owner_id.unwrap_or(ctx.user_id);
        let mut member_user_ids = vec![owner_id];
        for id in input.member_ids {
            if !member_user_ids.contains(&id) {
                member_user_ids.push(id);
            }
        }

        Ok(NewProject {
            tenant_id: ctx.tenant_id,
            name,
            description: input.description.filter(|d| !d.trim().is_empty()),
            owner_id,
            start_date: input.start_date,
            deadline_date: input.deadline_date,
            created_by: ctx.user_id,
            member_user_ids,
        })
    }
}

/// A member with its resolved display name.
#[derive(Debug, Clone, Serialize)]
pub struct MemberView {
    pub member_type: String,
    pub member_id: DbId,
    pub name: Option<String>,
    pub avatar: Option<String>,
}

/// Project as returned by the detail endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectDetail {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: DbId,
    pub owner_name: Option<String>,
    pub start_date: Option<Timestamp>,
    pub deadline_date: Option<Timestamp>,
    pub members: Vec<MemberView>,
    pub created_by: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ProjectDetail {
    pub fn assemble(project: Project, members: Vec<MemberView>, owner_name: Option<String>) -> Self {
        ProjectDetail {
            id: project.id,
            name: project.name,
            description: project.description,
            owner_id: project.owner_id,
            owner_name,
            start_date: project.start_date,
            deadline_date: project.deadline_date,
            members,
            created_by: project.created_by,
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{Duration, Utc};

    fn ctx() -> RequestContext {
        RequestContext::new(7, 11, false)
    }

    fn create() -> CreateProject {
        let now = Utc::now();
        CreateProject {
            name: "  Payments  ".to_string(),
            description: Some("Checkout flows".to_string()),
            owner_id: Some(12),
            start_date: Some(now),
            deadline_date: Some(now + Duration::days(30)),
            member_ids: vec![12, 13, 13],
        }
    }

    /// Stand-in for the row the insert would return.
    fn persisted(new: &NewProject) -> Project {
        let now = Utc::now();
        Project {
            id: 1,
            tenant_id: new.tenant_id,
            name: new.name.clone(),
            description: new.description.clone(),
            owner_id: new.owner_id,
            start_date: new.start_date,
            deadline_date: new.deadline_date,
            deleted_at: None,
            created_by: new.created_by,
            created_at: now,
            last_modified_by: new.created_by,
            updated_at: now,
        }
    }

    #[test]
    fn round_trip_preserves_fields() {
        let input = create();
        let new = NewProject::assemble(&ctx(), input.clone()).unwrap();
        let detail = ProjectDetail::assemble(persisted(&new), Vec::new(), Some("Owner".into()));

        assert_eq!(detail.name, "Payments");
        assert_eq!(detail.owner_id, 12);
        assert_eq!(detail.start_date, input.start_date);
        assert_eq!(detail.deadline_date, input.deadline_date);
        assert_eq!(detail.description, input.description);
        assert_eq!(detail.owner_name.as_deref(), Some("Owner"));
    }

    #[test]
    fn owner_defaults_to_caller_and_members_dedup() {
        let mut input = create();
        input.owner_id = None;
        input.member_ids = vec![11, 20, 20];
        let new = NewProject::assemble(&ctx(), input).unwrap();
        assert_eq!(new.owner_id, 11);
        assert_eq!(new.member_user_ids, vec![11, 20]);
        assert_eq!(new.tenant_id, 7);
    }

    #[test]
    fn inverted_dates_rejected() {
        let mut input = create();
        input.deadline_date = input.start_date.map(|d| d - Duration::days(1));
        assert_matches!(
            NewProject::assemble(&ctx(), input),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn blank_name_rejected() {
        let mut input = create();
        input.name = "   ".to_string();
        assert!(NewProject::assemble(&ctx(), input).is_err());
    }
}
