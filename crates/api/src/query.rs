//! Shared query parameter types for API handlers.

use angus_core::types::DbId;
use serde::Deserialize;

/// `?project_id=` on search and listing endpoints.
#[derive(Debug, Deserialize)]
pub struct ProjectScope {
    pub project_id: Option<DbId>,
}

/// Required `?project_id=` for listings that only make sense inside one project.
#[derive(Debug, Deserialize)]
pub struct ProjectParam {
    pub project_id: DbId,
}

/// `?keyword=` filter for short lookup lists.
#[derive(Debug, Deserialize)]
pub struct KeywordParams {
    pub project_id: DbId,
    pub keyword: Option<String>,
}
