//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` + `Validate` create DTO for inserts
//! - A `Deserialize` update DTO (all `Option` fields) for patches

use serde::Serialize;

pub mod activity;
pub mod comment;
pub mod exec;
pub mod func_baseline;
pub mod func_case;
pub mod func_plan;
pub mod func_review;
pub mod indicator;
pub mod node;
pub mod project;
pub mod report;
pub mod setting;
pub mod sprint;
pub mod tag;
pub mod task;
pub mod trash;
pub mod user;

/// One page of a listing plus the total match count.
#[derive(Debug, Clone, Serialize)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total: i64,
}

impl<T> Paged<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paged<U> {
        Paged {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
        }
    }
}

/// `id` / `name` / `code` triple used for associated items.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize)]
pub struct RefItem {
    pub id: angus_core::types::DbId,
    pub name: String,
    pub code: String,
}
