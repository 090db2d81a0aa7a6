//! HTTP request handlers.
//!
//! Each submodule holds the handlers of one resource. Handlers extract the
//! caller and the request, delegate to [`crate::services`], and wrap the
//! result in a [`crate::response::DataResponse`] envelope.

pub mod activity;
pub mod analysis;
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
