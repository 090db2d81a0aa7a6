//! Command and query services.
//!
//! Every operation runs through [`angus_core::biz::run`]: the validate phase
//! loads and checks everything it needs without writing, and the execute
//! phase performs the writes in one transaction together with the activity
//! row. Handlers stay thin: extract, call a service, wrap the result.

pub mod access;
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
pub mod search;
pub mod setting;
pub mod sprint;
pub mod tag;
pub mod task;
pub mod trash;
