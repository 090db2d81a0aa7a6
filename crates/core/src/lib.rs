//! Domain rules for the test-management backend.
//!
//! This crate has no internal dependencies and no I/O: everything here is a
//! pure function over values the repositories have already loaded.

mod macros;

pub mod activity;
pub mod biz;
pub mod context;
pub mod error;
pub mod exec;
pub mod func;
pub mod indicator;
pub mod node;
pub mod priority;
pub mod project;
pub mod quota;
pub mod report;
pub mod roles;
pub mod search;
pub mod sprint;
pub mod stats;
pub mod tagging;
pub mod task;
pub mod types;
