//! Authentication primitives.
//!
//! - [`jwt`] -- access-token generation and validation.
//!
//! Users sign in against the tenant directory; this service only verifies
//! the bearer tokens it is handed.

pub mod jwt;
