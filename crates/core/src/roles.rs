//! Well-known role names carried in access tokens.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";

/// Tenant administrators bypass project membership checks.
pub fn is_admin_role(role: &str) -> bool {
    role == ROLE_ADMIN
}
