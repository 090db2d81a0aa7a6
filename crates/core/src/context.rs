//! Per-request caller identity.
//!
//! Built once from the bearer token and passed by reference into every
//! service call. Nothing reads identity from ambient state.

use crate::error::CoreError;
use crate::types::DbId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext {
    pub tenant_id: DbId,
    pub user_id: DbId,
    pub is_admin: bool,
}

impl RequestContext {
    pub fn new(tenant_id: DbId, user_id: DbId, is_admin: bool) -> Self {
        Self {
            tenant_id,
            user_id,
            is_admin,
        }
    }

    /// Reject the call unless the caller is a tenant administrator.
    pub fn require_admin(&self) -> Result<(), CoreError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(CoreError::Forbidden(
                "Tenant administrator role required".to_string(),
            ))
        }
    }

    /// Reject the call when the row belongs to another tenant.
    pub fn require_same_tenant(&self, tenant_id: DbId) -> Result<(), CoreError> {
        if self.tenant_id == tenant_id {
            Ok(())
        } else {
            Err(CoreError::Forbidden(
                "Resource belongs to another tenant".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn admin_check() {
        assert!(RequestContext::new(1, 2, true).require_admin().is_ok());
        assert_matches!(
            RequestContext::new(1, 2, false).require_admin(),
            Err(CoreError::Forbidden(_))
        );
    }

    #[test]
    fn tenant_check() {
        let ctx = RequestContext::new(5, 9, false);
        assert!(ctx.require_same_tenant(5).is_ok());
        assert!(ctx.require_same_tenant(6).is_err());
    }
}
