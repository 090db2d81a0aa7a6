use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// A business rule rejected an otherwise well-formed request.
    #[error("{0}")]
    Business(String),

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<validator::ValidationErrors> for CoreError {
    fn from(errors: validator::ValidationErrors) -> Self {
        CoreError::Validation(errors.to_string())
    }
}

/// Fail with a validation error unless `cond` holds.
pub fn ensure(cond: bool, msg: impl Into<String>) -> Result<(), CoreError> {
    if cond {
        Ok(())
    } else {
        Err(CoreError::Validation(msg.into()))
    }
}

/// Fail with a business error unless `cond` holds.
pub fn ensure_biz(cond: bool, msg: impl Into<String>) -> Result<(), CoreError> {
    if cond {
        Ok(())
    } else {
        Err(CoreError::Business(msg.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn ensure_passes_and_fails() {
        assert!(ensure(true, "unused").is_ok());
        assert_matches!(ensure(false, "bad input"), Err(CoreError::Validation(m)) if m == "bad input");
    }

    #[test]
    fn ensure_biz_maps_to_business() {
        assert_matches!(
            ensure_biz(false, "sprint tasks incomplete"),
            Err(CoreError::Business(_))
        );
    }

    #[test]
    fn not_found_message_names_entity() {
        let err = CoreError::NotFound { entity: "Task", id: 7 };
        assert_eq!(err.to_string(), "Entity not found: Task with id 7");
    }
}
