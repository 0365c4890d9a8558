//! Authenticated caller identity.
//!
//! The server's bearer middleware verifies the token and inserts a
//! [`Caller`] into request extensions. Module handlers that act on behalf
//! of a user extract it and check ownership before touching storage.

use serde::{Deserialize, Serialize};

use crate::ServiceError;

/// The user a request was authenticated as.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Caller {
    pub user_id: String,
    pub role: String,
}

impl Caller {
    pub fn new(user_id: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role: role.into(),
        }
    }

    /// Allow the request only when it acts on the caller's own account.
    pub fn require_user(&self, user_id: &str) -> Result<(), ServiceError> {
        if self.user_id != user_id {
            return Err(ServiceError::PermissionDenied(format!(
                "user '{}' cannot act for '{}'",
                self.user_id, user_id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_user() {
        let caller = Caller::new("kim", "USER");
        assert!(caller.require_user("kim").is_ok());

        let err = caller.require_user("lee").unwrap_err();
        assert!(matches!(err, ServiceError::PermissionDenied(_)));
        assert_eq!(err.status_code(), axum::http::StatusCode::FORBIDDEN);
    }
}
