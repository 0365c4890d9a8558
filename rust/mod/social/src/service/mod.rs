pub mod schema;
pub mod edge;
pub mod follow;
pub mod bookmark;
pub mod feed;
pub mod post;
pub mod notification;

use std::sync::Arc;

use thiserror::Error;

use recharge_sql::{SQLError, SQLStore};

pub use notification::{NotificationDispatcher, NotificationWorker, Notifier, NotifyError, SqlNotifier};

/// Social service error type.
#[derive(Debug, Error)]
pub enum SocialError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("validation: {0}")]
    Validation(String),

    #[error("storage: {0}")]
    Storage(String),

    #[error("internal: {0}")]
    Internal(String),
}

impl From<SQLError> for SocialError {
    fn from(e: SQLError) -> Self {
        if e.is_constraint() {
            SocialError::Conflict(e.to_string())
        } else {
            SocialError::Storage(e.to_string())
        }
    }
}

impl From<SocialError> for recharge_core::ServiceError {
    fn from(e: SocialError) -> Self {
        match e {
            SocialError::NotFound(m) => recharge_core::ServiceError::NotFound(m),
            SocialError::Conflict(m) => recharge_core::ServiceError::Conflict(m),
            SocialError::Validation(m) => recharge_core::ServiceError::Validation(m),
            SocialError::Storage(m) => recharge_core::ServiceError::Storage(m),
            SocialError::Internal(m) => recharge_core::ServiceError::Internal(m),
        }
    }
}

/// Configuration for the social service.
#[derive(Debug, Clone)]
pub struct SocialConfig {
    /// Accept follow edges where follower and following are the same user.
    pub allow_self_follow: bool,
    /// How many delete/insert rounds a toggle attempts before it settles
    /// for reporting the observed state.
    pub toggle_attempts: u32,
}

impl Default for SocialConfig {
    fn default() -> Self {
        Self {
            allow_self_follow: true,
            toggle_attempts: 3,
        }
    }
}

/// The social service: follows, bookmarks, feed counters, posts, notifications.
pub struct SocialService {
    pub(crate) sql: Arc<dyn SQLStore>,
    pub(crate) config: SocialConfig,
    pub(crate) notifications: NotificationDispatcher,
}

impl SocialService {
    /// Create a new SocialService, initializing the DB schema.
    pub fn new(
        sql: Arc<dyn SQLStore>,
        config: SocialConfig,
        notifications: NotificationDispatcher,
    ) -> Result<Arc<Self>, SocialError> {
        schema::init_schema(sql.as_ref())?;
        Ok(Arc::new(Self {
            sql,
            config,
            notifications,
        }))
    }
}

/// Reject empty identifiers before they reach storage.
pub(crate) fn require(field: &str, value: &str) -> Result<(), SocialError> {
    if value.trim().is_empty() {
        return Err(SocialError::Validation(format!("{} cannot be empty", field)));
    }
    Ok(())
}
