//! Social module: follows, bookmarks, profile feed counters, posts and the
//! in-app notification inbox.
//!
//! Follow and bookmark edges live in tables keyed by their composite key;
//! the per-user feed counter is a cache recomputed from `posts` and
//! `follows` whenever a follow changes or the profile is opened.
//!
//! # Usage
//!
//! ```ignore
//! use social::{SocialModule, service::SocialConfig};
//!
//! let module = SocialModule::new(sql, SocialConfig::default())?;
//! let router = module.routes();
//! ```

pub mod api;
pub mod model;
pub mod service;

use std::sync::Arc;

use axum::Router;

use recharge_core::Module;
use recharge_sql::SQLStore;

use crate::service::{NotificationDispatcher, SocialConfig, SocialService, SqlNotifier};

/// Social module implementing the Module trait.
pub struct SocialModule {
    service: Arc<SocialService>,
}

impl SocialModule {
    /// Create the module with the in-app inbox as notifier.
    ///
    /// Must be called inside a tokio runtime: the notification worker is
    /// spawned onto it.
    pub fn new(
        sql: Arc<dyn SQLStore>,
        config: SocialConfig,
    ) -> Result<Self, recharge_core::ServiceError> {
        let dispatcher = NotificationDispatcher::spawn(Arc::new(SqlNotifier::new(sql.clone())));
        let service = SocialService::new(sql, config, dispatcher)?;
        Ok(Self { service })
    }

    /// Get a reference to the underlying SocialService.
    pub fn service(&self) -> &Arc<SocialService> {
        &self.service
    }
}

impl Module for SocialModule {
    fn name(&self) -> &str {
        "social"
    }

    fn routes(&self) -> Router {
        api::build_router(self.service.clone())
    }
}
