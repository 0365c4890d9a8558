//! Account module: registration with email verification, password and
//! Kakao login, JWT issue and verification, recovery flows and profile
//! upkeep.
//!
//! # Usage
//!
//! ```ignore
//! use account::{AccountModule, service::{AccountConfig, LogMailer}};
//!
//! let module = AccountModule::new(sql, AccountConfig::default(), Arc::new(LogMailer))?;
//! let claims = module.service().verify_token(token)?;
//! ```

pub mod api;
pub mod model;
pub mod service;

use std::sync::Arc;

use axum::Router;

use recharge_core::Module;
use recharge_sql::SQLStore;

use crate::service::{AccountConfig, AccountService, Mailer};

/// Account module implementing the Module trait.
pub struct AccountModule {
    service: Arc<AccountService>,
}

impl AccountModule {
    pub fn new(
        sql: Arc<dyn SQLStore>,
        config: AccountConfig,
        mailer: Arc<dyn Mailer>,
    ) -> Result<Self, recharge_core::ServiceError> {
        let service = AccountService::new(sql, config, mailer)?;
        Ok(Self { service })
    }

    /// Get a reference to the underlying AccountService.
    pub fn service(&self) -> &Arc<AccountService> {
        &self.service
    }
}

impl Module for AccountModule {
    fn name(&self) -> &str {
        "account"
    }

    fn routes(&self) -> Router {
        api::build_router(self.service.clone())
    }
}
