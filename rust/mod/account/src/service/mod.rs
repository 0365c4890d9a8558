pub mod schema;
pub mod password;
pub mod mailer;
pub mod kakao;
pub mod user;
pub mod session;
pub mod recovery;

use std::sync::Arc;

use thiserror::Error;

use recharge_sql::{Row, SQLError, SQLStore};

use crate::model::User;

pub use kakao::KakaoClient;
pub use mailer::{LogMailer, MailError, Mailer};

/// Account service error type.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("validation: {0}")]
    Validation(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("upstream: {0}")]
    Upstream(String),

    #[error("storage: {0}")]
    Storage(String),

    #[error("internal: {0}")]
    Internal(String),
}

impl From<SQLError> for AccountError {
    fn from(e: SQLError) -> Self {
        if e.is_constraint() {
            AccountError::Conflict(e.to_string())
        } else {
            AccountError::Storage(e.to_string())
        }
    }
}

impl From<AccountError> for recharge_core::ServiceError {
    fn from(e: AccountError) -> Self {
        match e {
            AccountError::NotFound(m) => recharge_core::ServiceError::NotFound(m),
            AccountError::Conflict(m) => recharge_core::ServiceError::Conflict(m),
            AccountError::Validation(m) => recharge_core::ServiceError::Validation(m),
            AccountError::Unauthorized(m) => recharge_core::ServiceError::Unauthorized(m),
            AccountError::Upstream(m) => recharge_core::ServiceError::Upstream(m),
            AccountError::Storage(m) => recharge_core::ServiceError::Storage(m),
            AccountError::Internal(m) => recharge_core::ServiceError::Internal(m),
        }
    }
}

/// Configuration for the account service.
#[derive(Debug, Clone)]
pub struct AccountConfig {
    /// JWT signing secret.
    pub jwt_secret: String,
    /// Login token lifetime in seconds (default: 24h).
    pub token_ttl: i64,
    /// Email verification code lifetime in seconds (default: 10 min).
    pub email_code_ttl: i64,
    /// Password reset token lifetime in seconds (default: 30 min).
    pub reset_token_ttl: i64,
    /// Kakao user profile endpoint.
    pub kakao_profile_url: String,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "recharge-dev-secret-change-me".to_string(),
            token_ttl: 86400,
            email_code_ttl: 600,
            reset_token_ttl: 1800,
            kakao_profile_url: kakao::DEFAULT_PROFILE_URL.to_string(),
        }
    }
}

/// The account service: registration, login, recovery and profile upkeep.
pub struct AccountService {
    pub(crate) sql: Arc<dyn SQLStore>,
    pub(crate) config: AccountConfig,
    pub(crate) mailer: Arc<dyn Mailer>,
    pub(crate) kakao: KakaoClient,
}

impl AccountService {
    /// Create a new AccountService, initializing the DB schema.
    pub fn new(
        sql: Arc<dyn SQLStore>,
        config: AccountConfig,
        mailer: Arc<dyn Mailer>,
    ) -> Result<Arc<Self>, AccountError> {
        schema::init_schema(sql.as_ref())?;
        let kakao = KakaoClient::new(&config.kakao_profile_url);
        Ok(Arc::new(Self {
            sql,
            config,
            mailer,
            kakao,
        }))
    }

    /// Send a mail, reporting failure as `false` after logging it.
    pub(crate) fn mail(&self, to: &str, subject: &str, body: &str) -> bool {
        match self.mailer.send(to, subject, body) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(to = %to, subject = %subject, error = %e, "mail delivery failed");
                false
            }
        }
    }
}

/// Columns selected wherever a full [`User`] is read back.
pub(crate) const USER_COLUMNS: &str = "user_id, user_name, user_nickname, user_email, user_role,
    social_id, social_type, device_os, device_version, fcm_token, created_at, updated_at";

pub(crate) fn row_to_user(row: &Row) -> Result<User, AccountError> {
    let missing = |col: &str| AccountError::Internal(format!("users.{} missing", col));
    Ok(User {
        user_id: row.get_string("user_id").ok_or_else(|| missing("user_id"))?,
        user_name: row.get_string("user_name").ok_or_else(|| missing("user_name"))?,
        user_nickname: row.get_string("user_nickname").ok_or_else(|| missing("user_nickname"))?,
        user_email: row.get_string("user_email").ok_or_else(|| missing("user_email"))?,
        user_role: row.get_string("user_role").ok_or_else(|| missing("user_role"))?,
        social_id: row.get_string("social_id"),
        social_type: row.get_string("social_type"),
        device_os: row.get_string("device_os"),
        device_version: row.get_string("device_version"),
        fcm_token: row.get_string("fcm_token"),
        created_at: row.get_string("created_at").ok_or_else(|| missing("created_at"))?,
        updated_at: row.get_string("updated_at").ok_or_else(|| missing("updated_at"))?,
    })
}

/// Reject empty input fields before they reach storage.
pub(crate) fn require(field: &str, value: &str) -> Result<(), AccountError> {
    if value.trim().is_empty() {
        return Err(AccountError::Validation(format!("{} cannot be empty", field)));
    }
    Ok(())
}

/// Current unix time in seconds.
pub(crate) fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
pub(crate) mod testutil {
    use std::sync::{Arc, Mutex};

    use recharge_sql::{SQLStore, SqliteStore};

    use super::*;

    /// Keeps every mail it is handed.
    #[derive(Default)]
    pub struct RecordingMailer {
        pub sent: Mutex<Vec<(String, String, String)>>,
        pub fail: bool,
    }

    impl RecordingMailer {
        /// Body of the most recent mail sent to `to`.
        pub fn last_to(&self, to: &str) -> Option<String> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .rev()
                .find(|(addr, _, _)| addr == to)
                .map(|(_, _, body)| body.clone())
        }
    }

    impl Mailer for RecordingMailer {
        fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
            if self.fail {
                return Err(MailError("smtp unavailable".into()));
            }
            self.sent
                .lock()
                .unwrap()
                .push((to.to_string(), subject.to_string(), body.to_string()));
            Ok(())
        }
    }

    pub fn service_with_mailer(mailer: Arc<RecordingMailer>) -> Arc<AccountService> {
        let sql: Arc<dyn SQLStore> = Arc::new(SqliteStore::open_in_memory().unwrap());
        AccountService::new(sql, AccountConfig::default(), mailer).unwrap()
    }

    pub fn service() -> (Arc<AccountService>, Arc<RecordingMailer>) {
        let mailer = Arc::new(RecordingMailer::default());
        (service_with_mailer(mailer.clone()), mailer)
    }

    /// Pull the `code=` parameter out of a verification mail body.
    pub fn code_from(body: &str) -> String {
        let start = body.find("code=").unwrap() + "code=".len();
        body[start..].split('&').next().unwrap().to_string()
    }

    /// Verify `email` and register a user with it.
    pub fn registered(svc: &AccountService, mailer: &RecordingMailer, id: &str) -> User {
        let email = format!("{}@example.com", id);
        assert!(svc.send_email_verification(&email).unwrap());
        let code = code_from(&mailer.last_to(&email).unwrap());
        assert!(svc.verify_email(&email, &code).unwrap());
        svc.register(crate::model::RegisterUser {
            user_id: id.to_string(),
            user_pwd: "secret-pw".to_string(),
            user_name: format!("{} name", id),
            user_nickname: format!("{}_nick", id),
            user_email: email,
        })
        .unwrap()
    }
}
