use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::{error, info};

use recharge_core::now_rfc3339;
use recharge_sql::Value;

use crate::model::{Claims, LoginRequest, LoginResponse, User};
use crate::service::password::verify_password;
use crate::service::{AccountError, AccountService, require};

impl AccountService {
    /// Log in with user id and password.
    ///
    /// Device fields present in the request overwrite the stored ones.
    pub fn login(&self, input: &LoginRequest) -> Result<LoginResponse, AccountError> {
        require("userId", &input.user_id)?;

        let rows = self.sql.query(
            "SELECT password_hash FROM users WHERE user_id = ?1",
            &[Value::Text(input.user_id.clone())],
        )?;
        let row = rows
            .first()
            .ok_or_else(|| AccountError::NotFound("user id does not exist".into()))?;
        let hash = row
            .get_string("password_hash")
            .ok_or_else(|| AccountError::Unauthorized("account uses social login".into()))?;
        if !verify_password(&input.user_pwd, &hash) {
            return Err(AccountError::Unauthorized("password does not match".into()));
        }

        self.sql.exec(
            "UPDATE users SET
                device_os = COALESCE(?1, device_os),
                device_version = COALESCE(?2, device_version),
                fcm_token = COALESCE(?3, fcm_token),
                updated_at = ?4
             WHERE user_id = ?5",
            &[
                Value::from(input.device_os.clone()),
                Value::from(input.device_version.clone()),
                Value::from(input.fcm_token.clone()),
                Value::Text(now_rfc3339()),
                Value::Text(input.user_id.clone()),
            ],
        )?;

        let user = self.get_user(&input.user_id)?;
        info!(user_id = %user.user_id, "user logged in");
        self.login_response(user)
    }

    pub(crate) fn login_response(&self, user: User) -> Result<LoginResponse, AccountError> {
        let token = self.issue_token(&user)?;
        Ok(LoginResponse {
            user,
            token,
            token_type: "Bearer".to_string(),
            expires_in: self.config.token_ttl,
        })
    }

    /// Sign a JWT for a user.
    pub fn issue_token(&self, user: &User) -> Result<String, AccountError> {
        let now = chrono::Utc::now();
        let claims = Claims {
            sub: user.user_id.clone(),
            role: user.user_role.clone(),
            iat: now.timestamp(),
            exp: (now + chrono::Duration::seconds(self.config.token_ttl)).timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| {
            error!(user_id = %user.user_id, error = %e, "JWT encode failed");
            AccountError::Internal(format!("JWT encode failed: {}", e))
        })
    }

    /// Verify and decode a JWT issued by [`AccountService::issue_token`].
    pub fn verify_token(&self, token: &str) -> Result<Claims, AccountError> {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| AccountError::Unauthorized(format!("invalid token: {}", e)))
    }
}
