use tracing::info;

use recharge_core::{merge_patch, now_rfc3339};
use recharge_sql::{Statement, Value};

use crate::model::{ROLE_USER, RegisterUser, User};
use crate::service::password::hash_password;
use crate::service::{AccountError, AccountService, USER_COLUMNS, require, row_to_user};

impl AccountService {
    /// Register a password account.
    ///
    /// The email must have been verified through [`AccountService::verify_email`];
    /// the verification row is consumed with the insert.
    pub fn register(&self, input: RegisterUser) -> Result<User, AccountError> {
        require("userId", &input.user_id)?;
        require("userPwd", &input.user_pwd)?;
        require("userName", &input.user_name)?;
        require("userNickname", &input.user_nickname)?;
        require("userEmail", &input.user_email)?;

        if !self.is_email_verified(&input.user_email)? {
            return Err(AccountError::Validation("email is not verified".into()));
        }
        if self.check_user_id(&input.user_id)? {
            return Err(AccountError::Conflict("user id already exists".into()));
        }
        if self.check_nickname(&input.user_nickname)? {
            return Err(AccountError::Conflict("nickname already in use".into()));
        }
        if self.check_email(&input.user_email)? {
            return Err(AccountError::Conflict("email already registered".into()));
        }

        let hash = hash_password(&input.user_pwd)?;
        let now = now_rfc3339();
        let user = User {
            user_id: input.user_id,
            user_name: input.user_name,
            user_nickname: input.user_nickname,
            user_email: input.user_email,
            user_role: ROLE_USER.to_string(),
            social_id: None,
            social_type: None,
            device_os: None,
            device_version: None,
            fcm_token: None,
            created_at: now.clone(),
            updated_at: now,
        };

        self.sql.exec_atomic(&[
            insert_user_statement(&user, Some(&hash)),
            Statement::new(
                "DELETE FROM email_verifications WHERE email = ?1",
                vec![Value::Text(user.user_email.clone())],
            ),
        ])?;

        info!(user_id = %user.user_id, "user registered");
        Ok(user)
    }

    pub(crate) fn insert_user(&self, user: &User, password_hash: Option<&str>) -> Result<(), AccountError> {
        self.sql.exec_atomic(&[insert_user_statement(user, password_hash)])?;
        Ok(())
    }

    /// Whether a user id is taken.
    pub fn check_user_id(&self, user_id: &str) -> Result<bool, AccountError> {
        self.exists("user_id", user_id)
    }

    /// Whether a nickname is taken.
    pub fn check_nickname(&self, nickname: &str) -> Result<bool, AccountError> {
        self.exists("user_nickname", nickname)
    }

    /// Whether an email belongs to an account.
    pub fn check_email(&self, email: &str) -> Result<bool, AccountError> {
        self.exists("user_email", email)
    }

    fn exists(&self, column: &str, value: &str) -> Result<bool, AccountError> {
        let sql = format!("SELECT 1 AS hit FROM users WHERE {} = ?1 LIMIT 1", column);
        let rows = self.sql.query(&sql, &[Value::Text(value.to_string())])?;
        Ok(!rows.is_empty())
    }

    pub fn get_user(&self, user_id: &str) -> Result<User, AccountError> {
        self.find_user(user_id)?
            .ok_or_else(|| AccountError::NotFound(format!("users/{}", user_id)))
    }

    pub(crate) fn find_user(&self, user_id: &str) -> Result<Option<User>, AccountError> {
        let sql = format!("SELECT {} FROM users WHERE user_id = ?1", USER_COLUMNS);
        let rows = self.sql.query(&sql, &[Value::Text(user_id.to_string())])?;
        rows.first().map(row_to_user).transpose()
    }

    /// Update profile fields with a JSON merge-patch.
    ///
    /// Identity fields (`userId`, `userRole`, social link, `createdAt`) are
    /// kept from the stored record whatever the patch says.
    pub fn update_user_info(
        &self,
        user_id: &str,
        patch: serde_json::Value,
    ) -> Result<User, AccountError> {
        let current = self.get_user(user_id)?;
        let now = now_rfc3339();

        let mut base = serde_json::to_value(&current)
            .map_err(|e| AccountError::Internal(e.to_string()))?;
        merge_patch(&mut base, &patch);
        base["userId"] = serde_json::json!(current.user_id);
        base["userRole"] = serde_json::json!(current.user_role);
        base["socialId"] = serde_json::json!(current.social_id);
        base["socialType"] = serde_json::json!(current.social_type);
        base["createdAt"] = serde_json::json!(current.created_at);
        base["updatedAt"] = serde_json::json!(now);

        let updated: User = serde_json::from_value(base)
            .map_err(|e| AccountError::Validation(format!("invalid user patch: {}", e)))?;
        require("userName", &updated.user_name)?;
        require("userNickname", &updated.user_nickname)?;
        require("userEmail", &updated.user_email)?;

        if updated.user_nickname != current.user_nickname && self.check_nickname(&updated.user_nickname)? {
            return Err(AccountError::Conflict("nickname already in use".into()));
        }
        if updated.user_email != current.user_email && self.check_email(&updated.user_email)? {
            return Err(AccountError::Conflict("email already registered".into()));
        }

        self.sql.exec(
            "UPDATE users SET user_name = ?1, user_nickname = ?2, user_email = ?3,
                device_os = ?4, device_version = ?5, fcm_token = ?6, updated_at = ?7
             WHERE user_id = ?8",
            &[
                Value::Text(updated.user_name.clone()),
                Value::Text(updated.user_nickname.clone()),
                Value::Text(updated.user_email.clone()),
                Value::from(updated.device_os.clone()),
                Value::from(updated.device_version.clone()),
                Value::from(updated.fcm_token.clone()),
                Value::Text(updated.updated_at.clone()),
                Value::Text(user_id.to_string()),
            ],
        )?;

        Ok(updated)
    }

    /// Replace a user's password. Returns false when the user does not exist.
    pub fn change_password(&self, user_id: &str, new_password: &str) -> Result<bool, AccountError> {
        require("userPwd", new_password)?;
        let hash = hash_password(new_password)?;
        let affected = self.sql.exec(
            "UPDATE users SET password_hash = ?1, updated_at = ?2 WHERE user_id = ?3",
            &[
                Value::Text(hash),
                Value::Text(now_rfc3339()),
                Value::Text(user_id.to_string()),
            ],
        )?;
        Ok(affected > 0)
    }

    pub fn update_fcm_token(&self, user_id: &str, token: &str) -> Result<(), AccountError> {
        let affected = self.sql.exec(
            "UPDATE users SET fcm_token = ?1, updated_at = ?2 WHERE user_id = ?3",
            &[
                Value::Text(token.to_string()),
                Value::Text(now_rfc3339()),
                Value::Text(user_id.to_string()),
            ],
        )?;
        if affected == 0 {
            return Err(AccountError::NotFound(format!("users/{}", user_id)));
        }
        Ok(())
    }

    /// Delete a user and any pending reset tokens.
    pub fn delete_user(&self, user_id: &str) -> Result<(), AccountError> {
        let id = Value::Text(user_id.to_string());
        let affected = self.sql.exec_atomic(&[
            Statement::new("DELETE FROM password_resets WHERE user_id = ?1", vec![id.clone()]),
            Statement::new("DELETE FROM users WHERE user_id = ?1", vec![id]),
        ])?;
        if affected.get(1).copied().unwrap_or(0) == 0 {
            return Err(AccountError::NotFound(format!("users/{}", user_id)));
        }
        info!(user_id = %user_id, "user deleted");
        Ok(())
    }
}

fn insert_user_statement(user: &User, password_hash: Option<&str>) -> Statement {
    Statement::new(
        "INSERT INTO users (user_id, password_hash, user_name, user_nickname, user_email,
            user_role, social_id, social_type, device_os, device_version, fcm_token,
            created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        vec![
            Value::Text(user.user_id.clone()),
            Value::from(password_hash.map(str::to_string)),
            Value::Text(user.user_name.clone()),
            Value::Text(user.user_nickname.clone()),
            Value::Text(user.user_email.clone()),
            Value::Text(user.user_role.clone()),
            Value::from(user.social_id.clone()),
            Value::from(user.social_type.clone()),
            Value::from(user.device_os.clone()),
            Value::from(user.device_version.clone()),
            Value::from(user.fcm_token.clone()),
            Value::Text(user.created_at.clone()),
            Value::Text(user.updated_at.clone()),
        ],
    )
}
