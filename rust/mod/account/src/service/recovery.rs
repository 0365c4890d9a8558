//! Email verification, user id reminders and password resets.
//!
//! Codes and tokens expire on a unix timestamp stored next to them. Mail
//! delivery is best effort: a failed send is logged and reported as `false`.

use reqwest::Url;
use tracing::info;

use recharge_core::{new_id, now_rfc3339};
use recharge_sql::{Statement, Value};

use crate::model::User;
use crate::service::password::hash_password;
use crate::service::{AccountError, AccountService, USER_COLUMNS, require, row_to_user, unix_now};

const SUBJECT_VERIFY: &str = "[Re:charge] Email verification";
const SUBJECT_FIND_ID: &str = "[Re:charge] Your user id";
const SUBJECT_RESET: &str = "[Re:charge] Password reset";

/// An app deep link with percent-encoded query values.
fn deep_link(base: &str, params: &[(&str, &str)]) -> Result<String, AccountError> {
    Url::parse_with_params(base, params)
        .map(String::from)
        .map_err(|e| AccountError::Internal(format!("bad link {}: {}", base, e)))
}

impl AccountService {
    /// Mail a verification code to an address not yet owned by an account.
    ///
    /// Returns false when the address is taken or the mail could not be sent.
    /// Sending again replaces the pending code.
    pub fn send_email_verification(&self, email: &str) -> Result<bool, AccountError> {
        require("userEmail", email)?;
        if self.check_email(email)? {
            return Ok(false);
        }

        let code: String = new_id().chars().take(6).collect();
        self.sql.exec(
            "INSERT INTO email_verifications (email, code, expires_at, verified, created_at)
             VALUES (?1, ?2, ?3, 0, ?4)
             ON CONFLICT(email) DO UPDATE SET
                code = excluded.code,
                expires_at = excluded.expires_at,
                verified = 0,
                created_at = excluded.created_at",
            &[
                Value::Text(email.to_string()),
                Value::Text(code.clone()),
                Value::Integer(unix_now() + self.config.email_code_ttl),
                Value::Text(now_rfc3339()),
            ],
        )?;

        let link = deep_link(
            "rechargeapp://email-auth",
            &[("code", code.as_str()), ("email", email)],
        )?;
        let body = format!(
            "Tap the link below to verify your email. It expires in {} minutes.\n{}",
            self.config.email_code_ttl / 60,
            link
        );
        Ok(self.mail(email, SUBJECT_VERIFY, &body))
    }

    /// Confirm a verification code. Wrong or expired codes return false.
    pub fn verify_email(&self, email: &str, code: &str) -> Result<bool, AccountError> {
        let affected = self.sql.exec(
            "UPDATE email_verifications SET verified = 1
             WHERE email = ?1 AND code = ?2 AND expires_at > ?3",
            &[
                Value::Text(email.to_string()),
                Value::Text(code.to_string()),
                Value::Integer(unix_now()),
            ],
        )?;
        if affected > 0 {
            info!(email = %email, "email verified");
        }
        Ok(affected > 0)
    }

    pub(crate) fn is_email_verified(&self, email: &str) -> Result<bool, AccountError> {
        let rows = self.sql.query(
            "SELECT verified FROM email_verifications WHERE email = ?1",
            &[Value::Text(email.to_string())],
        )?;
        Ok(rows
            .first()
            .and_then(|r| r.get_bool("verified"))
            .unwrap_or(false))
    }

    /// Mail the user id registered under a name and email.
    pub fn send_user_id_reminder(&self, name: &str, email: &str) -> Result<bool, AccountError> {
        let rows = self.sql.query(
            "SELECT user_id FROM users WHERE user_name = ?1 AND user_email = ?2",
            &[Value::Text(name.to_string()), Value::Text(email.to_string())],
        )?;
        let Some(user_id) = rows.first().and_then(|r| r.get_string("user_id")) else {
            return Ok(false);
        };

        let body = format!("The user id registered with this email is: {}", user_id);
        Ok(self.mail(email, SUBJECT_FIND_ID, &body))
    }

    /// Issue a password reset token for a matching user id and email, and
    /// mail the reset link.
    pub fn request_password_reset(&self, user_id: &str, email: &str) -> Result<bool, AccountError> {
        let rows = self.sql.query(
            "SELECT user_id FROM users WHERE user_id = ?1 AND user_email = ?2",
            &[Value::Text(user_id.to_string()), Value::Text(email.to_string())],
        )?;
        if rows.is_empty() {
            return Ok(false);
        }

        let token = new_id();
        self.sql.exec(
            "INSERT INTO password_resets (token, user_id, expires_at, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            &[
                Value::Text(token.clone()),
                Value::Text(user_id.to_string()),
                Value::Integer(unix_now() + self.config.reset_token_ttl),
                Value::Text(now_rfc3339()),
            ],
        )?;

        info!(user_id = %user_id, "password reset requested");
        let link = deep_link("rechargeapp://reset-password", &[("token", token.as_str())])?;
        let body = format!(
            "Tap the link below to reset your password. It expires in {} minutes.\n{}",
            self.config.reset_token_ttl / 60,
            link
        );
        Ok(self.mail(email, SUBJECT_RESET, &body))
    }

    /// The user an unexpired reset token belongs to.
    pub fn user_by_reset_token(&self, token: &str) -> Result<Option<User>, AccountError> {
        let sql = format!(
            "SELECT {} FROM users WHERE user_id = (
                SELECT user_id FROM password_resets WHERE token = ?1 AND expires_at > ?2
             )",
            USER_COLUMNS
        );
        let rows = self.sql.query(
            &sql,
            &[Value::Text(token.to_string()), Value::Integer(unix_now())],
        )?;
        rows.first().map(row_to_user).transpose()
    }

    /// Set a new password through a reset token. Every pending token of the
    /// user is consumed in the same transaction, so a token sets at most one
    /// password even under concurrent use.
    pub fn reset_password(&self, token: &str, new_password: &str) -> Result<bool, AccountError> {
        require("userPwd", new_password)?;
        let Some(user) = self.user_by_reset_token(token)? else {
            return Ok(false);
        };

        let hash = hash_password(new_password)?;
        let token = Value::Text(token.to_string());
        let counts = self.sql.exec_atomic(&[
            Statement::new(
                "UPDATE users SET password_hash = ?1, updated_at = ?2 WHERE user_id = (
                    SELECT user_id FROM password_resets WHERE token = ?3 AND expires_at > ?4
                 )",
                vec![
                    Value::Text(hash),
                    Value::Text(now_rfc3339()),
                    token.clone(),
                    Value::Integer(unix_now()),
                ],
            ),
            Statement::new(
                "DELETE FROM password_resets WHERE user_id = (
                    SELECT user_id FROM password_resets WHERE token = ?1
                 )",
                vec![token],
            ),
        ])?;
        if counts.first().copied().unwrap_or(0) == 0 {
            return Ok(false);
        }

        info!(user_id = %user.user_id, "password reset");
        Ok(true)
    }
}
