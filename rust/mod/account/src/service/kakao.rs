use password_hash::rand_core::{OsRng, RngCore};
use tracing::{debug, info};

use recharge_core::now_rfc3339;
use recharge_sql::Value;

use crate::model::{LoginResponse, ROLE_USER, SOCIAL_KAKAO, SocialProfile, User};
use crate::service::{AccountError, AccountService, USER_COLUMNS, row_to_user};

pub const DEFAULT_PROFILE_URL: &str = "https://kapi.kakao.com/v2/user/me";

/// Client for the Kakao user profile endpoint.
pub struct KakaoClient {
    http: reqwest::Client,
    profile_url: String,
}

impl KakaoClient {
    pub fn new(profile_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            profile_url: profile_url.to_string(),
        }
    }

    /// Fetch the raw profile JSON for a user access token.
    pub async fn fetch_profile(&self, access_token: &str) -> Result<serde_json::Value, AccountError> {
        let resp = self
            .http
            .post(&self.profile_url)
            .bearer_auth(access_token)
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded;charset=utf-8",
            )
            .send()
            .await
            .map_err(|e| AccountError::Upstream(format!("kakao profile request failed: {}", e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(AccountError::Upstream(format!(
                "kakao profile returned {}: {}",
                status, body
            )));
        }

        resp.json()
            .await
            .map_err(|e| AccountError::Upstream(format!("kakao profile parse failed: {}", e)))
    }
}

/// Extract a profile from Kakao's `/v2/user/me` response.
///
/// Missing fields fall back: nickname to `K_<suffix>`, name to the nickname,
/// email to `kakao_<id>@no-email.com`.
pub fn parse_kakao_profile(
    json: &serde_json::Value,
    nickname_suffix: u32,
) -> Result<SocialProfile, AccountError> {
    let id = json["id"]
        .as_i64()
        .map(|n| n.to_string())
        .or_else(|| json["id"].as_str().map(str::to_string))
        .ok_or_else(|| AccountError::Upstream("kakao profile has no id".into()))?;

    let present = |v: &serde_json::Value| {
        v.as_str()
            .filter(|s| !s.is_empty() && *s != "null")
            .map(str::to_string)
    };

    let nickname = present(&json["properties"]["nickname"])
        .unwrap_or_else(|| format!("K_{}", nickname_suffix));
    let name = present(&json["kakao_account"]["name"]).unwrap_or_else(|| nickname.clone());
    let email = present(&json["kakao_account"]["email"])
        .unwrap_or_else(|| format!("kakao_{}@no-email.com", id));

    Ok(SocialProfile {
        social_id: id,
        social_type: SOCIAL_KAKAO.to_string(),
        nickname,
        name,
        email,
    })
}

/// Five random digits, 10000..=99999.
fn random_suffix() -> u32 {
    10000 + OsRng.next_u32() % 90000
}

impl AccountService {
    /// Log in with a Kakao access token, creating the account on first use.
    pub async fn kakao_login(&self, access_token: &str) -> Result<LoginResponse, AccountError> {
        crate::service::require("accessToken", access_token)?;
        let json = self.kakao.fetch_profile(access_token).await?;
        let profile = parse_kakao_profile(&json, random_suffix())?;
        self.social_login(&profile)
    }

    /// Find the account linked to a social profile or create it, then issue a token.
    ///
    /// Concurrent first logins race on the `social_id` constraint; the loser
    /// logs in as the account the winner created.
    pub fn social_login(&self, profile: &SocialProfile) -> Result<LoginResponse, AccountError> {
        let user = match self.find_by_social_id(&profile.social_id)? {
            Some(user) => user,
            None => match self.create_social_user(profile) {
                Ok(user) => user,
                Err(AccountError::Conflict(msg)) => {
                    debug!(social_id = %profile.social_id, "social account created concurrently, re-reading");
                    self.find_by_social_id(&profile.social_id)?
                        .ok_or(AccountError::Conflict(msg))?
                }
                Err(e) => return Err(e),
            },
        };
        self.login_response(user)
    }

    fn find_by_social_id(&self, social_id: &str) -> Result<Option<User>, AccountError> {
        let sql = format!("SELECT {} FROM users WHERE social_id = ?1", USER_COLUMNS);
        let rows = self.sql.query(&sql, &[Value::Text(social_id.to_string())])?;
        rows.first().map(row_to_user).transpose()
    }

    fn create_social_user(&self, profile: &SocialProfile) -> Result<User, AccountError> {
        let mut nickname = profile.nickname.clone();
        for _ in 0..5 {
            if !self.check_nickname(&nickname)? {
                break;
            }
            nickname = format!("K_{}", random_suffix());
        }

        let now = now_rfc3339();
        let user = User {
            user_id: format!("{}_{}", profile.social_type.to_lowercase(), profile.social_id),
            user_name: profile.name.clone(),
            user_nickname: nickname,
            user_email: profile.email.clone(),
            user_role: ROLE_USER.to_string(),
            social_id: Some(profile.social_id.clone()),
            social_type: Some(profile.social_type.clone()),
            device_os: None,
            device_version: None,
            fcm_token: None,
            created_at: now.clone(),
            updated_at: now,
        };
        self.insert_user(&user, None)?;

        info!(user_id = %user.user_id, social_type = %profile.social_type, "social account created");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testutil;

    #[test]
    fn parse_full_profile() {
        let json = serde_json::json!({
            "id": 12345,
            "properties": {"nickname": "charger"},
            "kakao_account": {"email": "c@kakao.com", "name": "Kim"}
        });
        let p = parse_kakao_profile(&json, 55555).unwrap();
        assert_eq!(p.social_id, "12345");
        assert_eq!(p.social_type, "KAKAO");
        assert_eq!(p.nickname, "charger");
        assert_eq!(p.name, "Kim");
        assert_eq!(p.email, "c@kakao.com");
    }

    #[test]
    fn parse_applies_fallbacks() {
        let json = serde_json::json!({"id": 777, "properties": {"nickname": "null"}});
        let p = parse_kakao_profile(&json, 12345).unwrap();
        assert_eq!(p.nickname, "K_12345");
        assert_eq!(p.name, "K_12345");
        assert_eq!(p.email, "kakao_777@no-email.com");
    }

    #[test]
    fn parse_requires_id() {
        let err = parse_kakao_profile(&serde_json::json!({}), 10000).unwrap_err();
        assert!(matches!(err, AccountError::Upstream(_)));
    }

    #[test]
    fn suffix_has_five_digits() {
        for _ in 0..100 {
            let n = random_suffix();
            assert!((10000..=99999).contains(&n));
        }
    }

    #[test]
    fn social_login_creates_once() {
        let (svc, _) = testutil::service();
        let profile = parse_kakao_profile(&serde_json::json!({"id": 42}), 11111).unwrap();

        let first = svc.social_login(&profile).unwrap();
        assert_eq!(first.user.user_id, "kakao_42");
        assert_eq!(first.user.social_type.as_deref(), Some("KAKAO"));
        assert_eq!(first.user.user_role, "USER");

        let second = svc.social_login(&profile).unwrap();
        assert_eq!(second.user.user_id, "kakao_42");
        assert_eq!(second.user.created_at, first.user.created_at);
        assert_eq!(svc.verify_token(&second.token).unwrap().sub, "kakao_42");
    }

    #[test]
    fn concurrent_first_logins_share_one_account() {
        use std::sync::{Arc, Barrier};

        for round in 0..20 {
            let (svc, _) = testutil::service();
            let profile = parse_kakao_profile(&serde_json::json!({"id": 1000 + round}), 33333).unwrap();
            let barrier = Arc::new(Barrier::new(8));

            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let svc = svc.clone();
                    let profile = profile.clone();
                    let barrier = barrier.clone();
                    std::thread::spawn(move || {
                        barrier.wait();
                        svc.social_login(&profile)
                    })
                })
                .collect();

            for h in handles {
                let resp = h.join().unwrap().unwrap();
                assert_eq!(resp.user.user_id, format!("kakao_{}", 1000 + round));
            }
            let rows = svc
                .sql
                .query("SELECT COUNT(*) AS cnt FROM users", &[])
                .unwrap();
            assert_eq!(rows[0].get_i64("cnt"), Some(1));
        }
    }

    #[test]
    fn social_login_avoids_taken_nickname() {
        let (svc, mailer) = testutil::service();
        let taken = testutil::registered(&svc, &mailer, "alice");

        let mut profile = parse_kakao_profile(&serde_json::json!({"id": 9}), 22222).unwrap();
        profile.nickname = taken.user_nickname.clone();
        let resp = svc.social_login(&profile).unwrap();
        assert_ne!(resp.user.user_nickname, taken.user_nickname);
        assert!(resp.user.user_nickname.starts_with("K_"));
    }

    #[tokio::test]
    async fn unreachable_kakao_is_upstream_error() {
        let sql: std::sync::Arc<dyn recharge_sql::SQLStore> =
            std::sync::Arc::new(recharge_sql::SqliteStore::open_in_memory().unwrap());
        let config = crate::service::AccountConfig {
            kakao_profile_url: "http://127.0.0.1:1/v2/user/me".to_string(),
            ..Default::default()
        };
        let svc = AccountService::new(sql, config, std::sync::Arc::new(crate::service::LogMailer))
            .unwrap();
        assert!(matches!(
            svc.kakao_login("token").await,
            Err(AccountError::Upstream(_))
        ));
    }
}
