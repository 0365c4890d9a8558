//! Server-side configuration file.
//!
//! A bare context name resolves to `/etc/recharge/<name>.toml`; anything
//! that looks like a path is used as is.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Directory holding named server configurations.
pub const CONFIG_DIR: &str = "/etc/recharge";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub storage: StorageConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub kakao: KakaoConfig,
    #[serde(default)]
    pub social: SocialSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding `data.sqlite`.
    pub data_dir: String,
    /// Overrides `{data_dir}/data.sqlite`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sqlite_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    /// Login token lifetime in seconds.
    #[serde(default = "default_expire_secs")]
    pub expire_secs: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KakaoConfig {
    #[serde(default = "default_kakao_profile_url")]
    pub profile_url: String,
}

impl Default for KakaoConfig {
    fn default() -> Self {
        Self {
            profile_url: default_kakao_profile_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialSection {
    #[serde(default = "default_true")]
    pub allow_self_follow: bool,
}

impl Default for SocialSection {
    fn default() -> Self {
        Self {
            allow_self_follow: true,
        }
    }
}

fn default_expire_secs() -> i64 {
    86400
}

fn default_kakao_profile_url() -> String {
    account::service::kakao::DEFAULT_PROFILE_URL.to_string()
}

fn default_true() -> bool {
    true
}

impl ServerConfig {
    /// Map a `-c` argument to a config file path.
    pub fn resolve_path(name_or_path: &str) -> PathBuf {
        if name_or_path.contains('/') || name_or_path.ends_with(".toml") {
            PathBuf::from(name_or_path)
        } else {
            Path::new(CONFIG_DIR).join(format!("{}.toml", name_or_path))
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read {}: {}", path.display(), e))?;
        let config: ServerConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn account_config(&self) -> account::service::AccountConfig {
        account::service::AccountConfig {
            jwt_secret: self.jwt.secret.clone(),
            token_ttl: self.jwt.expire_secs,
            kakao_profile_url: self.kakao.profile_url.clone(),
            ..Default::default()
        }
    }

    pub fn social_config(&self) -> social::service::SocialConfig {
        social::service::SocialConfig {
            allow_self_follow: self.social.allow_self_follow,
            ..Default::default()
        }
    }
}
