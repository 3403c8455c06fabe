/*
 * Responsibility
 * - 環境変数や設定の読み込み (JWT secret, token TTL, API versions, permission hierarchy など)
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::services::auth::permissions::{HierarchyError, PermissionHierarchy};
use crate::services::versioning::{ApiVersion, VersionPolicy, VersionPolicyError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.unwrap_or("development").to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
    Versions(VersionPolicyError),
    Hierarchy(HierarchyError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
            ConfigError::Versions(e) => write!(f, "invalid API version configuration: {}", e),
            ConfigError::Hierarchy(e) => write!(f, "invalid permission hierarchy: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Versions(e) => Some(e),
            ConfigError::Hierarchy(e) => Some(e),
            _ => None,
        }
    }
}

impl From<VersionPolicyError> for ConfigError {
    fn from(e: VersionPolicyError) -> Self {
        ConfigError::Versions(e)
    }
}

impl From<HierarchyError> for ConfigError {
    fn from(e: HierarchyError) -> Self {
        ConfigError::Hierarchy(e)
    }
}

#[derive(Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    pub jwt_secret: String,
    pub access_token_ttl_seconds: u64,
    pub refresh_token_ttl_seconds: u64,

    pub version_policy: VersionPolicy,
    pub permission_hierarchy: PermissionHierarchy,

    // Unset: revoked refresh tokens are kept in process memory.
    pub redis_url: Option<String>,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print secrets
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("access_token_ttl_seconds", &self.access_token_ttl_seconds)
            .field("refresh_token_ttl_seconds", &self.refresh_token_ttl_seconds)
            .field("version_policy", &self.version_policy)
            .field("redis_url", &self.redis_url.is_some())
            .field("bootstrap_admin", &self.bootstrap_admin.is_some())
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production, a map in tests).
    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = var("PORT").and_then(|s| s.parse().ok()).unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(var("APP_ENV").as_deref());

        let cors_allowed_origins = var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let jwt_secret = var("JWT_SECRET_KEY")
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET_KEY"))?;

        let access_token_minutes = parse_positive_or(&var, "ACCESS_TOKEN_EXPIRE_MINUTES", 30)?;
        let refresh_token_days = parse_positive_or(&var, "REFRESH_TOKEN_EXPIRE_DAYS", 7)?;

        let versions = parse_versions(var("API_VERSIONS").as_deref().unwrap_or("v1,v2"))
            .ok_or(ConfigError::Invalid("API_VERSIONS"))?;
        let default_version = ApiVersion::parse(var("API_DEFAULT_VERSION").as_deref().unwrap_or("v1"))
            .ok_or(ConfigError::Invalid("API_DEFAULT_VERSION"))?;
        let deprecated = parse_versions(var("API_DEPRECATED_VERSIONS").as_deref().unwrap_or(""))
            .ok_or(ConfigError::Invalid("API_DEPRECATED_VERSIONS"))?;
        let sunset = var("API_SUNSET_DATE").filter(|s| !s.trim().is_empty());

        let version_policy =
            VersionPolicy::new(versions, default_version)?.with_deprecated(deprecated, sunset)?;

        let permission_hierarchy = match var("PERMISSION_HIERARCHY_JSON") {
            Some(raw) if !raw.trim().is_empty() => PermissionHierarchy::from_json(&raw)?,
            _ => PermissionHierarchy::builtin(),
        };

        let redis_url = var("REDIS_URL").filter(|s| !s.trim().is_empty());

        let bootstrap_admin = match (var("BOOTSTRAP_ADMIN_EMAIL"), var("BOOTSTRAP_ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(BootstrapAdmin { email, password }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing("BOOTSTRAP_ADMIN_PASSWORD")),
            (None, Some(_)) => return Err(ConfigError::Missing("BOOTSTRAP_ADMIN_EMAIL")),
        };

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins,
            jwt_secret,
            access_token_ttl_seconds: access_token_minutes.saturating_mul(60),
            refresh_token_ttl_seconds: refresh_token_days.saturating_mul(24 * 60 * 60),
            version_policy,
            permission_hierarchy,
            redis_url,
            bootstrap_admin,
        })
    }
}

/// A zero lifetime would mint tokens that are already expired.
fn parse_positive_or<F>(var: &F, key: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => match raw.trim().parse() {
            Ok(0) | Err(_) => Err(ConfigError::Invalid(key)),
            Ok(n) => Ok(n),
        },
        None => Ok(default),
    }
}

/// Comma-separated tags; `None` if any entry is not a version tag.
fn parse_versions(raw: &str) -> Option<Vec<ApiVersion>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ApiVersion::parse)
        .collect()
}
