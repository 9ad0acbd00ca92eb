use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::auth::oauth::OAuthProviderId;

use super::{defaults, envconfig::EnvConfig, validate};

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub logging: LoggingConfig,
    pub database: Option<DatabaseConfig>,
    pub auth: Option<AuthConfig>,
    pub mail: MailConfig,
    pub oauth: OAuthConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        <Self as EnvConfig>::from_env()
    }
}

impl EnvConfig for AppConfig {
    fn validate(&self) -> Result<()> {
        validate::validate(self)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneralConfig {
    pub host: String,
    pub port: u16,
    pub app_name: String,
    pub frontend_url: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            host: defaults::DEFAULT_HOST.to_string(),
            port: defaults::DEFAULT_PORT as u16,
            app_name: defaults::DEFAULT_APP_NAME.to_string(),
            frontend_url: defaults::DEFAULT_FRONTEND_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub rust_log: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            rust_log: defaults::DEFAULT_RUST_LOG.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_db_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_db_min_idle")]
    pub min_idle: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    pub jwt_secret: String,
    #[serde(default = "default_access_ttl_secs")]
    pub access_ttl_secs: u64,
    #[serde(default = "default_refresh_ttl_secs")]
    pub refresh_ttl_secs: u64,
    pub admin_email: String,
    pub admin_password: String,
    #[serde(default = "default_admin_name")]
    pub admin_name: String,
}

impl AuthConfig {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            access_ttl_secs: default_access_ttl_secs(),
            refresh_ttl_secs: default_refresh_ttl_secs(),
            admin_email: "admin@example.com".to_string(),
            admin_password: "adminpassword".to_string(),
            admin_name: default_admin_name(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct MailConfig {
    pub from: String,
    pub queue_capacity: usize,
    pub enqueue_timeout_ms: u64,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            from: defaults::DEFAULT_MAIL_FROM.to_string(),
            queue_capacity: defaults::DEFAULT_MAIL_QUEUE_CAPACITY as usize,
            enqueue_timeout_ms: defaults::DEFAULT_MAIL_ENQUEUE_TIMEOUT_MS as u64,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct OAuthConfig {
    pub google: Option<OAuthAppConfig>,
    pub github: Option<OAuthAppConfig>,
    pub facebook: Option<OAuthAppConfig>,
    pub twitter: Option<OAuthAppConfig>,
    pub linkedin: Option<OAuthAppConfig>,
}

impl OAuthConfig {
    pub fn app(&self, provider: OAuthProviderId) -> Option<&OAuthAppConfig> {
        match provider {
            OAuthProviderId::Google => self.google.as_ref(),
            OAuthProviderId::Github => self.github.as_ref(),
            OAuthProviderId::Facebook => self.facebook.as_ref(),
            OAuthProviderId::Twitter => self.twitter.as_ref(),
            OAuthProviderId::Linkedin => self.linkedin.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OAuthAppConfig {
    pub client_id: String,
    pub client_secret: String,
    pub callback_url: String,
}

fn default_db_max_connections() -> u32 {
    defaults::DEFAULT_DB_MAX_CONNECTIONS as u32
}

fn default_db_min_idle() -> u32 {
    defaults::DEFAULT_DB_MIN_IDLE as u32
}

fn default_access_ttl_secs() -> u64 {
    defaults::DEFAULT_ACCESS_TTL_SECS as u64
}

fn default_refresh_ttl_secs() -> u64 {
    defaults::DEFAULT_REFRESH_TTL_SECS as u64
}

fn default_admin_name() -> String {
    defaults::DEFAULT_ADMIN_NAME.to_string()
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, EnvConfig};
    use crate::auth::oauth::OAuthProviderId;

    #[test]
    fn builds_from_dotted_pairs_with_defaults() {
        let cfg = AppConfig::from_pairs([
            ("general.port", "8080"),
            ("auth.jwt_secret", "secret"),
            ("auth.admin_email", "root@example.com"),
            ("auth.admin_password", "rootpassword"),
            ("oauth.github.client_id", "gh-id"),
            ("oauth.github.client_secret", "gh-secret"),
            ("oauth.github.callback_url", "http://localhost/cb"),
        ])
        .expect("config should load");

        assert_eq!(cfg.general.port, 8080);
        let auth = cfg.auth.expect("auth section should be present");
        assert_eq!(auth.access_ttl_secs, 900);
        assert_eq!(auth.admin_name, "Administrator");
        assert_eq!(cfg.mail.queue_capacity, 256);
        assert!(cfg.oauth.app(OAuthProviderId::Github).is_some());
        assert!(cfg.oauth.app(OAuthProviderId::Google).is_none());
    }

    #[test]
    fn rejects_short_admin_password() {
        let err = AppConfig::from_pairs([
            ("auth.jwt_secret", "secret"),
            ("auth.admin_email", "root@example.com"),
            ("auth.admin_password", "short"),
        ])
        .expect_err("validation should fail");

        assert!(err.to_string().contains("auth.admin_password"));
    }
}
