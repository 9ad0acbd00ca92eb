//! Fixtures shared by unit and integration tests.

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use sea_orm::DatabaseConnection;
use serde_json::Value;

use crate::{
    auth::oauth::{OAuthClient, OAuthStrategy},
    config::{AppConfig, AuthConfig, DatabaseConfig, OAuthAppConfig},
    db::connection,
    error::AppError,
    mail::{LogTransport, Mailer},
    routes::app,
    state::AppState,
};

pub const TEST_SECRET: &str = "integration-test-secret";
pub const ADMIN_EMAIL: &str = "admin@test.local";
pub const ADMIN_PASSWORD: &str = "adminpass";

/// Hands back a fixed provider payload instead of calling out.
pub struct StaticOAuthClient(pub Value);

#[async_trait]
impl OAuthClient for StaticOAuthClient {
    async fn fetch_profile(
        &self,
        _strategy: &dyn OAuthStrategy,
        _app: &OAuthAppConfig,
        _code: &str,
    ) -> Result<Value, AppError> {
        Ok(self.0.clone())
    }
}

pub fn test_config() -> AppConfig {
    let mut auth = AuthConfig::new(TEST_SECRET);
    auth.admin_email = ADMIN_EMAIL.to_string();
    auth.admin_password = ADMIN_PASSWORD.to_string();

    let mut cfg = AppConfig {
        auth: Some(auth),
        ..Default::default()
    };
    cfg.oauth.github = Some(OAuthAppConfig {
        client_id: "github-client".to_string(),
        client_secret: "github-secret".to_string(),
        callback_url: "http://localhost:3000/api/v1/auth/github/callback".to_string(),
    });
    cfg
}

/// Private in-memory SQLite database with the schema applied. One pooled
/// connection, so every query sees the same database.
pub async fn memory_db() -> DatabaseConnection {
    connection::connect(&DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_idle: 1,
    })
    .await
    .expect("in-memory database should open")
}

pub fn test_state(db: DatabaseConnection, oauth_profile: Value) -> Arc<AppState> {
    let cfg = test_config();
    let mailer = Mailer::spawn(&cfg.mail, Arc::new(LogTransport));
    AppState::new(cfg, db, mailer, Arc::new(StaticOAuthClient(oauth_profile)))
        .expect("test state should build")
}

pub fn test_app(state: Arc<AppState>) -> Router {
    app(state)
}
