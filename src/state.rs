use std::sync::Arc;

use anyhow::Context;
use sea_orm::DatabaseConnection;

use crate::{
    auth::{
        jwt::JwtKeys,
        oauth::{OAuthClient, OAuthProviders},
    },
    config::{AppConfig, AuthConfig},
    mail::Mailer,
};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub auth: AuthConfig,
    pub db: DatabaseConnection,
    pub jwt: JwtKeys,
    pub oauth: OAuthProviders,
    pub oauth_client: Arc<dyn OAuthClient>,
    pub mailer: Mailer,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        db: DatabaseConnection,
        mailer: Mailer,
        oauth_client: Arc<dyn OAuthClient>,
    ) -> anyhow::Result<Arc<Self>> {
        let auth = config.auth.clone().context("auth config is required")?;
        let jwt = JwtKeys::from_secret(auth.jwt_secret.as_bytes());
        let oauth = OAuthProviders::from_config(&config.oauth).context("registering oauth providers")?;
        tracing::info!(
            providers = ?oauth.configured().iter().map(|id| id.as_str()).collect::<Vec<_>>(),
            "oauth providers registered"
        );

        Ok(Arc::new(Self {
            config,
            auth,
            db,
            jwt,
            oauth,
            oauth_client,
            mailer,
        }))
    }
}
