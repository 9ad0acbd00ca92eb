use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::OAuthStrategy;
use crate::{config::OAuthAppConfig, error::AppError};

/// Trades an authorization code for the provider's raw profile payload.
#[async_trait]
pub trait OAuthClient: Send + Sync {
    async fn fetch_profile(
        &self,
        strategy: &dyn OAuthStrategy,
        app: &OAuthAppConfig,
        code: &str,
    ) -> Result<Value, AppError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Clone)]
pub struct ReqwestOAuthClient {
    http: reqwest::Client,
}

impl ReqwestOAuthClient {
    pub fn new(app_name: &str) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .user_agent(app_name.to_string())
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|err| {
                tracing::error!(error = %err, "failed to build oauth http client");
                AppError::internal("OAuth client unavailable")
            })?;
        Ok(Self { http })
    }
}

fn upstream(provider: &str, err: reqwest::Error) -> AppError {
    tracing::warn!(provider, error = %err, "oauth provider request failed");
    AppError::unauthorized(format!("{provider} authentication failed"))
}

#[async_trait]
impl OAuthClient for ReqwestOAuthClient {
    async fn fetch_profile(
        &self,
        strategy: &dyn OAuthStrategy,
        app: &OAuthAppConfig,
        code: &str,
    ) -> Result<Value, AppError> {
        let provider = strategy.id().as_str();
        let token: TokenResponse = self
            .http
            .post(strategy.token_endpoint())
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", app.client_id.as_str()),
                ("client_secret", app.client_secret.as_str()),
                ("redirect_uri", app.callback_url.as_str()),
            ])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| upstream(provider, err))?
            .json()
            .await
            .map_err(|err| upstream(provider, err))?;

        self.http
            .get(strategy.profile_endpoint())
            .bearer_auth(&token.access_token)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| upstream(provider, err))?
            .json::<Value>()
            .await
            .map_err(|err| upstream(provider, err))
    }
}
