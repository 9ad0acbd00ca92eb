use std::{collections::HashMap, sync::Arc};

use reqwest::Url;

use super::{
    FacebookStrategy, GithubStrategy, GoogleStrategy, LinkedinStrategy, OAuthProviderId,
    OAuthStrategy, TwitterStrategy,
};
use crate::{
    config::{OAuthAppConfig, OAuthConfig},
    error::AppError,
};

#[derive(Clone)]
struct Registered {
    strategy: Arc<dyn OAuthStrategy>,
    app: OAuthAppConfig,
}

/// Strategies for the providers that have credentials configured.
#[derive(Clone, Default)]
pub struct OAuthProviders {
    providers: HashMap<OAuthProviderId, Registered>,
}

impl OAuthProviders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(cfg: &OAuthConfig) -> Result<Self, AppError> {
        let mut providers = Self::new();
        for id in OAuthProviderId::ALL {
            if let Some(app) = cfg.app(id) {
                providers.add(default_strategy(id), app.clone())?;
            }
        }
        Ok(providers)
    }

    pub fn add(
        &mut self,
        strategy: Arc<dyn OAuthStrategy>,
        app: OAuthAppConfig,
    ) -> Result<(), AppError> {
        let id = strategy.id();
        if self.providers.contains_key(&id) {
            return Err(AppError::conflict(format!(
                "OAuth provider already registered: {}",
                id.as_str()
            )));
        }
        self.providers.insert(id, Registered { strategy, app });
        Ok(())
    }

    pub fn get(&self, id: OAuthProviderId) -> Result<(&dyn OAuthStrategy, &OAuthAppConfig), AppError> {
        self.providers
            .get(&id)
            .map(|registered| (registered.strategy.as_ref(), &registered.app))
            .ok_or_else(|| {
                AppError::not_found(format!("OAuth provider not configured: {}", id.as_str()))
            })
    }

    pub fn configured(&self) -> Vec<OAuthProviderId> {
        let mut ids: Vec<_> = self.providers.keys().copied().collect();
        ids.sort_by_key(|id| id.as_str());
        ids
    }

    pub fn authorize_url(&self, id: OAuthProviderId, state: &str) -> Result<Url, AppError> {
        let (strategy, app) = self.get(id)?;
        let scope = strategy.scopes().join(" ");
        Url::parse_with_params(
            strategy.authorize_endpoint(),
            [
                ("client_id", app.client_id.as_str()),
                ("redirect_uri", app.callback_url.as_str()),
                ("response_type", "code"),
                ("scope", scope.as_str()),
                ("state", state),
            ],
        )
        .map_err(|err| {
            tracing::error!(provider = id.as_str(), error = %err, "bad authorize endpoint");
            AppError::internal("OAuth authorize url could not be built")
        })
    }
}

fn default_strategy(id: OAuthProviderId) -> Arc<dyn OAuthStrategy> {
    match id {
        OAuthProviderId::Google => Arc::new(GoogleStrategy),
        OAuthProviderId::Github => Arc::new(GithubStrategy),
        OAuthProviderId::Facebook => Arc::new(FacebookStrategy),
        OAuthProviderId::Twitter => Arc::new(TwitterStrategy),
        OAuthProviderId::Linkedin => Arc::new(LinkedinStrategy),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::OAuthProviders;
    use crate::{
        auth::oauth::{GithubStrategy, OAuthProviderId},
        config::{OAuthAppConfig, OAuthConfig},
    };

    fn app() -> OAuthAppConfig {
        OAuthAppConfig {
            client_id: "client-1".to_string(),
            client_secret: "shh".to_string(),
            callback_url: "http://localhost:3000/api/v1/auth/github/callback".to_string(),
        }
    }

    #[test]
    fn only_configured_providers_are_registered() {
        let providers = OAuthProviders::from_config(&OAuthConfig {
            github: Some(app()),
            ..Default::default()
        })
        .expect("registry should build");

        assert_eq!(providers.configured(), vec![OAuthProviderId::Github]);
        let err = match providers.get(OAuthProviderId::Google) {
            Ok(_) => panic!("google is not configured"),
            Err(err) => err,
        };
        assert_eq!(err.message(), "OAuth provider not configured: google");
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut providers = OAuthProviders::new();
        providers
            .add(Arc::new(GithubStrategy), app())
            .expect("first registration should succeed");

        let err = providers
            .add(Arc::new(GithubStrategy), app())
            .expect_err("duplicate registration should fail");
        assert_eq!(err.message(), "OAuth provider already registered: github");
    }

    #[test]
    fn authorize_url_carries_client_redirect_and_state() {
        let mut providers = OAuthProviders::new();
        providers
            .add(Arc::new(GithubStrategy), app())
            .expect("registration should succeed");

        let url = providers
            .authorize_url(OAuthProviderId::Github, "abc123")
            .expect("url should build");
        let query: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert_eq!(url.host_str(), Some("github.com"));
        assert!(query.contains(&("client_id".to_string(), "client-1".to_string())));
        assert!(query.contains(&("state".to_string(), "abc123".to_string())));
        assert!(query.contains(&("scope".to_string(), "user:email".to_string())));
        assert!(!url.as_str().contains("shh"));
    }
}
