//! Social login. Each provider is an [`OAuthStrategy`] that turns the raw
//! profile payload into a [`NormalizedIdentity`]; the HTTP exchange with the
//! provider sits behind [`OAuthClient`].

mod client;
mod registry;
pub mod state;
mod strategies;

use serde::{Deserialize, Serialize};

pub use client::{OAuthClient, ReqwestOAuthClient};
pub use registry::OAuthProviders;
pub use strategies::{
    FacebookStrategy, GithubStrategy, GoogleStrategy, LinkedinStrategy, OAuthStrategy,
    TwitterStrategy,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OAuthProviderId {
    Google,
    Github,
    Facebook,
    Twitter,
    Linkedin,
}

impl OAuthProviderId {
    pub const ALL: [OAuthProviderId; 5] = [
        OAuthProviderId::Google,
        OAuthProviderId::Github,
        OAuthProviderId::Facebook,
        OAuthProviderId::Twitter,
        OAuthProviderId::Linkedin,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OAuthProviderId::Google => "google",
            OAuthProviderId::Github => "github",
            OAuthProviderId::Facebook => "facebook",
            OAuthProviderId::Twitter => "twitter",
            OAuthProviderId::Linkedin => "linkedin",
        }
    }
}

impl std::str::FromStr for OAuthProviderId {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == raw.to_ascii_lowercase())
            .ok_or_else(|| format!("unsupported oauth provider: {raw}"))
    }
}

/// The only shape identity resolution sees from a social login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedIdentity {
    pub provider: OAuthProviderId,
    pub provider_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}
