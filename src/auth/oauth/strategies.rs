use serde_json::Value;

use super::{NormalizedIdentity, OAuthProviderId};
use crate::error::AppError;

pub trait OAuthStrategy: Send + Sync {
    fn id(&self) -> OAuthProviderId;
    fn authorize_endpoint(&self) -> &'static str;
    fn token_endpoint(&self) -> &'static str;
    fn profile_endpoint(&self) -> &'static str;
    fn scopes(&self) -> &'static [&'static str];

    /// Maps the provider's profile payload onto the shared identity shape.
    fn validate_callback(&self, payload: &Value) -> Result<NormalizedIdentity, AppError>;
}

fn text(payload: &Value, pointer: &str) -> Option<String> {
    match payload.pointer(pointer)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn lowered(email: Option<String>) -> Option<String> {
    email.map(|email| email.to_lowercase())
}

fn identity(
    provider: OAuthProviderId,
    provider_id: Option<String>,
    email: Option<String>,
    name: Option<String>,
    avatar_url: Option<String>,
) -> Result<NormalizedIdentity, AppError> {
    let provider_id = provider_id.ok_or_else(|| {
        AppError::bad_request(format!(
            "Invalid {} profile: missing account id",
            provider.as_str()
        ))
    })?;
    Ok(NormalizedIdentity {
        provider,
        provider_id,
        email: lowered(email),
        name,
        avatar_url,
    })
}

pub struct GoogleStrategy;

impl OAuthStrategy for GoogleStrategy {
    fn id(&self) -> OAuthProviderId {
        OAuthProviderId::Google
    }

    fn authorize_endpoint(&self) -> &'static str {
        "https://accounts.google.com/o/oauth2/v2/auth"
    }

    fn token_endpoint(&self) -> &'static str {
        "https://oauth2.googleapis.com/token"
    }

    fn profile_endpoint(&self) -> &'static str {
        "https://openidconnect.googleapis.com/v1/userinfo"
    }

    fn scopes(&self) -> &'static [&'static str] {
        &["openid", "email", "profile"]
    }

    fn validate_callback(&self, payload: &Value) -> Result<NormalizedIdentity, AppError> {
        identity(
            self.id(),
            text(payload, "/sub").or_else(|| text(payload, "/id")),
            text(payload, "/email"),
            text(payload, "/name"),
            text(payload, "/picture"),
        )
    }
}

pub struct GithubStrategy;

impl GithubStrategy {
    /// Prefers a verified address from the `emails` list, then the first one,
    /// then the public profile email.
    fn email(payload: &Value) -> Option<String> {
        let emails = payload.get("emails").and_then(Value::as_array);
        let listed = emails.and_then(|emails| {
            emails
                .iter()
                .find(|entry| entry.get("verified").and_then(Value::as_bool) == Some(true))
                .or_else(|| emails.first())
                .and_then(|entry| text(entry, "/email"))
        });
        listed.or_else(|| text(payload, "/email"))
    }
}

impl OAuthStrategy for GithubStrategy {
    fn id(&self) -> OAuthProviderId {
        OAuthProviderId::Github
    }

    fn authorize_endpoint(&self) -> &'static str {
        "https://github.com/login/oauth/authorize"
    }

    fn token_endpoint(&self) -> &'static str {
        "https://github.com/login/oauth/access_token"
    }

    fn profile_endpoint(&self) -> &'static str {
        "https://api.github.com/user"
    }

    fn scopes(&self) -> &'static [&'static str] {
        &["user:email"]
    }

    fn validate_callback(&self, payload: &Value) -> Result<NormalizedIdentity, AppError> {
        identity(
            self.id(),
            text(payload, "/id"),
            Self::email(payload),
            text(payload, "/name").or_else(|| text(payload, "/login")),
            text(payload, "/avatar_url"),
        )
    }
}

pub struct FacebookStrategy;

impl OAuthStrategy for FacebookStrategy {
    fn id(&self) -> OAuthProviderId {
        OAuthProviderId::Facebook
    }

    fn authorize_endpoint(&self) -> &'static str {
        "https://www.facebook.com/v19.0/dialog/oauth"
    }

    fn token_endpoint(&self) -> &'static str {
        "https://graph.facebook.com/v19.0/oauth/access_token"
    }

    fn profile_endpoint(&self) -> &'static str {
        "https://graph.facebook.com/me?fields=id,name,email,picture"
    }

    fn scopes(&self) -> &'static [&'static str] {
        &["email", "public_profile"]
    }

    fn validate_callback(&self, payload: &Value) -> Result<NormalizedIdentity, AppError> {
        identity(
            self.id(),
            text(payload, "/id"),
            text(payload, "/email"),
            text(payload, "/name"),
            text(payload, "/picture/data/url"),
        )
    }
}

pub struct TwitterStrategy;

impl OAuthStrategy for TwitterStrategy {
    fn id(&self) -> OAuthProviderId {
        OAuthProviderId::Twitter
    }

    fn authorize_endpoint(&self) -> &'static str {
        "https://twitter.com/i/oauth2/authorize"
    }

    fn token_endpoint(&self) -> &'static str {
        "https://api.twitter.com/2/oauth2/token"
    }

    fn profile_endpoint(&self) -> &'static str {
        "https://api.twitter.com/2/users/me?user.fields=profile_image_url"
    }

    fn scopes(&self) -> &'static [&'static str] {
        &["tweet.read", "users.read", "offline.access"]
    }

    // Twitter nests the profile under `data` and rarely returns an email.
    fn validate_callback(&self, payload: &Value) -> Result<NormalizedIdentity, AppError> {
        let profile = payload.get("data").unwrap_or(payload);
        identity(
            self.id(),
            text(profile, "/id"),
            text(profile, "/email"),
            text(profile, "/name").or_else(|| text(profile, "/username")),
            text(profile, "/profile_image_url"),
        )
    }
}

pub struct LinkedinStrategy;

impl OAuthStrategy for LinkedinStrategy {
    fn id(&self) -> OAuthProviderId {
        OAuthProviderId::Linkedin
    }

    fn authorize_endpoint(&self) -> &'static str {
        "https://www.linkedin.com/oauth/v2/authorization"
    }

    fn token_endpoint(&self) -> &'static str {
        "https://www.linkedin.com/oauth/v2/accessToken"
    }

    fn profile_endpoint(&self) -> &'static str {
        "https://api.linkedin.com/v2/userinfo"
    }

    fn scopes(&self) -> &'static [&'static str] {
        &["openid", "profile", "email"]
    }

    fn validate_callback(&self, payload: &Value) -> Result<NormalizedIdentity, AppError> {
        identity(
            self.id(),
            text(payload, "/sub"),
            text(payload, "/email"),
            text(payload, "/name"),
            text(payload, "/picture"),
        )
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn google_profile_is_normalized_and_email_lowercased() {
        let identity = GoogleStrategy
            .validate_callback(&json!({
                "sub": "1098",
                "email": "Alice@Gmail.COM",
                "name": "Alice",
                "picture": "https://img/alice.png"
            }))
            .expect("profile should normalize");

        assert_eq!(identity.provider, OAuthProviderId::Google);
        assert_eq!(identity.provider_id, "1098");
        assert_eq!(identity.email.as_deref(), Some("alice@gmail.com"));
        assert_eq!(identity.avatar_url.as_deref(), Some("https://img/alice.png"));
    }

    #[test]
    fn github_prefers_verified_email_and_falls_back_to_login() {
        let identity = GithubStrategy
            .validate_callback(&json!({
                "id": 42,
                "login": "octo",
                "name": null,
                "emails": [
                    {"email": "old@x.com", "verified": false},
                    {"email": "Octo@X.com", "verified": true}
                ]
            }))
            .expect("profile should normalize");

        assert_eq!(identity.provider_id, "42");
        assert_eq!(identity.email.as_deref(), Some("octo@x.com"));
        assert_eq!(identity.name.as_deref(), Some("octo"));
    }

    #[test]
    fn facebook_reads_nested_picture() {
        let identity = FacebookStrategy
            .validate_callback(&json!({
                "id": "77",
                "name": "Bob",
                "picture": {"data": {"url": "https://fb/pic"}}
            }))
            .expect("profile should normalize");

        assert_eq!(identity.avatar_url.as_deref(), Some("https://fb/pic"));
        assert_eq!(identity.email, None);
    }

    #[test]
    fn twitter_profile_without_email_is_accepted() {
        let identity = TwitterStrategy
            .validate_callback(&json!({"data": {"id": "9", "username": "tw"}}))
            .expect("profile should normalize");

        assert_eq!(identity.provider_id, "9");
        assert_eq!(identity.email, None);
        assert_eq!(identity.name.as_deref(), Some("tw"));
    }

    #[test]
    fn missing_account_id_is_rejected() {
        let err = LinkedinStrategy
            .validate_callback(&json!({"email": "a@b.com"}))
            .expect_err("id is required");
        assert_eq!(err.message(), "Invalid linkedin profile: missing account id");
    }
}
