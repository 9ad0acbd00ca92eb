use chrono::{Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::user_service::{NewUser, UserDetails, UserService};
use crate::{
    auth::{
        Claims, TokenBundle,
        jwt::{JwtKeys, decode_access, encode_token, make_access_claims},
        oauth::NormalizedIdentity,
        password::verify_password,
        refresh,
    },
    config::AuthConfig,
    db::entities::user,
    error::AppError,
};

/// A signed-in user together with freshly issued credentials.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub user: UserDetails,
    #[serde(flatten)]
    pub tokens: TokenBundle,
}

fn invalid_credentials() -> AppError {
    AppError::unauthorized("Invalid credentials")
}

fn invalid_refresh() -> AppError {
    AppError::unauthorized("Invalid refresh token")
}

fn invalid_token() -> AppError {
    AppError::unauthorized("Invalid or expired token")
}

fn ensure_active(user: &user::Model) -> Result<(), AppError> {
    if user.status {
        Ok(())
    } else {
        Err(AppError::forbidden("Account is disabled"))
    }
}

/// Identity resolution for local and federated sign-in, plus token issue,
/// rotation and revocation.
#[derive(Clone)]
pub struct AuthService<'a> {
    users: UserService,
    keys: &'a JwtKeys,
    cfg: &'a AuthConfig,
}

impl<'a> AuthService<'a> {
    pub fn new(users: UserService, keys: &'a JwtKeys, cfg: &'a AuthConfig) -> Self {
        Self { users, keys, cfg }
    }

    pub async fn register(&self, input: NewUser) -> Result<UserDetails, AppError> {
        self.users.create_local(input, None).await
    }

    /// Unknown email, OAuth-only account and wrong password all produce the
    /// same error.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AppError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or_else(invalid_credentials)?;
        let hash = user
            .password_hash
            .as_deref()
            .ok_or_else(invalid_credentials)?;
        if !verify_password(password, hash)? {
            return Err(invalid_credentials());
        }
        ensure_active(&user)?;

        self.users.record_login(user.id).await?;
        tracing::info!(user_id = %user.id, "user logged in");
        self.session_for(user).await
    }

    /// Looks up by provider identity, then by email (linking the provider to
    /// the existing account), and otherwise creates a new account.
    pub async fn oauth_login(&self, identity: NormalizedIdentity) -> Result<AuthSession, AppError> {
        let user = match self.users.find_by_provider_identity(&identity).await? {
            Some(user) => user,
            None => {
                let existing = match identity.email.as_deref() {
                    Some(email) => self.users.find_by_email(email).await?,
                    None => None,
                };
                match existing {
                    Some(user) => self.users.link_identity(user.id, &identity).await?,
                    None => self.users.create_from_oauth(&identity).await?,
                }
            }
        };
        ensure_active(&user)?;

        self.users.record_login(user.id).await?;
        tracing::info!(user_id = %user.id, provider = identity.provider.as_str(), "user logged in through oauth");
        self.session_for(user).await
    }

    /// Rotates the refresh token; the presented one stops working.
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, AppError> {
        let user_id = refresh::owner(refresh_token)?;
        if !self.users.verify_refresh_token(user_id, refresh_token).await? {
            return Err(invalid_refresh());
        }
        let user = self
            .users
            .find_live(user_id)
            .await
            .map_err(|_| invalid_refresh())?;
        ensure_active(&user)?;
        self.session_for(user).await
    }

    pub async fn logout(&self, user_id: Uuid) -> Result<(), AppError> {
        self.users.clear_refresh_token(user_id).await?;
        tracing::info!(%user_id, "user logged out");
        Ok(())
    }

    pub fn verify(&self, access_token: &str) -> Result<Claims, AppError> {
        decode_access(self.keys, access_token)
    }

    /// Verifies the access token and loads its account. A token whose account
    /// is gone fails as unauthenticated; a disabled account fails as at login.
    pub async fn authenticate(&self, access_token: &str) -> Result<(Claims, user::Model), AppError> {
        let claims = self.verify(access_token)?;
        let user_id = claims.user_id().ok_or_else(invalid_token)?;
        let user = self.users.find_live(user_id).await.map_err(|err| match err {
            AppError::NotFound(_) => invalid_token(),
            other => other,
        })?;
        ensure_active(&user)?;
        Ok((claims, user))
    }

    pub async fn issue_tokens(&self, user: &user::Model) -> Result<TokenBundle, AppError> {
        let access_ttl = self.cfg.access_ttl_secs as usize;
        let claims = make_access_claims(user, access_ttl);
        let access_token = encode_token(self.keys, &claims)?;

        let refresh_ttl = i64::try_from(self.cfg.refresh_ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| AppError::internal("Invalid refresh token lifetime"))?;
        let issued = refresh::issue(user.id)?;
        self.users
            .set_refresh_token(user.id, issued.hash, Utc::now().fixed_offset() + refresh_ttl)
            .await?;

        Ok(TokenBundle {
            access_token,
            refresh_token: issued.token,
            token_type: "Bearer",
            expires_in: access_ttl,
        })
    }

    async fn session_for(&self, user: user::Model) -> Result<AuthSession, AppError> {
        let tokens = self.issue_tokens(&user).await?;
        let user = self.users.details_for(user).await?;
        Ok(AuthSession { user, tokens })
    }
}
