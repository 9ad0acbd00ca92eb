use std::str::FromStr;

use chrono::{Duration, Utc};
use rand::{Rng, RngCore};
use sea_orm::Set;
use serde::Serialize;

use super::context::{ServiceContext, commit};
use crate::{
    db::dao::DaoBase,
    db::entities::{password_reset_token, user},
    error::AppError,
    validation::normalize_email,
};

pub const RESET_TOKEN_TTL_MINUTES: i64 = 10;
const URL_TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetMode {
    Otp,
    Url,
}

impl ResetMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ResetMode::Otp => "otp",
            ResetMode::Url => "url",
        }
    }

    /// A 6 digit code, or 256 random bits as hex.
    fn generate(self) -> String {
        let mut rng = rand::thread_rng();
        match self {
            ResetMode::Otp => rng.gen_range(100_000..=999_999u32).to_string(),
            ResetMode::Url => {
                let mut bytes = [0u8; URL_TOKEN_BYTES];
                rng.fill_bytes(&mut bytes);
                hex::encode(bytes)
            }
        }
    }
}

impl FromStr for ResetMode {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "otp" => Ok(ResetMode::Otp),
            "url" => Ok(ResetMode::Url),
            _ => Err(AppError::field(
                "url_or_otp",
                "url_or_otp must be one of the following values: url, otp",
            )),
        }
    }
}

/// What the forgot-password endpoint hands back to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedReset {
    pub email: String,
    pub name: String,
    pub token: String,
    pub url_or_otp: String,
    pub reset_link: String,
    pub expires_at: chrono::DateTime<chrono::FixedOffset>,
}

#[derive(Clone)]
pub struct PasswordResetService {
    services: ServiceContext,
}

impl PasswordResetService {
    pub fn new(services: ServiceContext) -> Self {
        Self { services }
    }

    /// Replaces any outstanding token for the user or email, then queues the
    /// reset mail. A mail failure does not undo the new token.
    pub async fn issue(
        &self,
        email: &str,
        mode: ResetMode,
        redirect_url: Option<String>,
    ) -> Result<IssuedReset, AppError> {
        let daos = self.services.daos();
        let email = normalize_email(email);
        let user = daos
            .user()
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        let model = password_reset_token::ActiveModel {
            user_id: Set(Some(user.id)),
            email: Set(user.email.clone()),
            token: Set(mode.generate()),
            mode: Set(mode.as_str().to_string()),
            expires_at: Set((Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES)).fixed_offset()),
            redirect_url: Set(redirect_url.clone()),
            ..Default::default()
        };

        let txn = self.services.begin().await?;
        let replaced = daos
            .password_reset()
            .delete_for_on(&txn, user.id, &user.email)
            .await?;
        let token = daos.password_reset().create_on(&txn, model).await?;
        commit(txn).await?;
        tracing::info!(user_id = %user.id, mode = mode.as_str(), replaced, "password reset issued");

        let reset_link = self.reset_link(&token, redirect_url.as_deref())?;
        self.services
            .mail()
            .password_reset(&user, &token, &reset_link, RESET_TOKEN_TTL_MINUTES)
            .await;

        Ok(IssuedReset {
            email: token.email,
            name: user.name,
            token: token.token,
            url_or_otp: token.mode,
            reset_link,
            expires_at: token.expires_at,
        })
    }

    /// Checks the token without consuming it. Expiry is evaluated here; stale
    /// rows are only removed by the next issue or reset.
    pub async fn verify(&self, token: &str) -> Result<password_reset_token::Model, AppError> {
        let record = self
            .services
            .daos()
            .password_reset()
            .find_by_token(token.trim())
            .await?
            .ok_or_else(|| AppError::bad_request("Invalid token"))?;

        if Utc::now().fixed_offset() > record.expires_at {
            return Err(AppError::bad_request("Token expired"));
        }
        Ok(record)
    }

    /// Drops every token for the email and stores the new password. The
    /// caller must have verified a token first.
    pub async fn consume(&self, email: &str, password: &str) -> Result<user::Model, AppError> {
        let email = normalize_email(email);
        let daos = self.services.daos();

        let txn = self.services.begin().await?;
        daos.password_reset().delete_by_email_on(&txn, &email).await?;
        let user = self
            .services
            .user()
            .update_password_on(&txn, &email, password)
            .await?;
        commit(txn).await?;
        tracing::info!(user_id = %user.id, "password reset completed");
        Ok(user)
    }

    fn reset_link(
        &self,
        token: &password_reset_token::Model,
        redirect_url: Option<&str>,
    ) -> Result<String, AppError> {
        let base = match redirect_url.map(str::trim).filter(|url| !url.is_empty()) {
            Some(url) => url.to_string(),
            None => format!("{}/password/reset", self.services.mail().frontend_url()),
        };
        let link = reqwest::Url::parse_with_params(
            &base,
            &[("token", token.token.as_str()), ("email", token.email.as_str())],
        )
        .map_err(|_| AppError::field("redirect_url", "redirect_url must be a URL address"))?;
        Ok(link.to_string())
    }
}
