use std::sync::Arc;

use axum::{Router, extract::State, http::StatusCode, routing::post};
use serde::{Deserialize, Serialize};

use crate::{
    response::{ApiResult, JsonApiResponse},
    services::{
        ServiceContext,
        auth_service::AuthSession,
        password_reset_service::{IssuedReset, ResetMode},
        user_service::{NewUser, UserDetails, UserView},
    },
    state::AppState,
    validation::{
        MAX_PASSWORD_LEN, MIN_PASSWORD_LEN, Validate, ValidatedJson, Validator, email, max_len,
        min_len, one_of, passwords_match, required, url,
    },
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    #[serde(default)]
    pub image: Option<String>,
}

impl Validate for RegisterRequest {
    fn validate(&self, v: &mut Validator) {
        v.check("name", required("name", &self.name))
            .check("email", required("email", &self.email))
            .check("email", email("email", &self.email))
            .check("password", required("password", &self.password))
            .check("password", min_len("password", &self.password, MIN_PASSWORD_LEN))
            .check("confirmPassword", required("confirmPassword", &self.confirm_password))
            .check("confirmPassword", passwords_match(&self.password, &self.confirm_password));
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self, v: &mut Validator) {
        v.check("email", required("email", &self.email))
            .check("email", email("email", &self.email))
            .check("password", required("password", &self.password));
    }
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

impl Validate for RefreshRequest {
    fn validate(&self, v: &mut Validator) {
        v.check("refresh_token", required("refresh_token", &self.refresh_token));
    }
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
    pub url_or_otp: String,
    #[serde(default)]
    pub redirect_url: Option<String>,
}

impl Validate for ForgotPasswordRequest {
    fn validate(&self, v: &mut Validator) {
        v.check("email", required("email", &self.email))
            .check("email", email("email", &self.email))
            .check("url_or_otp", required("url_or_otp", &self.url_or_otp))
            .check(
                "url_or_otp",
                one_of("url_or_otp", &self.url_or_otp.trim().to_ascii_lowercase(), &["url", "otp"]),
            );
        if let Some(redirect) = self.redirect_url.as_deref().filter(|r| !r.trim().is_empty()) {
            v.check("redirect_url", url("redirect_url", redirect));
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct VerifyTokenRequest {
    pub token: String,
}

impl Validate for VerifyTokenRequest {
    fn validate(&self, v: &mut Validator) {
        v.check("token", required("token", &self.token));
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl Validate for ResetPasswordRequest {
    fn validate(&self, v: &mut Validator) {
        v.check("email", required("email", &self.email))
            .check("email", email("email", &self.email))
            .check("password", required("password", &self.password))
            .check("password", min_len("password", &self.password, MIN_PASSWORD_LEN))
            .check("password", max_len("password", &self.password, MAX_PASSWORD_LEN))
            .check("password", passwords_match(&self.password, &self.confirm_password))
            .check("confirmPassword", required("confirmPassword", &self.confirm_password))
            .check(
                "confirmPassword",
                min_len("confirmPassword", &self.confirm_password, MIN_PASSWORD_LEN),
            )
            .check(
                "confirmPassword",
                max_len("confirmPassword", &self.confirm_password, MAX_PASSWORD_LEN),
            );
    }
}

#[derive(Debug, Serialize)]
pub struct VerifiedToken {
    pub email: String,
    pub token: String,
    pub url_or_otp: String,
    pub expires_at: chrono::DateTime<chrono::FixedOffset>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/password/forgot", post(forgot_password))
        .route("/auth/password/verify", post(verify_token))
        .route("/auth/password/reset", post(reset_password))
        .with_state(state)
}

async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<RegisterRequest>,
) -> ApiResult<UserDetails> {
    let services = ServiceContext::from_state(state.as_ref());
    let user = services
        .auth(&state.jwt, &state.auth)
        .register(NewUser {
            name: body.name,
            email: body.email,
            password: Some(body.password),
            image: body.image,
            status: true,
            role_id: None,
        })
        .await?;
    JsonApiResponse::with_status(StatusCode::CREATED, "User registered successfully", user)
}

async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<LoginRequest>,
) -> ApiResult<AuthSession> {
    let services = ServiceContext::from_state(state.as_ref());
    let session = services
        .auth(&state.jwt, &state.auth)
        .login(&body.email, &body.password)
        .await?;
    JsonApiResponse::with_status(StatusCode::OK, "Login successful", session)
}

async fn refresh(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<RefreshRequest>,
) -> ApiResult<AuthSession> {
    let services = ServiceContext::from_state(state.as_ref());
    let session = services
        .auth(&state.jwt, &state.auth)
        .refresh(&body.refresh_token)
        .await?;
    JsonApiResponse::with_status(StatusCode::OK, "Token refreshed successfully", session)
}

async fn forgot_password(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<ForgotPasswordRequest>,
) -> ApiResult<IssuedReset> {
    let mode: ResetMode = body.url_or_otp.parse()?;
    let issued = ServiceContext::from_state(state.as_ref())
        .password_reset()
        .issue(&body.email, mode, body.redirect_url)
        .await?;
    JsonApiResponse::with_status(StatusCode::OK, "Password reset token sent", issued)
}

async fn verify_token(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<VerifyTokenRequest>,
) -> ApiResult<VerifiedToken> {
    let record = ServiceContext::from_state(state.as_ref())
        .password_reset()
        .verify(&body.token)
        .await?;
    JsonApiResponse::with_status(
        StatusCode::OK,
        "Token verified successfully",
        VerifiedToken {
            email: record.email,
            token: record.token,
            url_or_otp: record.mode,
            expires_at: record.expires_at,
        },
    )
}

async fn reset_password(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<ResetPasswordRequest>,
) -> ApiResult<UserView> {
    let user = ServiceContext::from_state(state.as_ref())
        .password_reset()
        .consume(&body.email, &body.password)
        .await?;
    JsonApiResponse::with_status(StatusCode::OK, "Password reset successfully", UserView::from(&user))
}
