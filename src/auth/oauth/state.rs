//! Binds an authorization-code callback to the browser that started it. The
//! provider redirect carries a random nonce as `state`; the same nonce rides
//! back in a signed, short-lived cookie and the two must agree.

use jsonwebtoken::{Algorithm, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::OAuthProviderId;
use crate::{
    auth::jwt::{JwtKeys, now_unix},
    error::AppError,
};

pub const STATE_COOKIE: &str = "oauth_state";
pub const STATE_TTL_SECS: usize = 600;

#[derive(Debug, Serialize, Deserialize)]
struct StateClaims {
    provider: OAuthProviderId,
    nonce: String,
    exp: usize,
}

/// `nonce` goes into the authorize URL, `cookie` into `Set-Cookie`.
#[derive(Debug, Clone)]
pub struct IssuedState {
    pub nonce: String,
    pub cookie: String,
}

fn invalid_state() -> AppError {
    AppError::unauthorized("Invalid OAuth state")
}

pub fn issue(
    keys: &JwtKeys,
    provider: OAuthProviderId,
    secure: bool,
) -> Result<IssuedState, AppError> {
    let nonce = Uuid::new_v4().simple().to_string();
    let claims = StateClaims {
        provider,
        nonce: nonce.clone(),
        exp: now_unix() + STATE_TTL_SECS,
    };
    let signed = encode(&Header::new(Algorithm::HS256), &claims, &keys.enc).map_err(|err| {
        tracing::error!(error = %err, "oauth state encoding failed");
        AppError::internal("OAuth state could not be created")
    })?;

    Ok(IssuedState {
        nonce,
        cookie: cookie(&signed, STATE_TTL_SECS, secure),
    })
}

/// Checks the `state` query value against the signed cookie from the
/// `Cookie` header.
pub fn verify(
    keys: &JwtKeys,
    provider: OAuthProviderId,
    cookie_header: Option<&str>,
    state: Option<&str>,
) -> Result<(), AppError> {
    let state = state.filter(|s| !s.is_empty()).ok_or_else(invalid_state)?;
    let signed = cookie_header
        .and_then(|header| read_cookie(header, STATE_COOKIE))
        .ok_or_else(invalid_state)?;

    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    let claims = decode::<StateClaims>(signed, &keys.dec, &validation)
        .map_err(|_| invalid_state())?
        .claims;

    if claims.provider != provider || claims.nonce != state {
        return Err(invalid_state());
    }
    Ok(())
}

/// Expires the state cookie once the callback has used it.
pub fn clear_cookie() -> String {
    cookie("", 0, false)
}

fn cookie(value: &str, max_age: usize, secure: bool) -> String {
    let mut cookie =
        format!("{STATE_COOKIE}={value}; Path=/; Max-Age={max_age}; HttpOnly; SameSite=Lax");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

fn read_cookie<'h>(header: &'h str, name: &str) -> Option<&'h str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}
