//! Opaque refresh tokens of the form `<user-id>.<64 hex chars>`.
//!
//! The user id prefix lets the server find the owning row without storing the
//! token itself; only an Argon2 hash of the whole token is persisted.

use rand::RngCore;
use uuid::Uuid;

use super::password::{hash_password, verify_password};
use crate::error::AppError;

const SECRET_BYTES: usize = 32;

pub struct IssuedRefreshToken {
    pub token: String,
    pub hash: String,
}

pub fn issue(user_id: Uuid) -> Result<IssuedRefreshToken, AppError> {
    let mut secret = [0u8; SECRET_BYTES];
    rand::thread_rng().fill_bytes(&mut secret);
    let token = format!("{user_id}.{}", hex::encode(secret));
    let hash = hash_password(&token)?;
    Ok(IssuedRefreshToken { token, hash })
}

/// Returns the user id a presented token claims to belong to.
pub fn owner(token: &str) -> Result<Uuid, AppError> {
    let invalid = || AppError::unauthorized("Invalid refresh token");
    let (user_id, secret) = token.trim().split_once('.').ok_or_else(invalid)?;
    if secret.len() != SECRET_BYTES * 2 || hex::decode(secret).is_err() {
        return Err(invalid());
    }
    user_id.parse().map_err(|_| invalid())
}

pub fn matches(token: &str, stored_hash: Option<&str>) -> Result<bool, AppError> {
    match stored_hash {
        Some(hash) => verify_password(token.trim(), hash),
        None => Ok(false),
    }
}
