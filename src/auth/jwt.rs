use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use super::Claims;
use crate::{db::entities::user, error::AppError};

#[derive(Clone)]
pub struct JwtKeys {
    pub enc: EncodingKey,
    pub dec: DecodingKey,
}

impl JwtKeys {
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            enc: EncodingKey::from_secret(secret),
            dec: DecodingKey::from_secret(secret),
        }
    }
}

pub fn now_unix() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as usize)
        .unwrap_or_default()
}

pub fn encode_token(keys: &JwtKeys, claims: &Claims) -> Result<String, AppError> {
    let mut header = Header::new(Algorithm::HS256);
    header.typ = Some("JWT".into());

    encode(&header, claims, &keys.enc).map_err(|err| {
        tracing::error!(error = %err, "token encoding failed");
        AppError::internal("Token encoding failed")
    })
}

pub fn make_access_claims(user: &user::Model, ttl_secs: usize) -> Claims {
    let iat = now_unix();
    Claims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        name: user.name.clone(),
        iat,
        exp: iat + ttl_secs,
    }
}

/// Signature and expiry are both checked; any failure is a 401.
pub fn decode_access(keys: &JwtKeys, token: &str) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.leeway = 0;

    Ok(decode::<Claims>(token, &keys.dec, &validation)?.claims)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::{JwtKeys, decode_access, encode_token, make_access_claims, now_unix};
    use crate::{auth::Claims, db::entities::user, error::AppError};

    fn alice() -> user::Model {
        let now = Utc::now().fixed_offset();
        user::Model {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            name: "Alice".to_string(),
            email: "alice@x.com".to_string(),
            password_hash: None,
            email_verified_at: Some(now),
            status: true,
            image: None,
            provider: None,
            provider_id: None,
            refresh_token_hash: None,
            refresh_expires_at: None,
            last_login_at: None,
            created_by: None,
            updated_by: None,
            deleted_at: None,
        }
    }

    #[test]
    fn claims_carry_identity_and_ttl() {
        let user = alice();
        let claims = make_access_claims(&user, 60);

        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.email, "alice@x.com");
        assert_eq!(claims.name, "Alice");
        assert_eq!(claims.exp.saturating_sub(claims.iat), 60);
    }

    #[test]
    fn token_round_trips_with_same_secret() {
        let keys = JwtKeys::from_secret(b"unit-test-secret");
        let claims = make_access_claims(&alice(), 600);
        let token = encode_token(&keys, &claims).expect("token should encode");

        let decoded = decode_access(&keys, &token).expect("token should decode");
        assert_eq!(decoded, claims);
    }

    #[test]
    fn wrong_secret_is_unauthorized() {
        let claims = make_access_claims(&alice(), 600);
        let token = encode_token(&JwtKeys::from_secret(b"one"), &claims).expect("encode");

        let err = decode_access(&JwtKeys::from_secret(b"two"), &token).expect_err("must fail");
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn expired_token_is_unauthorized() {
        let keys = JwtKeys::from_secret(b"unit-test-secret");
        let now = now_unix();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            email: "alice@x.com".to_string(),
            name: "Alice".to_string(),
            iat: now - 120,
            exp: now - 60,
        };
        let token = encode_token(&keys, &claims).expect("encode");

        let err = decode_access(&keys, &token).expect_err("expired token must fail");
        assert_eq!(err.message(), "Invalid or expired token");
    }
}
