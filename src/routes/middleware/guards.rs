use std::{marker::PhantomData, sync::Arc};

use axum::{extract::FromRequestParts, http::header};
use uuid::Uuid;

use crate::{
    auth::{Claims, PermissionRequirement},
    db::entities::user,
    error::AppError,
    services::ServiceContext,
    state::AppState,
};

/// The caller behind a valid bearer token, with the account loaded. Deleted
/// accounts are rejected with 401 and disabled ones with 403.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub claims: Claims,
    pub user: user::Model,
}

// Auth guard: validate the bearer JWT and load its account.
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if let Some(current) = parts.extensions.get::<CurrentUser>().cloned() {
            return Ok(current);
        }

        let auth = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");

        let token = auth
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::unauthorized("Missing/invalid Authorization header"))?;

        let (claims, user) = ServiceContext::from_state(state.as_ref())
            .auth(&state.jwt, &state.auth)
            .authenticate(token)
            .await?;
        let current = CurrentUser { claims, user };
        parts.extensions.insert(current.clone());
        Ok(current)
    }
}

pub type AuthGuard = CurrentUser;

/// Authenticates the caller, then requires `R`'s `(subject, action)` pair.
pub struct Authorized<R: PermissionRequirement> {
    pub claims: Claims,
    pub user_id: Uuid,
    _marker: PhantomData<R>,
}

impl<R> FromRequestParts<Arc<AppState>> for Authorized<R>
where
    R: PermissionRequirement,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser { claims, user } = CurrentUser::from_request_parts(parts, state).await?;

        ServiceContext::from_state(state.as_ref())
            .access()
            .check(&user, R::SUBJECT, R::ACTION)
            .await?;

        Ok(Self {
            claims,
            user_id: user.id,
            _marker: PhantomData,
        })
    }
}
