use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};

use crate::{
    response::{ApiResult, JsonApiResponse},
    routes::AuthGuard,
    services::{ServiceContext, user_service::UserDetails},
    state::AppState,
};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/profile", get(profile))
        .route("/logout", post(logout))
        .with_state(state)
}

async fn profile(
    State(state): State<Arc<AppState>>,
    current: AuthGuard,
) -> ApiResult<UserDetails> {
    let details = ServiceContext::from_state(state.as_ref())
        .user()
        .details_for(current.user)
        .await?;
    JsonApiResponse::with_status(StatusCode::OK, "Profile retrieved successfully", details)
}

async fn logout(
    State(state): State<Arc<AppState>>,
    current: AuthGuard,
) -> ApiResult<serde_json::Value> {
    ServiceContext::from_state(state.as_ref())
        .auth(&state.jwt, &state.auth)
        .logout(current.user.id)
        .await?;
    JsonApiResponse::with_status(StatusCode::OK, "Logged out successfully", serde_json::Value::Null)
}
