use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{AppendHeaders, Redirect},
    routing::get,
};
use serde::Deserialize;

use crate::{
    auth::oauth::{OAuthProviderId, state as oauth_state},
    error::AppError,
    response::JsonApiResponse,
    services::{ServiceContext, auth_service::AuthSession},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
    pub state: Option<String>,
}

type SetCookie = AppendHeaders<[(header::HeaderName, String); 1]>;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/auth/{provider}", get(authorize))
        .route("/auth/{provider}/callback", get(callback))
        .with_state(state)
}

fn provider_id(raw: &str) -> Result<OAuthProviderId, AppError> {
    raw.parse()
        .map_err(|_| AppError::not_found(format!("Unsupported OAuth provider: {raw}")))
}

async fn authorize(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
) -> Result<(SetCookie, Redirect), AppError> {
    let id = provider_id(&provider)?;
    let (_, app) = state.oauth.get(id)?;
    let secure = app.callback_url.starts_with("https://");
    let issued = oauth_state::issue(&state.jwt, id, secure)?;
    let url = state.oauth.authorize_url(id, &issued.nonce)?;
    Ok((
        AppendHeaders([(header::SET_COOKIE, issued.cookie)]),
        Redirect::temporary(url.as_str()),
    ))
}

async fn callback(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
    Query(query): Query<CallbackQuery>,
    headers: HeaderMap,
) -> Result<(SetCookie, JsonApiResponse<AuthSession>), AppError> {
    let id = provider_id(&provider)?;
    if let Some(error) = query.error {
        tracing::warn!(provider = id.as_str(), %error, "oauth provider returned an error");
        return Err(AppError::unauthorized(format!(
            "{} authentication failed",
            id.as_str()
        )));
    }
    let cookies = headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok());
    oauth_state::verify(&state.jwt, id, cookies, query.state.as_deref())?;

    let code = query
        .code
        .filter(|code| !code.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("Missing authorization code"))?;

    let (strategy, app) = state.oauth.get(id)?;
    let payload = state.oauth_client.fetch_profile(strategy, app, &code).await?;
    let identity = strategy.validate_callback(&payload)?;

    let session = ServiceContext::from_state(state.as_ref())
        .auth(&state.jwt, &state.auth)
        .oauth_login(identity)
        .await?;
    let body = JsonApiResponse::with_status(StatusCode::OK, "Login successful", session)?;
    Ok((
        AppendHeaders([(header::SET_COOKIE, oauth_state::clear_cookie())]),
        body,
    ))
}
