use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

use super::{auth, oauth, profile, roles, users};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(auth::router(state.clone()))
        .merge(oauth::router(state.clone()))
        .merge(profile::router(state.clone()))
        .merge(roles::router(state.clone()))
        .merge(users::router(state))
}
