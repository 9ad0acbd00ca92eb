use std::sync::Arc;

use axum::{Router, middleware};

use crate::state::AppState;

use super::{
    api,
    middleware::{catch_panic_layer, envelope_middleware, json_error_middleware},
};

pub const API_PREFIX: &str = "/api/v1";

pub fn router(state: Arc<AppState>) -> Router {
    Router::new().nest(API_PREFIX, api::router(state))
}

/// The router with the error and envelope layers the server runs with.
pub fn app(state: Arc<AppState>) -> Router {
    router(state)
        .layer(catch_panic_layer())
        .layer(middleware::from_fn(json_error_middleware))
        .layer(middleware::from_fn(envelope_middleware))
}
