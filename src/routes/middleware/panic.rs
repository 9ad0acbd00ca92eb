use std::any::Any;

use axum::response::{IntoResponse, Response};
use tower_http::catch_panic::CatchPanicLayer;

use crate::{error::AppError, logging::panic_message, response::ErrorEnvelope};

pub fn catch_panic_layer() -> CatchPanicLayer<fn(Box<dyn Any + Send + 'static>) -> Response> {
    CatchPanicLayer::custom(panic_to_envelope)
}

/// A handler panic becomes a 500 envelope. The panic text only reaches the
/// client in debug builds.
fn panic_to_envelope(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = if cfg!(debug_assertions) {
        format!("Internal server error: {}", panic_message(panic.as_ref()))
    } else {
        "Internal server error".to_string()
    };
    ErrorEnvelope::from_error(&AppError::internal(message)).into_response()
}
