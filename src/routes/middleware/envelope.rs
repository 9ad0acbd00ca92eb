use axum::{
    body::{Body, to_bytes},
    extract::Request,
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::error::AppError;

const MAX_ENVELOPE_BYTES: usize = 8 * 1024 * 1024;

/// Fills in `path` on every JSON envelope leaving the router.
pub async fn envelope_middleware(req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    let response = next.run(req).await;

    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"));
    if !is_json {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, MAX_ENVELOPE_BYTES).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::error!(%path, error = %err, "response body could not be buffered");
            return AppError::internal("Response too large").into_response();
        }
    };

    match stamp_path(&bytes, path) {
        Some(stamped) => {
            parts.headers.remove(header::CONTENT_LENGTH);
            Response::from_parts(parts, Body::from(stamped))
        }
        None => Response::from_parts(parts, Body::from(bytes)),
    }
}

fn stamp_path(bytes: &[u8], path: String) -> Option<Vec<u8>> {
    let Ok(Value::Object(mut envelope)) = serde_json::from_slice::<Value>(bytes) else {
        return None;
    };
    if !envelope.contains_key("statusCode") {
        return None;
    }
    envelope.insert("path".to_string(), Value::String(path));
    serde_json::to_vec(&envelope).ok()
}
