use axum::{
    body::to_bytes,
    extract::Request,
    http::{Method, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{
    error::AppError,
    response::{ErrorEnvelope, log_app_error},
};

const MAX_REJECTION_BYTES: usize = 16 * 1024;

/// Error responses that did not come from an [`AppError`] (extractor
/// rejections, unknown routes, wrong methods) leave as the JSON error
/// envelope too, keeping their status code.
pub async fn json_error_middleware(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let response = next.run(req).await;

    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) || has_json_body(&response) {
        return response;
    }

    let (parts, body) = response.into_parts();
    let text = to_bytes(body, MAX_REJECTION_BYTES)
        .await
        .map(|bytes| String::from_utf8_lossy(&bytes).trim().to_string())
        .unwrap_or_default();
    let err = rejection_error(status, rejection_message(status, &method, &path, text));
    if status.is_server_error() {
        log_app_error(&err, status);
    }

    let mut envelope = ErrorEnvelope::from_error(&err);
    envelope.status_code = status.as_u16();
    let mut rewritten = envelope.into_response();
    // `Allow` on a 405 and similar hints survive the rewrite.
    for (name, value) in &parts.headers {
        if name != header::CONTENT_TYPE && name != header::CONTENT_LENGTH {
            rewritten.headers_mut().insert(name.clone(), value.clone());
        }
    }
    rewritten
}

fn has_json_body(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| {
            let value = value.to_ascii_lowercase();
            value.contains("application/json") || value.contains("+json")
        })
}

fn rejection_message(status: StatusCode, method: &Method, path: &str, text: String) -> String {
    match status {
        StatusCode::NOT_FOUND if text.is_empty() => format!("Cannot {method} {path}"),
        _ if text.is_empty() => status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string(),
        _ => text,
    }
}

fn rejection_error(status: StatusCode, message: String) -> AppError {
    match status {
        StatusCode::UNAUTHORIZED => AppError::unauthorized(message),
        StatusCode::FORBIDDEN => AppError::forbidden(message),
        StatusCode::NOT_FOUND => AppError::not_found(message),
        StatusCode::CONFLICT => AppError::conflict(message),
        _ if status.is_client_error() => AppError::bad_request(message),
        _ => AppError::internal(message),
    }
}
