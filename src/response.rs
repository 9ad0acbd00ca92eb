use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::error::{AppError, FieldErrors};

pub type ApiResult<T> = Result<JsonApiResponse<T>, AppError>;

/// Success envelope. `path` is stamped by `envelope_middleware` once the
/// request URI is known.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonApiResponse<T: Serialize> {
    pub status_code: u16,
    pub message: String,
    pub data: T,
    pub path: Option<String>,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    pub status_code: u16,
    pub message: String,
    pub errors: Option<FieldErrors>,
    pub path: Option<String>,
    pub timestamp: String,
}

impl<T: Serialize> JsonApiResponse<T> {
    pub fn ok(data: T) -> ApiResult<T> {
        Self::with_status(StatusCode::OK, "Success", data)
    }

    pub fn with_status(status: StatusCode, message: impl Into<String>, data: T) -> ApiResult<T> {
        Ok(Self {
            status_code: status.as_u16(),
            message: message.into(),
            data,
            path: None,
            timestamp: now_rfc3339(),
        })
    }
}

impl ErrorEnvelope {
    pub fn from_error(err: &AppError) -> Self {
        Self {
            status_code: status_for(err).as_u16(),
            message: err.message().to_string(),
            errors: err.field_errors().cloned(),
            path: None,
            timestamp: now_rfc3339(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        if status.is_server_error() {
            log_app_error(&self, status);
        }
        (status, Json(ErrorEnvelope::from_error(&self))).into_response()
    }
}

impl<T: Serialize> IntoResponse for JsonApiResponse<T> {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

impl IntoResponse for ErrorEnvelope {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

pub fn status_for(err: &AppError) -> StatusCode {
    match err {
        AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        AppError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        AppError::Forbidden(_) => StatusCode::FORBIDDEN,
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        AppError::Conflict(_) => StatusCode::CONFLICT,
        AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn log_app_error(err: &AppError, status: StatusCode) {
    tracing::error!(status = status.as_u16(), error = %err, "request failed");
}

pub(crate) fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use axum::{body, http::StatusCode, response::IntoResponse};

    use super::JsonApiResponse;
    use crate::error::AppError;

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should read");
        serde_json::from_slice(&bytes).expect("body should be json")
    }

    #[tokio::test]
    async fn success_envelope_uses_camel_case_keys() {
        let response = JsonApiResponse::with_status(StatusCode::CREATED, "created", 7)
            .expect("envelope should build")
            .into_response();
        assert_eq!(response.status(), StatusCode::CREATED);

        let json = body_json(response).await;
        assert_eq!(json["statusCode"], 201);
        assert_eq!(json["message"], "created");
        assert_eq!(json["data"], 7);
        assert!(json["timestamp"].as_str().is_some());
    }

    #[tokio::test]
    async fn validation_error_carries_field_map() {
        let response = AppError::field("password", "password is too short").into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let json = body_json(response).await;
        assert_eq!(json["statusCode"], 422);
        assert_eq!(json["errors"]["password"], "password is too short");
        assert!(json.get("data").is_none());
    }

    #[tokio::test]
    async fn plain_errors_have_null_field_map() {
        let json = body_json(AppError::forbidden("Forbidden").into_response()).await;

        assert_eq!(json["statusCode"], 403);
        assert!(json["errors"].is_null());
    }
}
