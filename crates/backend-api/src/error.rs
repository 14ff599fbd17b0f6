use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use lanxpert_auth::AuthError;
use lanxpert_database::DatabaseError;
use serde::Serialize;
use tracing::{error, warn};
use utoipa::ToSchema;

use crate::services::ServiceError;

/// Either a single message or, for validation failures, every message.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum ErrorDetail {
    Message(String),
    List(Vec<String>),
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub detail: ErrorDetail,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub errors: Vec<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            errors: Vec::new(),
        }
    }

    pub fn validation(errors: Vec<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: errors.join("; "),
            errors,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let detail = if self.errors.is_empty() {
            ErrorDetail::Message(self.message)
        } else {
            ErrorDetail::List(self.errors)
        };
        (self.status, Json(ErrorResponse { detail })).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        error!(error = ?error, "internal error");
        Self::internal_server_error("Internal server error")
    }
}

impl From<DatabaseError> for ApiError {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::NotFound(what) => Self::not_found(format!("{what} not found")),
            DatabaseError::Duplicate(message) => Self::bad_request(message),
            other => {
                error!(error = ?other, "database error");
                Self::internal_server_error("Internal server error")
            }
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(error: sqlx::Error) -> Self {
        Self::from(DatabaseError::Query(error))
    }
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::Validation(errors) => Self::validation(errors),
            AuthError::UserExists(message) => Self::bad_request(message),
            AuthError::InactiveUser => Self::bad_request(error.to_string()),
            AuthError::InvalidCredentials
            | AuthError::InvalidToken
            | AuthError::TokenExpired
            | AuthError::TokenRevoked => {
                warn!(error = %error, "authentication rejected");
                Self::unauthorized(error.to_string())
            }
            AuthError::Database(_)
            | AuthError::Repository(_)
            | AuthError::PasswordHash(_)
            | AuthError::Jwt(_) => {
                error!(error = ?error, "auth error");
                Self::internal_server_error("Internal server error")
            }
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::NotFound(message) => Self::not_found(message),
            ServiceError::Forbidden(message) | ServiceError::QuotaExceeded(message) => {
                Self::forbidden(message)
            }
            ServiceError::BadRequest(message) => Self::bad_request(message),
            ServiceError::Database(db) => Self::from(db),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(error: ApiError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn single_errors_render_as_detail_string() {
        let (status, body) = body_json(ApiError::not_found("Word not found")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, serde_json::json!({ "detail": "Word not found" }));
    }

    #[tokio::test]
    async fn validation_errors_render_as_detail_list() {
        let error = ApiError::validation(vec!["a".into(), "b".into()]);
        let (status, body) = body_json(error).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, serde_json::json!({ "detail": ["a", "b"] }));
    }

    #[test]
    fn auth_errors_map_to_statuses() {
        assert_eq!(ApiError::from(AuthError::InvalidCredentials).status, StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::from(AuthError::InactiveUser).status, StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::from(AuthError::UserExists("Email already registered".into())).message,
            "Email already registered"
        );
    }

    #[test]
    fn internal_details_are_not_leaked() {
        let error = ApiError::from(DatabaseError::Connection("secret dsn".into()));
        assert_eq!(error.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!error.message.contains("secret"));
    }
}
