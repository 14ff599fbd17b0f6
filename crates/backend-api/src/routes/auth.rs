use axum::{
    async_trait,
    extract::{FromRequest, Request, State},
    http::{
        header::{CONTENT_TYPE, USER_AGENT},
        HeaderMap,
    },
    Form, Json,
};
use lanxpert_auth::{ClientInfo, TokenPair};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{ApiError, AppState};

/// OAuth2 password-grant style credentials. `username` also accepts an email.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Accepts the credentials either form-encoded or as JSON.
pub struct LoginForm(pub LoginRequest);

#[async_trait]
impl<S> FromRequest<S> for LoginForm
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/json"));

        let request = if is_json {
            Json::<LoginRequest>::from_request(req, state)
                .await
                .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?
                .0
        } else {
            Form::<LoginRequest>::from_request(req, state)
                .await
                .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?
                .0
        };
        Ok(Self(request))
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub refresh_token: String,
}

impl From<TokenPair> for TokenResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            token_type: pair.token_type,
            refresh_token: pair.refresh_token,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LogoutResponse {
    pub message: String,
}

fn client_info(headers: &HeaderMap) -> ClientInfo {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };

    ClientInfo {
        ip_address: header("x-forwarded-for")
            .and_then(|value| value.split(',').next().map(|ip| ip.trim().to_string()))
            .or_else(|| header("x-real-ip")),
        user_agent: header(USER_AGENT.as_str()),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/token",
    tag = "Auth",
    request_body(content = LoginRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Access and refresh tokens", body = TokenResponse),
        (status = 400, description = "Inactive user", body = crate::error::ErrorResponse),
        (status = 401, description = "Incorrect username or password", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    LoginForm(request): LoginForm,
) -> Result<Json<TokenResponse>, ApiError> {
    let (_, pair) = state
        .authenticator()
        .login(&request.username, &request.password, &client_info(&headers))
        .await?;
    Ok(Json(pair.into()))
}

#[utoipa::path(
    post,
    path = "/api/v1/refresh",
    tag = "Auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Rotated token pair", body = TokenResponse),
        (status = 401, description = "Invalid, expired or revoked refresh token", body = crate::error::ErrorResponse)
    )
)]
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let pair = state.authenticator().refresh(&request.refresh_token).await?;
    Ok(Json(pair.into()))
}

#[utoipa::path(
    post,
    path = "/api/v1/logout",
    tag = "Auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Refresh token revoked", body = LogoutResponse),
        (status = 401, description = "Invalid refresh token", body = crate::error::ErrorResponse)
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<LogoutResponse>, ApiError> {
    state.authenticator().logout(&request.refresh_token).await?;
    Ok(Json(LogoutResponse {
        message: "Successfully logged out".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn client_info_prefers_first_forwarded_address() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9, 10.0.0.1"));
        headers.insert(USER_AGENT, HeaderValue::from_static("curl/8"));

        let info = client_info(&headers);
        assert_eq!(info.ip_address.as_deref(), Some("203.0.113.9"));
        assert_eq!(info.user_agent.as_deref(), Some("curl/8"));
    }
}
