use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use lanxpert_auth::{generate_verification_token, validation};
use lanxpert_database::{
    LanguageRepository, NotificationRepository, NotificationSettings, PublicProfile, UpdateProfile,
    User, UserRepository,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::{ApiError, AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// The caller's account together with the names of their roles.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    #[serde(flatten)]
    pub user: User,
    pub roles: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VerificationSentResponse {
    pub message: String,
    /// Returned while outbound email is not wired up.
    pub dev_token: String,
    pub link: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyEmailRequest {
    pub token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateNotificationSettingsRequest {
    pub email_enabled: Option<bool>,
    pub in_app_enabled: Option<bool>,
}

pub(crate) async fn with_roles(state: &AppState, user: User) -> Result<UserResponse, ApiError> {
    let roles = UserRepository::new(state.db_pool().clone())
        .role_names(&user.id)
        .await?;
    Ok(UserResponse { user, roles })
}

#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "Users",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created", body = UserResponse),
        (status = 400, description = "Validation failed or account exists", body = crate::error::ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .authenticator()
        .register(&request.username, &request.email, &request.password)
        .await?;
    Ok(Json(with_roles(&state, user).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    tag = "Users",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_current_user(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.current_user(&headers).await?;
    Ok(Json(with_roles(&state, user).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/me",
    tag = "Users",
    security(("bearerAuth" = [])),
    request_body = UpdateProfile,
    responses(
        (status = 200, description = "Updated profile", body = UserResponse),
        (status = 400, description = "Invalid update", body = crate::error::ErrorResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_current_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(mut request): Json<UpdateProfile>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.current_user(&headers).await?;
    let users = UserRepository::new(state.db_pool().clone());

    let mut errors = Vec::new();
    if let Some(username) = request.username.as_mut() {
        *username = username.trim().to_string();
        errors.extend(validation::validate_username(username));
    }
    if let Some(email) = request.email.as_mut() {
        *email = email.trim().to_string();
        errors.extend(validation::validate_email(email));
    }
    if !errors.is_empty() {
        return Err(ApiError::validation(errors));
    }

    if let Some(username) = &request.username {
        if users.username_taken(username, Some(&user.id)).await? {
            return Err(ApiError::bad_request("Username already taken"));
        }
    }
    if let Some(email) = &request.email {
        if users.email_taken(email, Some(&user.id)).await? {
            return Err(ApiError::bad_request("Email already registered"));
        }
    }

    let languages = LanguageRepository::new(state.db_pool().clone());
    for id in [
        &request.native_language_id,
        &request.target_language_id,
        &request.interface_language_id,
    ]
    .into_iter()
    .flatten()
    .filter(|id| !id.is_empty())
    {
        if !languages.exists(id).await? {
            return Err(ApiError::bad_request(format!("Unknown language '{id}'")));
        }
    }

    let updated = users.update_profile(&user.id, &request).await?;
    Ok(Json(with_roles(&state, updated).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}",
    tag = "Users",
    params(("user_id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "Public profile", body = PublicProfile),
        (status = 404, description = "Unknown user", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_public_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<PublicProfile>, ApiError> {
    UserRepository::new(state.db_pool().clone())
        .public_profile(&user_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("User not found"))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/verify-email/send",
    tag = "Users",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Verification token issued", body = VerificationSentResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse)
    )
)]
pub async fn send_verification_email(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<VerificationSentResponse>, ApiError> {
    let user = state.current_user(&headers).await?;
    let token = generate_verification_token();

    UserRepository::new(state.db_pool().clone())
        .set_verification_token(&user.id, Some(&token))
        .await?;

    let frontend = state.config().http.frontend_url.trim_end_matches('/');
    let link = format!("{frontend}/verify-email/confirm?token={token}");
    info!(user_id = %user.id, email = %user.email, "verification email prepared");

    Ok(Json(VerificationSentResponse {
        message: "Verification email sent".to_string(),
        dev_token: token,
        link,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/verify-email/verify",
    tag = "Users",
    request_body = VerifyEmailRequest,
    responses(
        (status = 200, description = "Email verified", body = MessageResponse),
        (status = 400, description = "Invalid token", body = crate::error::ErrorResponse)
    )
)]
pub async fn verify_email(
    State(state): State<AppState>,
    Json(request): Json<VerifyEmailRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let users = UserRepository::new(state.db_pool().clone());
    let user = users
        .find_by_verification_token(request.token.trim())
        .await?
        .ok_or_else(|| ApiError::bad_request("Invalid token"))?;

    users.mark_email_verified(&user.id).await?;
    Ok(MessageResponse::new("Email verified successfully"))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/me/notification-settings",
    tag = "Users",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Notification preferences", body = NotificationSettings),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_notification_settings(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<NotificationSettings>, ApiError> {
    let user = state.current_user(&headers).await?;
    let settings = NotificationRepository::new(state.db_pool().clone())
        .settings(&user.id)
        .await?;
    Ok(Json(settings))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/me/notification-settings",
    tag = "Users",
    security(("bearerAuth" = [])),
    request_body = UpdateNotificationSettingsRequest,
    responses(
        (status = 200, description = "Updated preferences", body = NotificationSettings),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_notification_settings(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<UpdateNotificationSettingsRequest>,
) -> Result<Json<NotificationSettings>, ApiError> {
    let user = state.current_user(&headers).await?;
    let settings = NotificationRepository::new(state.db_pool().clone())
        .update_settings(&user.id, request.email_enabled, request.in_app_enabled)
        .await?;
    Ok(Json(settings))
}
