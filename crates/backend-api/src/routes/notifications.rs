use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use lanxpert_database::{Notification, NotificationRepository};
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::{IntoParams, ToSchema};

use crate::util::page;
use crate::{ApiError, AppState};

const DEFAULT_PAGE: i64 = 50;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListNotificationsQuery {
    pub unread_only: Option<bool>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UnreadCountResponse {
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MarkAllReadResponse {
    pub status: String,
    pub updated: u64,
}

#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    tag = "Notifications",
    security(("bearerAuth" = [])),
    params(ListNotificationsQuery),
    responses((status = 200, description = "Notifications, newest first", body = [Notification]))
)]
pub async fn list_notifications(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListNotificationsQuery>,
) -> Result<Json<Vec<Notification>>, ApiError> {
    let user = state.current_user(&headers).await?;
    let (skip, limit) = page(query.skip, query.limit, DEFAULT_PAGE);

    let notifications = NotificationRepository::new(state.db_pool().clone())
        .list_for_user(&user.id, query.unread_only.unwrap_or(false), skip, limit)
        .await?;
    Ok(Json(notifications))
}

#[utoipa::path(
    get,
    path = "/api/v1/notifications/unread-count",
    tag = "Notifications",
    security(("bearerAuth" = [])),
    responses((status = 200, description = "Number of unread notifications", body = UnreadCountResponse))
)]
pub async fn unread_count(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UnreadCountResponse>, ApiError> {
    let user = state.current_user(&headers).await?;
    let count = NotificationRepository::new(state.db_pool().clone())
        .unread_count(&user.id)
        .await?;
    Ok(Json(UnreadCountResponse { count }))
}

#[utoipa::path(
    put,
    path = "/api/v1/notifications/{notification_id}/read",
    tag = "Notifications",
    security(("bearerAuth" = [])),
    params(("notification_id" = String, Path, description = "Notification id")),
    responses(
        (status = 200, description = "Notification marked as read", body = Notification),
        (status = 404, description = "Notification not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn mark_read(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(notification_id): Path<String>,
) -> Result<Json<Notification>, ApiError> {
    let user = state.current_user(&headers).await?;
    let notification = NotificationRepository::new(state.db_pool().clone())
        .mark_read(&notification_id, &user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Notification not found"))?;
    Ok(Json(notification))
}

#[utoipa::path(
    post,
    path = "/api/v1/notifications/read-all",
    tag = "Notifications",
    security(("bearerAuth" = [])),
    responses((status = 200, description = "All notifications marked as read", body = MarkAllReadResponse))
)]
pub async fn mark_all_read(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MarkAllReadResponse>, ApiError> {
    let user = state.current_user(&headers).await?;
    let updated = NotificationRepository::new(state.db_pool().clone())
        .mark_all_read(&user.id)
        .await?;
    debug!(user_id = %user.id, updated, "notifications marked read");

    Ok(Json(MarkAllReadResponse {
        status: "success".to_string(),
        updated,
    }))
}
