use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use lanxpert_database::{ChatDetail, ChatRepository, Message, UserRepository};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::services::{
    chat::{self, LeaveOutcome},
    matchmaking,
};
use crate::util::Pagination;
use crate::{ApiError, AppState};

const DEFAULT_CHAT_PAGE: i64 = 20;
const DEFAULT_MESSAGE_PAGE: i64 = 50;

#[derive(Debug, Deserialize, ToSchema)]
pub struct DirectChatRequest {
    pub target_user_id: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SendMessageRequest {
    pub content: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BlockRequest {
    pub user_id: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReportUserRequest {
    pub user_id: String,
    #[serde(default = "default_reason")]
    pub reason: String,
    #[serde(default)]
    pub description: String,
}

fn default_reason() -> String {
    "other".to_string()
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    fn new(status: &str) -> Json<Self> {
        Json(Self {
            status: status.to_string(),
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LeaveChatResponse {
    pub status: LeaveOutcome,
}

#[utoipa::path(
    get,
    path = "/api/v1/chats",
    tag = "Chats",
    security(("bearerAuth" = [])),
    params(Pagination),
    responses((status = 200, description = "Chats, most recently active first", body = [ChatDetail]))
)]
pub async fn list_chats(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Vec<ChatDetail>>, ApiError> {
    let user = state.current_user(&headers).await?;
    let (skip, limit) = pagination.resolve(DEFAULT_CHAT_PAGE);

    let chats = ChatRepository::new(state.db_pool().clone())
        .list_for_user(&user.id, skip, limit)
        .await?;
    Ok(Json(chats))
}

#[utoipa::path(
    post,
    path = "/api/v1/chats/random",
    tag = "Chats",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Matched chat, or the queue the caller waits in", body = ChatDetail),
        (status = 400, description = "No target language set", body = crate::error::ErrorResponse)
    )
)]
pub async fn random_chat(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ChatDetail>, ApiError> {
    let user = state.current_user(&headers).await?;
    let outcome = matchmaking::join_random_chat(state.db_pool(), &user).await?;
    Ok(Json(outcome.chat))
}

#[utoipa::path(
    post,
    path = "/api/v1/chats/direct",
    tag = "Chats",
    security(("bearerAuth" = [])),
    request_body = DirectChatRequest,
    responses(
        (status = 200, description = "Direct chat with the target user", body = ChatDetail),
        (status = 400, description = "Missing or invalid target", body = crate::error::ErrorResponse),
        (status = 403, description = "Paid plan required or user blocked", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn direct_chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<DirectChatRequest>,
) -> Result<Json<ChatDetail>, ApiError> {
    let user = state.current_user(&headers).await?;
    let chat = chat::open_direct_chat(state.db_pool(), &user, request.target_user_id.trim()).await?;
    Ok(Json(chat))
}

#[utoipa::path(
    get,
    path = "/api/v1/chats/{chat_id}/messages",
    tag = "Chats",
    security(("bearerAuth" = [])),
    params(("chat_id" = String, Path, description = "Chat id"), Pagination),
    responses(
        (status = 200, description = "Messages, oldest first", body = [Message]),
        (status = 403, description = "Not a participant", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_messages(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(chat_id): Path<String>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let user = state.current_user(&headers).await?;
    let (skip, limit) = pagination.resolve(DEFAULT_MESSAGE_PAGE);

    let messages = chat::list_messages(state.db_pool(), &user, &chat_id, skip, limit).await?;
    Ok(Json(messages))
}

#[utoipa::path(
    post,
    path = "/api/v1/chats/{chat_id}/messages",
    tag = "Chats",
    security(("bearerAuth" = [])),
    params(("chat_id" = String, Path, description = "Chat id")),
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "Message sent", body = Message),
        (status = 400, description = "Empty message or conversation ended", body = crate::error::ErrorResponse),
        (status = 403, description = "Not a participant", body = crate::error::ErrorResponse),
        (status = 404, description = "Chat not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn send_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(chat_id): Path<String>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<Message>, ApiError> {
    let user = state.current_user(&headers).await?;
    let message = chat::send_message(state.db_pool(), &user, &chat_id, &request.content).await?;
    Ok(Json(message))
}

#[utoipa::path(
    post,
    path = "/api/v1/chats/block",
    tag = "Chats",
    security(("bearerAuth" = [])),
    request_body = BlockRequest,
    responses(
        (status = 200, description = "`blocked` or `already_blocked`", body = StatusResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn block_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<BlockRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let user = state.current_user(&headers).await?;
    let target_id = existing_other_user(&state, &user.id, &request.user_id, "block").await?;

    let newly_blocked = ChatRepository::new(state.db_pool().clone())
        .block(&user.id, &target_id)
        .await?;
    if !newly_blocked {
        return Ok(StatusResponse::new("already_blocked"));
    }

    info!(blocker_id = %user.id, blocked_id = %target_id, "user blocked");
    Ok(StatusResponse::new("blocked"))
}

#[utoipa::path(
    delete,
    path = "/api/v1/chats/block/{user_id}",
    tag = "Chats",
    security(("bearerAuth" = [])),
    params(("user_id" = String, Path, description = "Blocked user id")),
    responses((status = 200, description = "`unblocked`", body = StatusResponse))
)]
pub async fn unblock_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let user = state.current_user(&headers).await?;
    ChatRepository::new(state.db_pool().clone())
        .unblock(&user.id, &user_id)
        .await?;
    Ok(StatusResponse::new("unblocked"))
}

#[utoipa::path(
    post,
    path = "/api/v1/chats/report",
    tag = "Chats",
    security(("bearerAuth" = [])),
    request_body = ReportUserRequest,
    responses(
        (status = 200, description = "`reported`", body = StatusResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn report_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ReportUserRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let user = state.current_user(&headers).await?;
    let target_id = existing_other_user(&state, &user.id, &request.user_id, "report").await?;

    let report = ChatRepository::new(state.db_pool().clone())
        .report(&user.id, &target_id, &request.reason, &request.description)
        .await?;
    info!(report_id = %report.id, reported_id = %target_id, reason = %report.reason, "user reported");
    Ok(StatusResponse::new("reported"))
}

#[utoipa::path(
    delete,
    path = "/api/v1/chats/{chat_id}",
    tag = "Chats",
    security(("bearerAuth" = [])),
    params(("chat_id" = String, Path, description = "Chat id")),
    responses(
        (status = 200, description = "`chat_deleted` or `chat_left`", body = LeaveChatResponse),
        (status = 403, description = "Not a participant", body = crate::error::ErrorResponse)
    )
)]
pub async fn leave_chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(chat_id): Path<String>,
) -> Result<Json<LeaveChatResponse>, ApiError> {
    let user = state.current_user(&headers).await?;
    let status = chat::leave_chat(state.db_pool(), &user, &chat_id).await?;
    Ok(Json(LeaveChatResponse { status }))
}

/// Resolve the target of a block or report. It must be a live account other than the caller.
async fn existing_other_user(
    state: &AppState,
    caller_id: &str,
    target_id: &str,
    action: &str,
) -> Result<String, ApiError> {
    let target_id = target_id.trim();
    if target_id.is_empty() {
        return Err(ApiError::bad_request("user_id is required"));
    }
    if target_id == caller_id {
        return Err(ApiError::bad_request(format!("Cannot {action} yourself")));
    }

    let target = UserRepository::new(state.db_pool().clone())
        .find_by_id(target_id)
        .await?
        .filter(|user| !user.is_deleted())
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(target.id)
}
