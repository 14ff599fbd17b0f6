use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use lanxpert_database::{Answer, AnswerReport, AnswerRepository, NewAnswer};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::routes::users::MessageResponse;
use crate::services::community;
use crate::{ApiError, AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateAnswerRequest {
    pub answer_text: Option<String>,
    pub context_tags: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VoteRequest {
    pub is_helpful: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VoteResponse {
    pub helpful_count: i64,
    /// `null` when the call withdrew the caller's vote.
    pub is_helpful: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReportAnswerRequest {
    pub reason: String,
}

#[utoipa::path(
    post,
    path = "/api/v1/answers",
    tag = "Answers",
    security(("bearerAuth" = [])),
    request_body = NewAnswer,
    responses(
        (status = 200, description = "Answer posted", body = Answer),
        (status = 403, description = "Daily answer limit reached", body = crate::error::ErrorResponse),
        (status = 404, description = "Question not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_answer(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<NewAnswer>,
) -> Result<Json<Answer>, ApiError> {
    let user = state.current_user(&headers).await?;
    let answer = community::answer_question(state.db_pool(), &user, &request).await?;
    Ok(Json(answer))
}

#[utoipa::path(
    put,
    path = "/api/v1/answers/{answer_id}",
    tag = "Answers",
    security(("bearerAuth" = [])),
    params(("answer_id" = String, Path, description = "Answer id")),
    request_body = UpdateAnswerRequest,
    responses(
        (status = 200, description = "Answer edited", body = Answer),
        (status = 403, description = "Not the author", body = crate::error::ErrorResponse),
        (status = 404, description = "Answer not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_answer(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(answer_id): Path<String>,
    Json(request): Json<UpdateAnswerRequest>,
) -> Result<Json<Answer>, ApiError> {
    let user = state.current_user(&headers).await?;
    community::owned_answer(state.db_pool(), &user, &answer_id, "update").await?;

    if request.answer_text.as_deref().is_some_and(|text| text.trim().is_empty()) {
        return Err(ApiError::bad_request("Answer text is required"));
    }

    let answer = AnswerRepository::new(state.db_pool().clone())
        .update(&answer_id, request.answer_text.as_deref(), request.context_tags.as_deref())
        .await?;
    Ok(Json(answer))
}

#[utoipa::path(
    delete,
    path = "/api/v1/answers/{answer_id}",
    tag = "Answers",
    security(("bearerAuth" = [])),
    params(("answer_id" = String, Path, description = "Answer id")),
    responses(
        (status = 200, description = "Answer deleted", body = MessageResponse),
        (status = 403, description = "Not the author", body = crate::error::ErrorResponse),
        (status = 404, description = "Answer not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_answer(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(answer_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let user = state.current_user(&headers).await?;
    community::owned_answer(state.db_pool(), &user, &answer_id, "delete").await?;

    AnswerRepository::new(state.db_pool().clone())
        .delete(&answer_id)
        .await?;
    Ok(MessageResponse::new("Answer deleted"))
}

#[utoipa::path(
    post,
    path = "/api/v1/answers/{answer_id}/vote",
    tag = "Answers",
    security(("bearerAuth" = [])),
    params(("answer_id" = String, Path, description = "Answer id")),
    request_body = VoteRequest,
    responses(
        (status = 200, description = "Vote recorded or withdrawn", body = VoteResponse),
        (status = 404, description = "Answer not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn vote_answer(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(answer_id): Path<String>,
    Json(request): Json<VoteRequest>,
) -> Result<Json<VoteResponse>, ApiError> {
    let user = state.current_user(&headers).await?;
    let answers = AnswerRepository::new(state.db_pool().clone());
    if answers.find_by_id(&answer_id).await?.is_none() {
        return Err(ApiError::not_found("Answer not found"));
    }

    let (helpful_count, is_helpful) = answers.vote(&answer_id, &user.id, request.is_helpful).await?;
    Ok(Json(VoteResponse {
        helpful_count,
        is_helpful,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/answers/{answer_id}/report",
    tag = "Answers",
    security(("bearerAuth" = [])),
    params(("answer_id" = String, Path, description = "Answer id")),
    request_body = ReportAnswerRequest,
    responses(
        (status = 200, description = "Report filed", body = AnswerReport),
        (status = 404, description = "Answer not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn report_answer(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(answer_id): Path<String>,
    Json(request): Json<ReportAnswerRequest>,
) -> Result<Json<AnswerReport>, ApiError> {
    let user = state.current_user(&headers).await?;
    let answers = AnswerRepository::new(state.db_pool().clone());
    if answers.find_by_id(&answer_id).await?.is_none() {
        return Err(ApiError::not_found("Answer not found"));
    }
    if request.reason.trim().is_empty() {
        return Err(ApiError::bad_request("A reason is required"));
    }

    let report = answers.report(&answer_id, &user.id, request.reason.trim()).await?;
    Ok(Json(report))
}
