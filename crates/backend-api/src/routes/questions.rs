use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use lanxpert_database::{
    AnswerRepository, AnswerView, NewQuestion, Question, QuestionFilter, QuestionRepository, QuestionView,
    UpdateQuestion,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::routes::users::MessageResponse;
use crate::services::community;
use crate::util::page;
use crate::{ApiError, AppState};

const DEFAULT_PAGE: i64 = 10;

#[derive(Debug, Serialize, ToSchema)]
pub struct QuestionWithAnswers {
    #[serde(flatten)]
    pub question: QuestionView,
    pub answers: Vec<AnswerView>,
}

async fn attach_answers(
    state: &AppState,
    question: QuestionView,
    viewer: Option<&str>,
) -> Result<QuestionWithAnswers, ApiError> {
    let answers = AnswerRepository::new(state.db_pool().clone())
        .list_for_question(&question.id, viewer)
        .await?;
    Ok(QuestionWithAnswers { question, answers })
}

#[utoipa::path(
    get,
    path = "/api/v1/questions",
    tag = "Questions",
    params(QuestionFilter),
    responses((status = 200, description = "Questions, newest first, with their answers", body = [QuestionWithAnswers]))
)]
pub async fn list_questions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(filter): Query<QuestionFilter>,
) -> Result<Json<Vec<QuestionWithAnswers>>, ApiError> {
    let viewer = state.optional_user(&headers).await;
    let viewer_id = viewer.as_ref().map(|user| user.id.as_str());
    let (skip, limit) = page(filter.skip, filter.limit, DEFAULT_PAGE);

    let questions = QuestionRepository::new(state.db_pool().clone())
        .list(&filter, skip, limit)
        .await?;

    let mut results = Vec::with_capacity(questions.len());
    for question in questions {
        results.push(attach_answers(&state, question, viewer_id).await?);
    }
    Ok(Json(results))
}

#[utoipa::path(
    get,
    path = "/api/v1/questions/{question_id}",
    tag = "Questions",
    params(("question_id" = String, Path, description = "Question id")),
    responses(
        (status = 200, description = "Question with answers", body = QuestionWithAnswers),
        (status = 404, description = "Question not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_question(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(question_id): Path<String>,
) -> Result<Json<QuestionWithAnswers>, ApiError> {
    let viewer = state.optional_user(&headers).await;
    let question = QuestionRepository::new(state.db_pool().clone())
        .find_view(&question_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Question not found"))?;

    let detail = attach_answers(&state, question, viewer.as_ref().map(|user| user.id.as_str())).await?;
    Ok(Json(detail))
}

#[utoipa::path(
    post,
    path = "/api/v1/questions",
    tag = "Questions",
    security(("bearerAuth" = [])),
    request_body = NewQuestion,
    responses(
        (status = 200, description = "Question posted", body = Question),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Daily question limit reached", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_question(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<NewQuestion>,
) -> Result<Json<Question>, ApiError> {
    let user = state.current_user(&headers).await?;
    let question = community::ask_question(state.db_pool(), &user, &request).await?;
    Ok(Json(question))
}

#[utoipa::path(
    put,
    path = "/api/v1/questions/{question_id}",
    tag = "Questions",
    security(("bearerAuth" = [])),
    params(("question_id" = String, Path, description = "Question id")),
    request_body = UpdateQuestion,
    responses(
        (status = 200, description = "Question updated", body = Question),
        (status = 403, description = "Not the author", body = crate::error::ErrorResponse),
        (status = 404, description = "Question not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_question(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(question_id): Path<String>,
    Json(request): Json<UpdateQuestion>,
) -> Result<Json<Question>, ApiError> {
    let user = state.current_user(&headers).await?;
    community::owned_question(state.db_pool(), &user, &question_id, "update").await?;

    let question = QuestionRepository::new(state.db_pool().clone())
        .update(&question_id, &request)
        .await?;
    Ok(Json(question))
}

#[utoipa::path(
    delete,
    path = "/api/v1/questions/{question_id}",
    tag = "Questions",
    security(("bearerAuth" = [])),
    params(("question_id" = String, Path, description = "Question id")),
    responses(
        (status = 200, description = "Question deleted", body = MessageResponse),
        (status = 403, description = "Not the author", body = crate::error::ErrorResponse),
        (status = 404, description = "Question not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_question(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(question_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let user = state.current_user(&headers).await?;
    community::owned_question(state.db_pool(), &user, &question_id, "delete").await?;

    QuestionRepository::new(state.db_pool().clone())
        .delete(&question_id)
        .await?;
    Ok(MessageResponse::new("Question deleted"))
}
