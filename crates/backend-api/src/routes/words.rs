use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use lanxpert_database::{NewWord, UpdateWord, Word, WordFilter, WordRepository};

use crate::routes::users::MessageResponse;
use crate::services::{admin::audit, study};
use crate::util::page;
use crate::{ApiError, AppState};

const DEFAULT_PAGE: i64 = 100;

#[utoipa::path(
    get,
    path = "/api/v1/words",
    tag = "Words",
    params(WordFilter),
    responses((status = 200, description = "Words in alphabetical order", body = [Word]))
)]
pub async fn list_words(
    State(state): State<AppState>,
    Query(filter): Query<WordFilter>,
) -> Result<Json<Vec<Word>>, ApiError> {
    let (skip, limit) = page(filter.skip, filter.limit, DEFAULT_PAGE);
    let words = WordRepository::new(state.db_pool().clone())
        .list(&filter, skip, limit)
        .await?;
    Ok(Json(words))
}

#[utoipa::path(
    get,
    path = "/api/v1/words/random",
    tag = "Words",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "A word to study", body = Word),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Daily word limit reached", body = crate::error::ErrorResponse),
        (status = 404, description = "No words available", body = crate::error::ErrorResponse)
    )
)]
pub async fn random_word(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<Word>, ApiError> {
    let user = state.current_user(&headers).await?;
    let word = study::draw_random_word(state.db_pool(), &user).await?;
    Ok(Json(word))
}

#[utoipa::path(
    post,
    path = "/api/v1/words",
    tag = "Words",
    security(("bearerAuth" = [])),
    request_body = NewWord,
    responses(
        (status = 200, description = "Word created", body = Word),
        (status = 403, description = "Admin or moderator role required", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_word(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<NewWord>,
) -> Result<Json<Word>, ApiError> {
    let admin = state.require_admin(&headers).await?;
    let word = create_word_checked(&state, &request).await?;
    audit(state.db_pool(), &admin, "create_word", "words", Some(&word.id)).await?;
    Ok(Json(word))
}

/// Validate references and content, then insert.
pub(crate) async fn create_word_checked(state: &AppState, request: &NewWord) -> Result<Word, ApiError> {
    if request.word.trim().is_empty() || request.meaning.trim().is_empty() {
        return Err(ApiError::bad_request("Word and meaning are required"));
    }
    let languages = lanxpert_database::LanguageRepository::new(state.db_pool().clone());
    if !languages.exists(&request.language_id).await? {
        return Err(ApiError::bad_request("Unknown language"));
    }
    if let Some(target) = request.target_language_id.as_deref() {
        if !languages.exists(target).await? {
            return Err(ApiError::bad_request("Unknown target language"));
        }
    }
    Ok(WordRepository::new(state.db_pool().clone()).create(request).await?)
}

#[utoipa::path(
    put,
    path = "/api/v1/words/{word_id}",
    tag = "Words",
    security(("bearerAuth" = [])),
    params(("word_id" = String, Path, description = "Word id")),
    request_body = UpdateWord,
    responses(
        (status = 200, description = "Word updated", body = Word),
        (status = 403, description = "Admin or moderator role required", body = crate::error::ErrorResponse),
        (status = 404, description = "Word not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_word(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(word_id): Path<String>,
    Json(request): Json<UpdateWord>,
) -> Result<Json<Word>, ApiError> {
    let admin = state.require_admin(&headers).await?;
    let word = WordRepository::new(state.db_pool().clone())
        .update(&word_id, &request)
        .await?;
    audit(state.db_pool(), &admin, "update_word", "words", Some(&word.id)).await?;
    Ok(Json(word))
}

#[utoipa::path(
    delete,
    path = "/api/v1/words/{word_id}",
    tag = "Words",
    security(("bearerAuth" = [])),
    params(("word_id" = String, Path, description = "Word id")),
    responses(
        (status = 200, description = "Word deleted", body = MessageResponse),
        (status = 403, description = "Admin or moderator role required", body = crate::error::ErrorResponse),
        (status = 404, description = "Word not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_word(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(word_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let admin = state.require_admin(&headers).await?;
    if !WordRepository::new(state.db_pool().clone()).delete(&word_id).await? {
        return Err(ApiError::not_found("Word not found"));
    }
    audit(state.db_pool(), &admin, "delete_word", "words", Some(&word_id)).await?;
    Ok(MessageResponse::new("Word deleted"))
}
