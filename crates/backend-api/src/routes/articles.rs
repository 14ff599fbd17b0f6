use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use lanxpert_database::{Article, ArticleRepository, ArticleView, NewArticle, UpdateArticle};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::routes::users::MessageResponse;
use crate::services::community::{self, LikeStatus};
use crate::util::page;
use crate::{ApiError, AppState};

const DEFAULT_PAGE: i64 = 10;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ArticleQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    /// Only articles by this author.
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LikeResponse {
    pub status: LikeStatus,
}

#[utoipa::path(
    get,
    path = "/api/v1/articles",
    tag = "Articles",
    params(ArticleQuery),
    responses((status = 200, description = "Articles, newest first", body = [ArticleView]))
)]
pub async fn list_articles(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ArticleQuery>,
) -> Result<Json<Vec<ArticleView>>, ApiError> {
    let viewer = state.optional_user(&headers).await;
    let (skip, limit) = page(query.skip, query.limit, DEFAULT_PAGE);

    let articles = ArticleRepository::new(state.db_pool().clone())
        .list(
            query.user_id.as_deref(),
            viewer.as_ref().map(|user| user.id.as_str()),
            skip,
            limit,
        )
        .await?;
    Ok(Json(articles))
}

#[utoipa::path(
    get,
    path = "/api/v1/articles/{article_id}",
    tag = "Articles",
    params(("article_id" = String, Path, description = "Article id")),
    responses(
        (status = 200, description = "Article", body = ArticleView),
        (status = 404, description = "Article not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_article(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(article_id): Path<String>,
) -> Result<Json<ArticleView>, ApiError> {
    let viewer = state.optional_user(&headers).await;
    let viewer_id = viewer.as_ref().map(|user| user.id.as_str());

    let article = ArticleRepository::new(state.db_pool().clone())
        .find_view(&article_id, viewer_id)
        .await?
        .filter(|article| article.is_published || Some(article.user_id.as_str()) == viewer_id)
        .ok_or_else(|| ApiError::not_found("Article not found"))?;
    Ok(Json(article))
}

#[utoipa::path(
    post,
    path = "/api/v1/articles",
    tag = "Articles",
    security(("bearerAuth" = [])),
    request_body = NewArticle,
    responses(
        (status = 200, description = "Article published", body = Article),
        (status = 403, description = "Daily article limit reached", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_article(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<NewArticle>,
) -> Result<Json<Article>, ApiError> {
    let user = state.current_user(&headers).await?;
    let article = community::publish_article(state.db_pool(), &user, &request).await?;
    Ok(Json(article))
}

#[utoipa::path(
    put,
    path = "/api/v1/articles/{article_id}",
    tag = "Articles",
    security(("bearerAuth" = [])),
    params(("article_id" = String, Path, description = "Article id")),
    request_body = UpdateArticle,
    responses(
        (status = 200, description = "Article updated", body = Article),
        (status = 403, description = "Not the author", body = crate::error::ErrorResponse),
        (status = 404, description = "Article not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_article(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(article_id): Path<String>,
    Json(request): Json<UpdateArticle>,
) -> Result<Json<Article>, ApiError> {
    let user = state.current_user(&headers).await?;
    community::owned_article(state.db_pool(), &user, &article_id, "update").await?;

    let article = ArticleRepository::new(state.db_pool().clone())
        .update(&article_id, &request)
        .await?;
    Ok(Json(article))
}

#[utoipa::path(
    delete,
    path = "/api/v1/articles/{article_id}",
    tag = "Articles",
    security(("bearerAuth" = [])),
    params(("article_id" = String, Path, description = "Article id")),
    responses(
        (status = 200, description = "Article deleted", body = MessageResponse),
        (status = 403, description = "Not the author", body = crate::error::ErrorResponse),
        (status = 404, description = "Article not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_article(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(article_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let user = state.current_user(&headers).await?;
    community::owned_article(state.db_pool(), &user, &article_id, "delete").await?;

    ArticleRepository::new(state.db_pool().clone())
        .delete(&article_id)
        .await?;
    Ok(MessageResponse::new("Article deleted"))
}

#[utoipa::path(
    post,
    path = "/api/v1/articles/{article_id}/like",
    tag = "Articles",
    security(("bearerAuth" = [])),
    params(("article_id" = String, Path, description = "Article id")),
    responses(
        (status = 200, description = "Like toggled", body = LikeResponse),
        (status = 404, description = "Article not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn toggle_like(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(article_id): Path<String>,
) -> Result<Json<LikeResponse>, ApiError> {
    let user = state.current_user(&headers).await?;
    let status = community::toggle_like(state.db_pool(), &user, &article_id).await?;
    Ok(Json(LikeResponse { status }))
}
