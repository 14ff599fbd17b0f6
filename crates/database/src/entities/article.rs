use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct Article {
    pub id: String,
    pub user_id: String,
    pub language_id: Option<String>,
    pub title: String,
    pub content: String,
    pub is_published: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct ArticleView {
    pub id: String,
    pub user_id: String,
    pub author_username: String,
    pub language_id: Option<String>,
    pub title: String,
    pub content: String,
    pub is_published: bool,
    pub like_count: i64,
    pub is_liked: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewArticle {
    pub language_id: Option<String>,
    pub title: String,
    pub content: String,
    pub is_published: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateArticle {
    pub language_id: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub is_published: Option<bool>,
}
