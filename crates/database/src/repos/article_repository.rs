//! Articles and article likes.

use sqlx::{SqliteConnection, SqlitePool};

use crate::entities::article::{Article, ArticleView, NewArticle, UpdateArticle};
use crate::types::{new_id, now_timestamp, DatabaseError, DatabaseResult};

const ARTICLE_COLUMNS: &str = "id, user_id, language_id, title, content, is_published, created_at, updated_at";

const ARTICLE_VIEW_SELECT: &str = r#"
    SELECT ar.id, ar.user_id, u.username AS author_username, ar.language_id, ar.title, ar.content,
           ar.is_published,
           (SELECT COUNT(*) FROM article_likes l WHERE l.article_id = ar.id) AS like_count,
           EXISTS(SELECT 1 FROM article_likes l WHERE l.article_id = ar.id AND l.user_id = ?) AS is_liked,
           ar.created_at, ar.updated_at
    FROM articles ar
    JOIN users u ON u.id = ar.user_id
"#;

#[derive(Clone)]
pub struct ArticleRepository {
    pool: SqlitePool,
}

impl ArticleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Newest first. Drafts are visible only to their author.
    pub async fn list(
        &self,
        author_id: Option<&str>,
        viewer: Option<&str>,
        skip: i64,
        limit: i64,
    ) -> DatabaseResult<Vec<ArticleView>> {
        let articles = sqlx::query_as::<_, ArticleView>(&format!(
            r#"
            {ARTICLE_VIEW_SELECT}
            WHERE (ar.is_published = 1 OR ar.user_id = COALESCE(?, ''))
              AND (? IS NULL OR ar.user_id = ?)
            ORDER BY ar.created_at DESC, ar.rowid DESC
            LIMIT ? OFFSET ?
            "#
        ))
        .bind(viewer)
        .bind(viewer)
        .bind(author_id)
        .bind(author_id)
        .bind(limit)
        .bind(skip)
        .fetch_all(&self.pool)
        .await?;
        Ok(articles)
    }

    /// Every article regardless of publication state, for moderation.
    pub async fn list_all(&self, skip: i64, limit: i64) -> DatabaseResult<Vec<ArticleView>> {
        let articles = sqlx::query_as::<_, ArticleView>(&format!(
            "{ARTICLE_VIEW_SELECT} ORDER BY ar.created_at DESC, ar.rowid DESC LIMIT ? OFFSET ?"
        ))
        .bind(None::<String>)
        .bind(limit)
        .bind(skip)
        .fetch_all(&self.pool)
        .await?;
        Ok(articles)
    }

    pub async fn find_view(&self, id: &str, viewer: Option<&str>) -> DatabaseResult<Option<ArticleView>> {
        let article = sqlx::query_as::<_, ArticleView>(&format!(
            "{ARTICLE_VIEW_SELECT} WHERE ar.id = ? AND (ar.is_published = 1 OR ar.user_id = COALESCE(?, ''))"
        ))
        .bind(viewer)
        .bind(id)
        .bind(viewer)
        .fetch_optional(&self.pool)
        .await?;
        Ok(article)
    }

    pub async fn find_by_id(&self, id: &str) -> DatabaseResult<Option<Article>> {
        let article = sqlx::query_as::<_, Article>(&format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(article)
    }

    pub async fn insert_in(
        conn: &mut SqliteConnection,
        user_id: &str,
        request: &NewArticle,
    ) -> DatabaseResult<Article> {
        let id = new_id();
        let now = now_timestamp();

        sqlx::query(
            r#"
            INSERT INTO articles (id, user_id, language_id, title, content, is_published, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(&request.language_id)
        .bind(request.title.trim())
        .bind(&request.content)
        .bind(request.is_published.unwrap_or(true))
        .bind(&now)
        .bind(&now)
        .execute(&mut *conn)
        .await?;

        let article = sqlx::query_as::<_, Article>(&format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = ?"))
            .bind(&id)
            .fetch_one(&mut *conn)
            .await?;
        Ok(article)
    }

    pub async fn update(&self, id: &str, request: &UpdateArticle) -> DatabaseResult<Article> {
        let result = sqlx::query(
            r#"
            UPDATE articles
            SET language_id = COALESCE(?, language_id),
                title = COALESCE(?, title),
                content = COALESCE(?, content),
                is_published = COALESCE(?, is_published),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&request.language_id)
        .bind(request.title.as_deref().map(str::trim))
        .bind(&request.content)
        .bind(request.is_published)
        .bind(now_timestamp())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("Article"));
        }
        self.find_by_id(id).await?.ok_or(DatabaseError::NotFound("Article"))
    }

    /// Hard delete; likes cascade.
    pub async fn delete(&self, id: &str) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM articles WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Flip the like state for `user_id`. Returns `true` when the article is now liked.
    pub async fn toggle_like_in(conn: &mut SqliteConnection, article_id: &str, user_id: &str) -> DatabaseResult<bool> {
        let removed = sqlx::query("DELETE FROM article_likes WHERE article_id = ? AND user_id = ?")
            .bind(article_id)
            .bind(user_id)
            .execute(&mut *conn)
            .await?;

        if removed.rows_affected() > 0 {
            return Ok(false);
        }

        sqlx::query("INSERT INTO article_likes (id, article_id, user_id, created_at) VALUES (?, ?, ?, ?)")
            .bind(new_id())
            .bind(article_id)
            .bind(user_id)
            .bind(now_timestamp())
            .execute(&mut *conn)
            .await?;
        Ok(true)
    }

    pub async fn count(&self) -> DatabaseResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM articles")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
