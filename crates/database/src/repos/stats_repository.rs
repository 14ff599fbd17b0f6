//! Per-learner activity figures for the dashboard.

use sqlx::SqlitePool;

use crate::entities::stats::ActivityItem;
use crate::types::DatabaseResult;

#[derive(Clone)]
pub struct StatsRepository {
    pool: SqlitePool,
}

impl StatsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Distinct words the learner has studied, optionally only since `since`.
    pub async fn vocabulary_count(&self, user_id: &str, since: Option<&str>) -> DatabaseResult<i64> {
        let count = sqlx::query_scalar(
            "SELECT COUNT(*) FROM word_logs WHERE user_id = ? AND (? IS NULL OR created_at >= ?)",
        )
        .bind(user_id)
        .bind(since)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    pub async fn question_count(&self, user_id: &str, since: Option<&str>) -> DatabaseResult<i64> {
        let count = sqlx::query_scalar(
            "SELECT COUNT(*) FROM questions WHERE user_id = ? AND (? IS NULL OR created_at >= ?)",
        )
        .bind(user_id)
        .bind(since)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    pub async fn article_count(&self, user_id: &str) -> DatabaseResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM articles WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// The learner's latest questions and articles merged, newest first.
    pub async fn recent_activity(&self, user_id: &str, limit: i64) -> DatabaseResult<Vec<ActivityItem>> {
        let items = sqlx::query_as::<_, ActivityItem>(
            r#"
            SELECT kind, id, title, created_at FROM (
                SELECT 'question' AS kind, id, question_text AS title, created_at
                FROM questions WHERE user_id = ?
                UNION ALL
                SELECT 'article' AS kind, id, title, created_at
                FROM articles WHERE user_id = ?
            )
            ORDER BY created_at DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::article::NewArticle;
    use crate::entities::question::NewQuestion;
    use crate::repos::{ArticleRepository, QuestionRepository, UserRepository};
    use crate::test_support::migrated_pool;

    #[tokio::test]
    async fn activity_merges_questions_and_articles() {
        let (pool, _dir) = migrated_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let user = UserRepository::insert(&mut conn, "alice", "alice@example.com", "hash").await.unwrap();
        QuestionRepository::insert_in(
            &mut conn,
            &user.id,
            &NewQuestion {
                source_language_id: None,
                target_language_id: None,
                question_text: "How do I say hello?".into(),
                description: None,
            },
        )
        .await
        .unwrap();
        ArticleRepository::insert_in(
            &mut conn,
            &user.id,
            &NewArticle {
                language_id: None,
                title: "My first week".into(),
                content: "...".into(),
                is_published: None,
            },
        )
        .await
        .unwrap();
        drop(conn);

        let repo = StatsRepository::new(pool);
        let items = repo.recent_activity(&user.id, 5).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].kind, "article");
        assert_eq!(items[1].kind, "question");

        assert_eq!(repo.recent_activity(&user.id, 1).await.unwrap().len(), 1);
        assert_eq!(repo.question_count(&user.id, None).await.unwrap(), 1);
        assert_eq!(repo.question_count(&user.id, Some("2999-01-01")).await.unwrap(), 0);
        assert_eq!(repo.article_count(&user.id).await.unwrap(), 1);
    }
}
