use chrono::Duration;
use lanxpert_database::{today, StatsRepository, User};
use serde::Serialize;
use sqlx::SqlitePool;
use utoipa::ToSchema;

use super::error::ServiceResult;
use super::gamification::{self, level_progress, next_level_goal};
use crate::util::truncate_with_ellipsis;

const ACTIVITY_TITLE_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct OverviewStats {
    pub total_vocabulary: i64,
    pub vocab_this_week: i64,
    pub total_questions: i64,
    pub questions_this_week: i64,
    pub total_articles: i64,
    pub current_streak: i64,
    pub xp: i64,
    pub level: String,
    pub next_level_goal: i64,
    pub level_progress: i64,
}

pub async fn overview(pool: &SqlitePool, user: &User) -> ServiceResult<OverviewStats> {
    let stats = StatsRepository::new(pool.clone());
    let week_ago = (today() - Duration::days(7)).to_string();

    Ok(OverviewStats {
        total_vocabulary: stats.vocabulary_count(&user.id, None).await?,
        vocab_this_week: stats.vocabulary_count(&user.id, Some(&week_ago)).await?,
        total_questions: stats.question_count(&user.id, None).await?,
        questions_this_week: stats.question_count(&user.id, Some(&week_ago)).await?,
        total_articles: stats.article_count(&user.id).await?,
        current_streak: user.streak_days,
        xp: user.xp,
        level: user.current_level.clone(),
        next_level_goal: next_level_goal(user.xp),
        level_progress: level_progress(user.xp),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ActivityEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    pub title: String,
    pub date: String,
    pub xp: i64,
}

/// The learner's latest questions and articles, newest first.
pub async fn recent_activity(pool: &SqlitePool, user: &User, limit: i64) -> ServiceResult<Vec<ActivityEntry>> {
    let items = StatsRepository::new(pool.clone())
        .recent_activity(&user.id, limit)
        .await?;

    Ok(items
        .into_iter()
        .map(|item| {
            let (title, xp) = if item.kind == "question" {
                (truncate_with_ellipsis(&item.title, ACTIVITY_TITLE_CHARS), gamification::QUESTION_XP)
            } else {
                (item.title, gamification::ARTICLE_XP)
            };
            ActivityEntry {
                kind: item.kind,
                id: item.id,
                title,
                date: item.created_at,
                xp,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::community::{ask_question, publish_article};
    use crate::services::test_utils::{create_test_db, create_user};
    use lanxpert_database::{NewArticle, NewQuestion, UserRepository};

    #[tokio::test]
    async fn overview_and_activity_reflect_posts() {
        let (pool, _dir) = create_test_db().await;
        let user = create_user(&pool, "writer").await;

        let long = "a".repeat(60);
        ask_question(
            &pool,
            &user,
            &NewQuestion {
                source_language_id: None,
                target_language_id: None,
                question_text: long.clone(),
                description: None,
            },
        )
        .await
        .unwrap();
        publish_article(
            &pool,
            &user,
            &NewArticle {
                language_id: None,
                title: "Diary".into(),
                content: "Day one".into(),
                is_published: None,
            },
        )
        .await
        .unwrap();

        let user = UserRepository::new(pool.clone()).find_by_id(&user.id).await.unwrap().unwrap();
        let stats = overview(&pool, &user).await.unwrap();
        assert_eq!(stats.total_questions, 1);
        assert_eq!(stats.questions_this_week, 1);
        assert_eq!(stats.total_articles, 1);
        assert_eq!(stats.total_vocabulary, 0);
        assert_eq!(stats.xp, 60);
        assert_eq!(stats.next_level_goal, 500);
        assert_eq!(stats.level_progress, 12);
        assert_eq!(stats.current_streak, 1);

        let activity = recent_activity(&pool, &user, 5).await.unwrap();
        assert_eq!(activity.len(), 2);
        assert_eq!(activity[0].kind, "article");
        assert_eq!(activity[1].title, format!("{}...", "a".repeat(50)));

        assert_eq!(recent_activity(&pool, &user, 1).await.unwrap().len(), 1);
    }
}
