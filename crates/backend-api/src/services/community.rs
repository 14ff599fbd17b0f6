//! Questions, answers and articles: the writes that cost quota, earn XP or
//! notify another learner.

use lanxpert_database::{
    today, Answer, AnswerRepository, Article, ArticleRepository, NewAnswer, NewArticle, NewQuestion,
    NotificationRepository, Question, QuestionRepository, QuotaKind, User,
};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;
use utoipa::ToSchema;

use super::error::{ServiceError, ServiceResult};
use super::{gamification, quota};

const ANSWER_PREVIEW_CHARS: usize = 30;

pub async fn ask_question(pool: &SqlitePool, user: &User, request: &NewQuestion) -> ServiceResult<Question> {
    if request.question_text.trim().is_empty() {
        return Err(ServiceError::bad_request("Question text is required"));
    }

    let day = today();
    let mut tx = pool.begin().await?;
    quota::consume(&mut tx, user, QuotaKind::Questions, day).await?;
    let question = QuestionRepository::insert_in(&mut tx, &user.id, request).await?;
    gamification::record_activity(&mut tx, &user.id, gamification::QUESTION_XP, day).await?;
    tx.commit().await?;

    info!(user_id = %user.id, question_id = %question.id, "question posted");
    Ok(question)
}

/// Post an answer and let the asker know, unless they answered themselves.
pub async fn answer_question(pool: &SqlitePool, user: &User, request: &NewAnswer) -> ServiceResult<Answer> {
    if request.answer_text.trim().is_empty() {
        return Err(ServiceError::bad_request("Answer text is required"));
    }
    let question = QuestionRepository::new(pool.clone())
        .find_by_id(&request.question_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Question not found"))?;

    let day = today();
    let mut tx = pool.begin().await?;
    quota::consume(&mut tx, user, QuotaKind::Answers, day).await?;
    let answer = AnswerRepository::insert_in(&mut tx, &user.id, request).await?;
    gamification::record_activity(&mut tx, &user.id, gamification::ANSWER_XP, day).await?;

    if question.user_id != user.id {
        let preview: String = question.question_text.chars().take(ANSWER_PREVIEW_CHARS).collect();
        let message = format!("{} answered your question: {preview}...", user.username);
        NotificationRepository::insert_in(&mut tx, &question.user_id, "New Answer", &message).await?;
    }
    tx.commit().await?;

    Ok(answer)
}

pub async fn publish_article(pool: &SqlitePool, user: &User, request: &NewArticle) -> ServiceResult<Article> {
    if request.title.trim().is_empty() || request.content.trim().is_empty() {
        return Err(ServiceError::bad_request("Title and content are required"));
    }

    let day = today();
    let mut tx = pool.begin().await?;
    quota::consume(&mut tx, user, QuotaKind::Articles, day).await?;
    let article = ArticleRepository::insert_in(&mut tx, &user.id, request).await?;
    gamification::record_activity(&mut tx, &user.id, gamification::ARTICLE_XP, day).await?;
    tx.commit().await?;

    info!(user_id = %user.id, article_id = %article.id, "article published");
    Ok(article)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LikeStatus {
    Liked,
    Unliked,
}

/// Flip the caller's like. A new like on someone else's article notifies its author.
pub async fn toggle_like(pool: &SqlitePool, user: &User, article_id: &str) -> ServiceResult<LikeStatus> {
    let article = ArticleRepository::new(pool.clone())
        .find_by_id(article_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Article not found"))?;

    let mut tx = pool.begin().await?;
    let liked = ArticleRepository::toggle_like_in(&mut tx, article_id, &user.id).await?;
    if liked && article.user_id != user.id {
        let message = format!("{} liked your article: {}", user.username, article.title);
        NotificationRepository::insert_in(&mut tx, &article.user_id, "New Like", &message).await?;
    }
    tx.commit().await?;

    Ok(if liked { LikeStatus::Liked } else { LikeStatus::Unliked })
}

/// Load a question and make sure `user` wrote it.
pub async fn owned_question(pool: &SqlitePool, user: &User, id: &str, action: &str) -> ServiceResult<Question> {
    let question = QuestionRepository::new(pool.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Question not found"))?;
    if question.user_id != user.id {
        return Err(ServiceError::forbidden(format!("Not authorized to {action} this question")));
    }
    Ok(question)
}

pub async fn owned_answer(pool: &SqlitePool, user: &User, id: &str, action: &str) -> ServiceResult<Answer> {
    let answer = AnswerRepository::new(pool.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Answer not found"))?;
    if answer.user_id != user.id {
        return Err(ServiceError::forbidden(format!("Not authorized to {action} this answer")));
    }
    Ok(answer)
}

pub async fn owned_article(pool: &SqlitePool, user: &User, id: &str, action: &str) -> ServiceResult<Article> {
    let article = ArticleRepository::new(pool.clone())
        .find_by_id(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Article not found"))?;
    if article.user_id != user.id {
        return Err(ServiceError::forbidden(format!("Not authorized to {action} this article")));
    }
    Ok(article)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_utils::{create_test_db, create_user};
    use lanxpert_database::UserRepository;

    fn question(text: &str) -> NewQuestion {
        NewQuestion {
            source_language_id: None,
            target_language_id: None,
            question_text: text.into(),
            description: None,
        }
    }

    #[tokio::test]
    async fn answers_notify_the_asker_but_not_self_answers() {
        let (pool, _dir) = create_test_db().await;
        let asker = create_user(&pool, "asker").await;
        let helper = create_user(&pool, "helper").await;

        let q = ask_question(&pool, &asker, &question("How do I say good morning in Turkish?"))
            .await
            .unwrap();
        let request = NewAnswer {
            question_id: q.id.clone(),
            answer_text: "Günaydın".into(),
            context_tags: None,
        };
        answer_question(&pool, &helper, &request).await.unwrap();
        answer_question(&pool, &asker, &request).await.unwrap();

        let notifications = NotificationRepository::new(pool.clone())
            .list_for_user(&asker.id, false, 0, 10)
            .await
            .unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].title, "New Answer");
        assert_eq!(
            notifications[0].message,
            "helper answered your question: How do I say good morning in T..."
        );

        let helper = UserRepository::new(pool.clone()).find_by_id(&helper.id).await.unwrap().unwrap();
        assert_eq!(helper.xp, gamification::ANSWER_XP);
    }

    #[tokio::test]
    async fn answering_a_missing_question_is_not_found() {
        let (pool, _dir) = create_test_db().await;
        let user = create_user(&pool, "lost").await;
        let request = NewAnswer {
            question_id: "nope".into(),
            answer_text: "hello".into(),
            context_tags: None,
        };
        assert!(matches!(
            answer_question(&pool, &user, &request).await.unwrap_err(),
            ServiceError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn free_plan_allows_one_article_per_day() {
        let (pool, _dir) = create_test_db().await;
        let author = create_user(&pool, "author").await;
        let request = NewArticle {
            language_id: None,
            title: "My first week".into(),
            content: "Learning is fun".into(),
            is_published: None,
        };

        publish_article(&pool, &author, &request).await.unwrap();
        assert!(matches!(
            publish_article(&pool, &author, &request).await.unwrap_err(),
            ServiceError::QuotaExceeded(_)
        ));

        let author = UserRepository::new(pool.clone()).find_by_id(&author.id).await.unwrap().unwrap();
        assert_eq!(author.xp, gamification::ARTICLE_XP);
    }

    #[tokio::test]
    async fn likes_toggle_and_notify_once() {
        let (pool, _dir) = create_test_db().await;
        let author = create_user(&pool, "author").await;
        let fan = create_user(&pool, "fan").await;
        let article = publish_article(
            &pool,
            &author,
            &NewArticle {
                language_id: None,
                title: "Idioms".into(),
                content: "Break a leg".into(),
                is_published: Some(true),
            },
        )
        .await
        .unwrap();

        assert_eq!(toggle_like(&pool, &fan, &article.id).await.unwrap(), LikeStatus::Liked);
        assert_eq!(toggle_like(&pool, &fan, &article.id).await.unwrap(), LikeStatus::Unliked);
        assert_eq!(toggle_like(&pool, &author, &article.id).await.unwrap(), LikeStatus::Liked);

        let notifications = NotificationRepository::new(pool.clone())
            .list_for_user(&author.id, false, 0, 10)
            .await
            .unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].message, "fan liked your article: Idioms");

        assert!(matches!(
            toggle_like(&pool, &fan, "missing").await.unwrap_err(),
            ServiceError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn only_owners_pass_the_ownership_checks() {
        let (pool, _dir) = create_test_db().await;
        let owner = create_user(&pool, "owner").await;
        let other = create_user(&pool, "other").await;
        let q = ask_question(&pool, &owner, &question("Ser or estar?")).await.unwrap();

        owned_question(&pool, &owner, &q.id, "delete").await.unwrap();
        let err = owned_question(&pool, &other, &q.id, "delete").await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(ref m) if m == "Not authorized to delete this question"));
    }
}
