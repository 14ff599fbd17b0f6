//! Vocabulary practice.

use lanxpert_database::{today, QuotaKind, User, Word, WordRepository};
use sqlx::SqlitePool;
use tracing::debug;

use super::error::{ServiceError, ServiceResult};
use super::{gamification, quota};

/// Draw a random word for `user`, charging one word from today's quota.
///
/// The first time a word is seen it is logged and earns XP. The streak moves
/// on every draw.
pub async fn draw_random_word(pool: &SqlitePool, user: &User) -> ServiceResult<Word> {
    let day = today();
    let mut tx = pool.begin().await?;

    quota::consume(&mut tx, user, QuotaKind::Words, day).await?;

    let word = WordRepository::random_in(&mut tx, user.target_language_id.as_deref())
        .await?
        .ok_or_else(|| ServiceError::not_found("No words found in the database. Please contact admin."))?;

    let first_view = WordRepository::log_view_in(&mut tx, &user.id, &word.id).await?;
    let xp = if first_view { gamification::WORD_XP } else { 0 };
    gamification::record_activity(&mut tx, &user.id, xp, day).await?;

    tx.commit().await?;
    debug!(user_id = %user.id, word_id = %word.id, first_view, "word drawn");
    Ok(word)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_utils::{create_test_db, create_user};
    use lanxpert_database::{LanguageRepository, NewWord, UserRepository};

    #[tokio::test]
    async fn sixth_word_on_free_plan_is_refused() {
        let (pool, _dir) = create_test_db().await;
        let english = LanguageRepository::new(pool.clone()).find_by_code("en").await.unwrap().unwrap();
        WordRepository::new(pool.clone())
            .create(&NewWord {
                language_id: english.id,
                target_language_id: None,
                word: "apple".into(),
                meaning: "elma".into(),
                part_of_speech: Some("noun".into()),
                level: Some("A1".into()),
            })
            .await
            .unwrap();
        let user = create_user(&pool, "learner").await;

        for _ in 0..5 {
            draw_random_word(&pool, &user).await.unwrap();
        }
        let err = draw_random_word(&pool, &user).await.unwrap_err();
        assert!(
            matches!(err, ServiceError::QuotaExceeded(ref m) if m == "Free plan limit reached (5 words/day). Please upgrade.")
        );

        // Only the first sighting of the single word pays XP.
        let stored = UserRepository::new(pool.clone()).find_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(stored.xp, gamification::WORD_XP);
        assert_eq!(stored.streak_days, 1);
    }

    #[tokio::test]
    async fn empty_catalogue_does_not_spend_quota() {
        let (pool, _dir) = create_test_db().await;
        let user = create_user(&pool, "early").await;

        let err = draw_random_word(&pool, &user).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let usage = lanxpert_database::LimitRepository::new(pool.clone())
            .usage(&user.id, today())
            .await
            .unwrap();
        assert_eq!(usage.used_words, 0);
    }
}
