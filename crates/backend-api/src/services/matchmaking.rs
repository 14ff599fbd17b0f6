//! Random partner matching over `random_queue` chats.

use std::collections::HashSet;

use lanxpert_database::{ChatDetail, ChatRepository, ChatType, QueueCandidate, User};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;
use utoipa::ToSchema;

use super::error::{ServiceError, ServiceResult};

/// How a random chat request was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// The caller was already waiting; their queue is returned unchanged.
    AlreadyWaiting,
    /// The caller joined a waiting learner.
    Matched,
    /// Nobody suitable was waiting; a new queue was opened.
    Queued,
}

#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub status: MatchStatus,
    pub chat: ChatDetail,
}

/// Pick the queue to join.
///
/// Only queues with exactly one other learner are eligible, and never one
/// holding an `excluded` user. A learner whose native language is the caller's
/// target wins; otherwise the oldest eligible queue is used.
pub fn select_match<'a>(
    candidates: &'a [QueueCandidate],
    caller_id: &str,
    target_language_id: &str,
    excluded: &HashSet<String>,
) -> Option<&'a QueueCandidate> {
    let mut fallback = None;

    for candidate in candidates {
        if candidate.participant_count != 1
            || candidate.user_id == caller_id
            || excluded.contains(&candidate.user_id)
        {
            continue;
        }

        if candidate.native_language_id.as_deref() == Some(target_language_id) {
            return Some(candidate);
        }
        fallback.get_or_insert(candidate);
    }

    fallback
}

/// Find a partner for `user` or put them in the queue, in one transaction.
pub async fn join_random_chat(pool: &SqlitePool, user: &User) -> ServiceResult<MatchOutcome> {
    let Some(target_language_id) = user.target_language_id.as_deref() else {
        return Err(ServiceError::bad_request(
            "Please set your target language in settings first.",
        ));
    };

    let mut tx = pool.begin().await?;

    if let Some(chat_id) = ChatRepository::waiting_queue_in(&mut tx, &user.id).await? {
        let chat = ChatRepository::detail_in(&mut tx, &chat_id).await?;
        tx.commit().await?;
        return Ok(MatchOutcome {
            status: MatchStatus::AlreadyWaiting,
            chat,
        });
    }

    let mut excluded: HashSet<String> = ChatRepository::partner_ids_in(&mut tx, &user.id)
        .await?
        .into_iter()
        .collect();
    excluded.extend(ChatRepository::blocked_ids_in(&mut tx, &user.id).await?);

    let candidates = ChatRepository::queue_candidates_in(&mut tx).await?;

    let outcome = match select_match(&candidates, &user.id, target_language_id, &excluded) {
        Some(candidate) => {
            ChatRepository::set_type_in(&mut tx, &candidate.chat_id, ChatType::Random).await?;
            ChatRepository::add_participant_in(&mut tx, &candidate.chat_id, &user.id).await?;

            let requested = language_name_in(&mut tx, Some(target_language_id)).await?;
            let spoken = language_name_in(&mut tx, candidate.native_language_id.as_deref()).await?;
            let notice = format!("Connected! You requested {requested}. Partner speaks {spoken}.");
            ChatRepository::insert_message_in(&mut tx, &candidate.chat_id, None, &notice).await?;

            info!(user_id = %user.id, partner_id = %candidate.user_id, chat_id = %candidate.chat_id, "random chat matched");
            MatchOutcome {
                status: MatchStatus::Matched,
                chat: ChatRepository::detail_in(&mut tx, &candidate.chat_id).await?,
            }
        }
        None => {
            let chat = ChatRepository::create_in(&mut tx, ChatType::RandomQueue).await?;
            ChatRepository::add_participant_in(&mut tx, &chat.id, &user.id).await?;

            info!(user_id = %user.id, chat_id = %chat.id, "queued for random chat");
            MatchOutcome {
                status: MatchStatus::Queued,
                chat: ChatRepository::detail_in(&mut tx, &chat.id).await?,
            }
        }
    };

    tx.commit().await?;
    Ok(outcome)
}

async fn language_name_in(conn: &mut SqliteConnection, id: Option<&str>) -> ServiceResult<String> {
    let Some(id) = id else {
        return Ok("Unknown".to_string());
    };
    let name: Option<String> = sqlx::query_scalar("SELECT name FROM languages WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(name.unwrap_or_else(|| "Unknown".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_utils::{create_test_db, create_user, set_languages};

    fn candidate(chat: &str, user: &str, native: Option<&str>, count: i64) -> QueueCandidate {
        QueueCandidate {
            chat_id: chat.into(),
            user_id: user.into(),
            native_language_id: native.map(str::to_string),
            participant_count: count,
            created_at: "2024-01-01T00:00:00.000000Z".into(),
        }
    }

    #[test]
    fn prefers_native_speakers_of_the_target_language() {
        let candidates = vec![
            candidate("c1", "u1", Some("fr"), 1),
            candidate("c2", "u2", Some("es"), 1),
        ];
        let picked = select_match(&candidates, "me", "es", &HashSet::new()).unwrap();
        assert_eq!(picked.chat_id, "c2");
    }

    #[test]
    fn falls_back_to_the_oldest_eligible_queue() {
        let candidates = vec![
            candidate("c1", "u1", None, 1),
            candidate("c2", "u2", Some("fr"), 1),
        ];
        let picked = select_match(&candidates, "me", "es", &HashSet::new()).unwrap();
        assert_eq!(picked.chat_id, "c1");
    }

    #[test]
    fn skips_self_partners_blocked_and_crowded_queues() {
        let candidates = vec![
            candidate("mine", "me", Some("es"), 1),
            candidate("crowded", "u1", Some("es"), 2),
            candidate("old-friend", "u2", Some("es"), 1),
        ];
        let excluded = HashSet::from(["u2".to_string()]);
        assert!(select_match(&candidates, "me", "es", &excluded).is_none());
    }

    #[tokio::test]
    async fn compatible_learners_are_matched_once() {
        let (pool, _dir) = create_test_db().await;
        let ana = create_user(&pool, "ana").await;
        let ana = set_languages(&pool, &ana, Some("es"), Some("en")).await;
        let bob = create_user(&pool, "bob").await;
        let bob = set_languages(&pool, &bob, Some("en"), Some("es")).await;

        let first = join_random_chat(&pool, &ana).await.unwrap();
        assert_eq!(first.status, MatchStatus::Queued);
        assert_eq!(first.chat.chat_type, ChatType::RandomQueue);

        let again = join_random_chat(&pool, &ana).await.unwrap();
        assert_eq!(again.status, MatchStatus::AlreadyWaiting);
        assert_eq!(again.chat.id, first.chat.id);

        let matched = join_random_chat(&pool, &bob).await.unwrap();
        assert_eq!(matched.status, MatchStatus::Matched);
        assert_eq!(matched.chat.id, first.chat.id);
        assert_eq!(matched.chat.chat_type, ChatType::Random);
        assert_eq!(matched.chat.participants.len(), 2);
        let notice = matched.chat.last_message.unwrap();
        assert!(notice.is_system());
        assert_eq!(notice.content, "Connected! You requested Spanish. Partner speaks Spanish.");

        // Both now share a chat, so a fresh request queues instead of re-matching.
        let ana_again = join_random_chat(&pool, &ana).await.unwrap();
        assert_eq!(ana_again.status, MatchStatus::Queued);
        let bob_again = join_random_chat(&pool, &bob).await.unwrap();
        assert_eq!(bob_again.status, MatchStatus::Queued);
        assert_ne!(ana_again.chat.id, bob_again.chat.id);
    }

    #[tokio::test]
    async fn a_target_language_is_required() {
        let (pool, _dir) = create_test_db().await;
        let user = create_user(&pool, "nolang").await;

        let err = join_random_chat(&pool, &user).await.unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(_)));
    }

    #[tokio::test]
    async fn blocked_learners_are_not_matched() {
        let (pool, _dir) = create_test_db().await;
        let ana = create_user(&pool, "ana").await;
        let ana = set_languages(&pool, &ana, Some("es"), Some("en")).await;
        let bob = create_user(&pool, "bob").await;
        let bob = set_languages(&pool, &bob, Some("en"), Some("es")).await;

        ChatRepository::new(pool.clone()).block(&ana.id, &bob.id).await.unwrap();

        join_random_chat(&pool, &ana).await.unwrap();
        let outcome = join_random_chat(&pool, &bob).await.unwrap();
        assert_eq!(outcome.status, MatchStatus::Queued);
    }
}
