//! Repository for chats, participants, messages, blocks and user reports.

use sqlx::{SqliteConnection, SqlitePool};

use crate::entities::chat::{
    Chat, ChatDetail, ChatParticipantView, ChatType, Message, QueueCandidate, UserReport,
};
use crate::types::{new_id, now_timestamp, DatabaseError, DatabaseResult};

const MESSAGE_COLUMNS: &str = "id, chat_id, sender_id, content, created_at";
const REPORT_COLUMNS: &str = "id, reporter_id, reported_id, reason, description, status, created_at";

#[derive(Clone)]
pub struct ChatRepository {
    pool: SqlitePool,
}

impl ChatRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Chats the user takes part in, most recently active first.
    pub async fn list_for_user(&self, user_id: &str, skip: i64, limit: i64) -> DatabaseResult<Vec<ChatDetail>> {
        let mut conn = self.pool.acquire().await?;
        let chats = sqlx::query_as::<_, Chat>(
            r#"
            SELECT c.id, c.chat_type, c.created_at, c.updated_at
            FROM chats c
            JOIN chat_participants p ON p.chat_id = c.id
            WHERE p.user_id = ?
            ORDER BY c.updated_at DESC, c.rowid DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(skip)
        .fetch_all(&mut *conn)
        .await?;

        let mut details = Vec::with_capacity(chats.len());
        for chat in chats {
            details.push(Self::assemble_in(&mut conn, chat).await?);
        }
        Ok(details)
    }

    pub async fn find_by_id(&self, id: &str) -> DatabaseResult<Option<Chat>> {
        let mut conn = self.pool.acquire().await?;
        Self::find_by_id_in(&mut conn, id).await
    }

    pub async fn find_by_id_in(conn: &mut SqliteConnection, id: &str) -> DatabaseResult<Option<Chat>> {
        let chat = sqlx::query_as::<_, Chat>("SELECT id, chat_type, created_at, updated_at FROM chats WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(chat)
    }

    pub async fn detail_in(conn: &mut SqliteConnection, id: &str) -> DatabaseResult<ChatDetail> {
        let chat = Self::find_by_id_in(conn, id)
            .await?
            .ok_or(DatabaseError::NotFound("Chat"))?;
        Self::assemble_in(conn, chat).await
    }

    async fn assemble_in(conn: &mut SqliteConnection, chat: Chat) -> DatabaseResult<ChatDetail> {
        let participants = Self::participants_in(conn, &chat.id).await?;
        let last_message = sqlx::query_as::<_, Message>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE chat_id = ? ORDER BY created_at DESC, rowid DESC LIMIT 1"
        ))
        .bind(&chat.id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(ChatDetail {
            id: chat.id,
            chat_type: chat.chat_type,
            created_at: chat.created_at,
            updated_at: chat.updated_at,
            participants,
            last_message,
        })
    }

    pub async fn participants_in(conn: &mut SqliteConnection, chat_id: &str) -> DatabaseResult<Vec<ChatParticipantView>> {
        let participants = sqlx::query_as::<_, ChatParticipantView>(
            r#"
            SELECT p.user_id, u.username, u.native_language_id, u.target_language_id, p.joined_at
            FROM chat_participants p
            JOIN users u ON u.id = p.user_id
            WHERE p.chat_id = ?
            ORDER BY p.joined_at ASC, p.rowid ASC
            "#,
        )
        .bind(chat_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(participants)
    }

    pub async fn is_participant(&self, chat_id: &str, user_id: &str) -> DatabaseResult<bool> {
        let mut conn = self.pool.acquire().await?;
        Self::is_participant_in(&mut conn, chat_id, user_id).await
    }

    pub async fn is_participant_in(conn: &mut SqliteConnection, chat_id: &str, user_id: &str) -> DatabaseResult<bool> {
        let exists = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM chat_participants WHERE chat_id = ? AND user_id = ?)",
        )
        .bind(chat_id)
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await?;
        Ok(exists)
    }

    /// Oldest first.
    pub async fn messages(&self, chat_id: &str, skip: i64, limit: i64) -> DatabaseResult<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE chat_id = ? ORDER BY created_at ASC, rowid ASC LIMIT ? OFFSET ?"
        ))
        .bind(chat_id)
        .bind(limit)
        .bind(skip)
        .fetch_all(&self.pool)
        .await?;
        Ok(messages)
    }

    pub async fn create_in(conn: &mut SqliteConnection, chat_type: ChatType) -> DatabaseResult<Chat> {
        let chat = Chat {
            id: new_id(),
            chat_type,
            created_at: now_timestamp(),
            updated_at: now_timestamp(),
        };

        sqlx::query("INSERT INTO chats (id, chat_type, created_at, updated_at) VALUES (?, ?, ?, ?)")
            .bind(&chat.id)
            .bind(chat.chat_type)
            .bind(&chat.created_at)
            .bind(&chat.updated_at)
            .execute(&mut *conn)
            .await?;
        Ok(chat)
    }

    pub async fn add_participant_in(conn: &mut SqliteConnection, chat_id: &str, user_id: &str) -> DatabaseResult<()> {
        sqlx::query("INSERT OR IGNORE INTO chat_participants (chat_id, user_id, joined_at) VALUES (?, ?, ?)")
            .bind(chat_id)
            .bind(user_id)
            .bind(now_timestamp())
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    pub async fn remove_participant_in(conn: &mut SqliteConnection, chat_id: &str, user_id: &str) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM chat_participants WHERE chat_id = ? AND user_id = ?")
            .bind(chat_id)
            .bind(user_id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Change the chat's type and bump `updated_at`.
    pub async fn set_type_in(conn: &mut SqliteConnection, chat_id: &str, chat_type: ChatType) -> DatabaseResult<()> {
        sqlx::query("UPDATE chats SET chat_type = ?, updated_at = ? WHERE id = ?")
            .bind(chat_type)
            .bind(now_timestamp())
            .bind(chat_id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Append a message and bump the chat's `updated_at`. `sender_id = None` posts a
    /// system message.
    pub async fn insert_message_in(
        conn: &mut SqliteConnection,
        chat_id: &str,
        sender_id: Option<&str>,
        content: &str,
    ) -> DatabaseResult<Message> {
        let message = Message {
            id: new_id(),
            chat_id: chat_id.to_string(),
            sender_id: sender_id.map(str::to_string),
            content: content.to_string(),
            created_at: now_timestamp(),
        };

        sqlx::query("INSERT INTO messages (id, chat_id, sender_id, content, created_at) VALUES (?, ?, ?, ?, ?)")
            .bind(&message.id)
            .bind(&message.chat_id)
            .bind(&message.sender_id)
            .bind(&message.content)
            .bind(&message.created_at)
            .execute(&mut *conn)
            .await?;

        sqlx::query("UPDATE chats SET updated_at = ? WHERE id = ?")
            .bind(&message.created_at)
            .bind(chat_id)
            .execute(&mut *conn)
            .await?;
        Ok(message)
    }

    /// Hard delete; participants and messages cascade.
    pub async fn delete_in(conn: &mut SqliteConnection, chat_id: &str) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM chats WHERE id = ?")
            .bind(chat_id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// The queue chat the user is currently waiting in, if any.
    pub async fn waiting_queue_in(conn: &mut SqliteConnection, user_id: &str) -> DatabaseResult<Option<String>> {
        let chat_id = sqlx::query_scalar(
            r#"
            SELECT c.id
            FROM chats c
            JOIN chat_participants p ON p.chat_id = c.id
            WHERE p.user_id = ? AND c.chat_type = 'random_queue'
            ORDER BY c.created_at ASC, c.rowid ASC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(chat_id)
    }

    /// Every non-empty queue chat, oldest first.
    pub async fn queue_candidates_in(conn: &mut SqliteConnection) -> DatabaseResult<Vec<QueueCandidate>> {
        let candidates = sqlx::query_as::<_, QueueCandidate>(
            r#"
            SELECT c.id AS chat_id,
                   MIN(p.user_id) AS user_id,
                   MIN(u.native_language_id) AS native_language_id,
                   COUNT(p.user_id) AS participant_count,
                   c.created_at
            FROM chats c
            JOIN chat_participants p ON p.chat_id = c.id
            JOIN users u ON u.id = p.user_id
            WHERE c.chat_type = 'random_queue'
            GROUP BY c.id, c.created_at
            ORDER BY c.created_at ASC, MIN(c.rowid) ASC
            "#,
        )
        .fetch_all(&mut *conn)
        .await?;
        Ok(candidates)
    }

    /// Everyone the user already shares a chat with.
    pub async fn partner_ids_in(conn: &mut SqliteConnection, user_id: &str) -> DatabaseResult<Vec<String>> {
        let ids = sqlx::query_scalar(
            r#"
            SELECT DISTINCT other.user_id
            FROM chat_participants mine
            JOIN chat_participants other ON other.chat_id = mine.chat_id AND other.user_id != mine.user_id
            WHERE mine.user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(ids)
    }

    /// Users blocked by, or blocking, `user_id`.
    pub async fn blocked_ids_in(conn: &mut SqliteConnection, user_id: &str) -> DatabaseResult<Vec<String>> {
        let ids = sqlx::query_scalar(
            r#"
            SELECT blocked_id FROM blocked_users WHERE blocker_id = ?
            UNION
            SELECT blocker_id FROM blocked_users WHERE blocked_id = ?
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(ids)
    }

    pub async fn is_blocked_between_in(conn: &mut SqliteConnection, a: &str, b: &str) -> DatabaseResult<bool> {
        let blocked = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM blocked_users
                WHERE (blocker_id = ? AND blocked_id = ?) OR (blocker_id = ? AND blocked_id = ?)
            )
            "#,
        )
        .bind(a)
        .bind(b)
        .bind(b)
        .bind(a)
        .fetch_one(&mut *conn)
        .await?;
        Ok(blocked)
    }

    pub async fn find_direct_between_in(conn: &mut SqliteConnection, a: &str, b: &str) -> DatabaseResult<Option<String>> {
        let chat_id = sqlx::query_scalar(
            r#"
            SELECT c.id
            FROM chats c
            JOIN chat_participants pa ON pa.chat_id = c.id AND pa.user_id = ?
            JOIN chat_participants pb ON pb.chat_id = c.id AND pb.user_id = ?
            WHERE c.chat_type = 'direct'
            ORDER BY c.created_at ASC
            LIMIT 1
            "#,
        )
        .bind(a)
        .bind(b)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(chat_id)
    }

    /// Returns `false` when the block already existed.
    pub async fn block(&self, blocker_id: &str, blocked_id: &str) -> DatabaseResult<bool> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO blocked_users (id, blocker_id, blocked_id, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(new_id())
        .bind(blocker_id)
        .bind(blocked_id)
        .bind(now_timestamp())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn unblock(&self, blocker_id: &str, blocked_id: &str) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM blocked_users WHERE blocker_id = ? AND blocked_id = ?")
            .bind(blocker_id)
            .bind(blocked_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn report(
        &self,
        reporter_id: &str,
        reported_id: &str,
        reason: &str,
        description: &str,
    ) -> DatabaseResult<UserReport> {
        let report = UserReport {
            id: new_id(),
            reporter_id: reporter_id.to_string(),
            reported_id: reported_id.to_string(),
            reason: reason.to_string(),
            description: description.to_string(),
            status: "open".to_string(),
            created_at: now_timestamp(),
        };

        sqlx::query(&format!(
            "INSERT INTO user_reports ({REPORT_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(&report.id)
        .bind(&report.reporter_id)
        .bind(&report.reported_id)
        .bind(&report.reason)
        .bind(&report.description)
        .bind(&report.status)
        .bind(&report.created_at)
        .execute(&self.pool)
        .await?;
        Ok(report)
    }

    /// Newest first, optionally restricted to one status.
    pub async fn list_reports(&self, status: Option<&str>, skip: i64, limit: i64) -> DatabaseResult<Vec<UserReport>> {
        let reports = sqlx::query_as::<_, UserReport>(&format!(
            r#"
            SELECT {REPORT_COLUMNS}
            FROM user_reports
            WHERE (? IS NULL OR status = ?)
            ORDER BY created_at DESC, rowid DESC
            LIMIT ? OFFSET ?
            "#
        ))
        .bind(status)
        .bind(status)
        .bind(limit)
        .bind(skip)
        .fetch_all(&self.pool)
        .await?;
        Ok(reports)
    }

    pub async fn set_report_status(&self, id: &str, status: &str) -> DatabaseResult<UserReport> {
        let result = sqlx::query("UPDATE user_reports SET status = ? WHERE id = ?")
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("Report"));
        }

        let report = sqlx::query_as::<_, UserReport>(&format!(
            "SELECT {REPORT_COLUMNS} FROM user_reports WHERE id = ?"
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(report)
    }

    /// Drop empty queue chats and promote queues that somehow hold more than one
    /// participant. Returns `(deleted, promoted)`.
    pub async fn cleanup_queues(&self) -> DatabaseResult<(u64, u64)> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query(
            r#"
            DELETE FROM chats
            WHERE chat_type = 'random_queue'
              AND NOT EXISTS (SELECT 1 FROM chat_participants p WHERE p.chat_id = chats.id)
            "#,
        )
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let promoted = sqlx::query(
            r#"
            UPDATE chats
            SET chat_type = 'random', updated_at = ?
            WHERE chat_type = 'random_queue'
              AND (SELECT COUNT(*) FROM chat_participants p WHERE p.chat_id = chats.id) > 1
            "#,
        )
        .bind(now_timestamp())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;
        Ok((deleted, promoted))
    }

    pub async fn count_by_type(&self, chat_type: ChatType) -> DatabaseResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM chats WHERE chat_type = ?")
            .bind(chat_type)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::UserRepository;
    use crate::test_support::migrated_pool;

    #[tokio::test]
    async fn messages_bump_the_chat_and_show_as_last_message() {
        let (pool, _dir) = migrated_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let alice = UserRepository::insert(&mut conn, "alice", "alice@example.com", "hash").await.unwrap();
        let bob = UserRepository::insert(&mut conn, "bob", "bob@example.com", "hash").await.unwrap();

        let chat = ChatRepository::create_in(&mut conn, ChatType::Direct).await.unwrap();
        ChatRepository::add_participant_in(&mut conn, &chat.id, &alice.id).await.unwrap();
        ChatRepository::add_participant_in(&mut conn, &chat.id, &bob.id).await.unwrap();
        ChatRepository::insert_message_in(&mut conn, &chat.id, Some(&alice.id), "merhaba").await.unwrap();
        ChatRepository::insert_message_in(&mut conn, &chat.id, Some(&bob.id), "hello").await.unwrap();
        drop(conn);

        let repo = ChatRepository::new(pool);
        let chats = repo.list_for_user(&alice.id, 0, 10).await.unwrap();
        assert_eq!(chats.len(), 1);
        assert_eq!(chats[0].participants.len(), 2);
        assert_eq!(chats[0].last_message.as_ref().unwrap().content, "hello");
        assert!(chats[0].updated_at > chat.updated_at);

        let history = repo.messages(&chat.id, 0, 50).await.unwrap();
        let contents: Vec<_> = history.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["merhaba", "hello"]);
    }

    #[tokio::test]
    async fn blocks_are_visible_from_both_sides() {
        let (pool, _dir) = migrated_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let alice = UserRepository::insert(&mut conn, "alice", "alice@example.com", "hash").await.unwrap();
        let bob = UserRepository::insert(&mut conn, "bob", "bob@example.com", "hash").await.unwrap();
        drop(conn);

        let repo = ChatRepository::new(pool.clone());
        assert!(repo.block(&alice.id, &bob.id).await.unwrap());
        assert!(!repo.block(&alice.id, &bob.id).await.unwrap());

        let mut conn = pool.acquire().await.unwrap();
        assert_eq!(ChatRepository::blocked_ids_in(&mut conn, &bob.id).await.unwrap(), vec![alice.id.clone()]);
        assert!(ChatRepository::is_blocked_between_in(&mut conn, &bob.id, &alice.id).await.unwrap());
        drop(conn);

        assert!(repo.unblock(&alice.id, &bob.id).await.unwrap());
        assert!(!repo.unblock(&alice.id, &bob.id).await.unwrap());
    }

    #[tokio::test]
    async fn cleanup_removes_empty_queues_and_promotes_full_ones() {
        let (pool, _dir) = migrated_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let alice = UserRepository::insert(&mut conn, "alice", "alice@example.com", "hash").await.unwrap();
        let bob = UserRepository::insert(&mut conn, "bob", "bob@example.com", "hash").await.unwrap();

        ChatRepository::create_in(&mut conn, ChatType::RandomQueue).await.unwrap();
        let crowded = ChatRepository::create_in(&mut conn, ChatType::RandomQueue).await.unwrap();
        ChatRepository::add_participant_in(&mut conn, &crowded.id, &alice.id).await.unwrap();
        ChatRepository::add_participant_in(&mut conn, &crowded.id, &bob.id).await.unwrap();
        drop(conn);

        let repo = ChatRepository::new(pool);
        assert_eq!(repo.cleanup_queues().await.unwrap(), (1, 1));
        assert_eq!(repo.count_by_type(ChatType::RandomQueue).await.unwrap(), 0);
        assert_eq!(repo.find_by_id(&crowded.id).await.unwrap().unwrap().chat_type, ChatType::Random);
    }

    #[tokio::test]
    async fn report_status_can_be_updated() {
        let (pool, _dir) = migrated_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let alice = UserRepository::insert(&mut conn, "alice", "alice@example.com", "hash").await.unwrap();
        let bob = UserRepository::insert(&mut conn, "bob", "bob@example.com", "hash").await.unwrap();
        drop(conn);

        let repo = ChatRepository::new(pool);
        let report = repo.report(&alice.id, &bob.id, "other", "").await.unwrap();
        assert_eq!(repo.list_reports(Some("open"), 0, 10).await.unwrap().len(), 1);

        let resolved = repo.set_report_status(&report.id, "resolved").await.unwrap();
        assert_eq!(resolved.status, "resolved");
        assert!(repo.list_reports(Some("open"), 0, 10).await.unwrap().is_empty());
    }
}
