//! Notification repository for database operations.

use sqlx::{SqliteConnection, SqlitePool};

use crate::entities::notification::{Notification, NotificationSettings};
use crate::types::{new_id, now_timestamp, DatabaseResult};

const NOTIFICATION_COLUMNS: &str = "id, user_id, title, message, is_read, created_at";

#[derive(Clone)]
pub struct NotificationRepository {
    pool: SqlitePool,
}

impl NotificationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Newest first.
    pub async fn list_for_user(
        &self,
        user_id: &str,
        unread_only: bool,
        skip: i64,
        limit: i64,
    ) -> DatabaseResult<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(&format!(
            r#"
            SELECT {NOTIFICATION_COLUMNS}
            FROM notifications
            WHERE user_id = ? AND (? = 0 OR is_read = 0)
            ORDER BY created_at DESC, rowid DESC
            LIMIT ? OFFSET ?
            "#
        ))
        .bind(user_id)
        .bind(unread_only)
        .bind(limit)
        .bind(skip)
        .fetch_all(&self.pool)
        .await?;
        Ok(notifications)
    }

    pub async fn unread_count(&self, user_id: &str) -> DatabaseResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = ? AND is_read = 0")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Mark one of the user's notifications as read. `None` when it does not exist or
    /// belongs to someone else.
    pub async fn mark_read(&self, id: &str, user_id: &str) -> DatabaseResult<Option<Notification>> {
        let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        let notification = sqlx::query_as::<_, Notification>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(notification)
    }

    /// Returns how many notifications changed state.
    pub async fn mark_all_read(&self, user_id: &str) -> DatabaseResult<u64> {
        let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE user_id = ? AND is_read = 0")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Store a notification unless the recipient has switched in-app delivery off.
    pub async fn insert_in(
        conn: &mut SqliteConnection,
        user_id: &str,
        title: &str,
        message: &str,
    ) -> DatabaseResult<Option<Notification>> {
        let enabled: Option<bool> =
            sqlx::query_scalar("SELECT in_app_enabled FROM notification_settings WHERE user_id = ?")
                .bind(user_id)
                .fetch_optional(&mut *conn)
                .await?;

        if enabled == Some(false) {
            return Ok(None);
        }

        let id = new_id();
        sqlx::query("INSERT INTO notifications (id, user_id, title, message, is_read, created_at) VALUES (?, ?, ?, ?, 0, ?)")
            .bind(&id)
            .bind(user_id)
            .bind(title)
            .bind(message)
            .bind(now_timestamp())
            .execute(&mut *conn)
            .await?;

        let notification = sqlx::query_as::<_, Notification>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = ?"
        ))
        .bind(&id)
        .fetch_one(&mut *conn)
        .await?;
        Ok(Some(notification))
    }

    /// Settings for the user, falling back to defaults when none were ever stored.
    pub async fn settings(&self, user_id: &str) -> DatabaseResult<NotificationSettings> {
        let settings = sqlx::query_as::<_, NotificationSettings>(
            "SELECT user_id, email_enabled, in_app_enabled FROM notification_settings WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(settings.unwrap_or_else(|| NotificationSettings::defaults_for(user_id)))
    }

    pub async fn ensure_settings_in(conn: &mut SqliteConnection, user_id: &str) -> DatabaseResult<()> {
        sqlx::query(
            "INSERT OR IGNORE INTO notification_settings (user_id, email_enabled, in_app_enabled) VALUES (?, 1, 1)",
        )
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    pub async fn update_settings(
        &self,
        user_id: &str,
        email_enabled: Option<bool>,
        in_app_enabled: Option<bool>,
    ) -> DatabaseResult<NotificationSettings> {
        let current = self.settings(user_id).await?;
        let email_enabled = email_enabled.unwrap_or(current.email_enabled);
        let in_app_enabled = in_app_enabled.unwrap_or(current.in_app_enabled);

        sqlx::query(
            r#"
            INSERT INTO notification_settings (user_id, email_enabled, in_app_enabled)
            VALUES (?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                email_enabled = excluded.email_enabled,
                in_app_enabled = excluded.in_app_enabled
            "#,
        )
        .bind(user_id)
        .bind(email_enabled)
        .bind(in_app_enabled)
        .execute(&self.pool)
        .await?;

        Ok(NotificationSettings {
            user_id: user_id.to_string(),
            email_enabled,
            in_app_enabled,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::UserRepository;
    use crate::test_support::migrated_pool;

    #[tokio::test]
    async fn unread_counts_follow_read_state() {
        let (pool, _dir) = migrated_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let user = UserRepository::insert(&mut conn, "ayse", "ayse@example.com", "hash").await.unwrap();
        let first = NotificationRepository::insert_in(&mut conn, &user.id, "New Like", "Someone liked it")
            .await
            .unwrap()
            .unwrap();
        NotificationRepository::insert_in(&mut conn, &user.id, "New Answer", "Someone answered")
            .await
            .unwrap();
        drop(conn);

        let repo = NotificationRepository::new(pool);
        assert_eq!(repo.unread_count(&user.id).await.unwrap(), 2);

        let read = repo.mark_read(&first.id, &user.id).await.unwrap().unwrap();
        assert!(read.is_read);
        assert_eq!(repo.list_for_user(&user.id, true, 0, 10).await.unwrap().len(), 1);

        assert_eq!(repo.mark_all_read(&user.id).await.unwrap(), 1);
        assert_eq!(repo.unread_count(&user.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn disabled_in_app_delivery_suppresses_notifications() {
        let (pool, _dir) = migrated_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let user = UserRepository::insert(&mut conn, "mehmet", "mehmet@example.com", "hash").await.unwrap();
        drop(conn);

        let repo = NotificationRepository::new(pool.clone());
        let settings = repo.update_settings(&user.id, None, Some(false)).await.unwrap();
        assert!(settings.email_enabled);
        assert!(!settings.in_app_enabled);

        let mut conn = pool.acquire().await.unwrap();
        let stored = NotificationRepository::insert_in(&mut conn, &user.id, "Hi", "there").await.unwrap();
        assert!(stored.is_none());
    }

    #[tokio::test]
    async fn mark_read_ignores_other_users_notifications() {
        let (pool, _dir) = migrated_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let owner = UserRepository::insert(&mut conn, "owner", "owner@example.com", "hash").await.unwrap();
        let other = UserRepository::insert(&mut conn, "other", "other@example.com", "hash").await.unwrap();
        let note = NotificationRepository::insert_in(&mut conn, &owner.id, "t", "m").await.unwrap().unwrap();
        drop(conn);

        let repo = NotificationRepository::new(pool);
        assert!(repo.mark_read(&note.id, &other.id).await.unwrap().is_none());
    }
}
