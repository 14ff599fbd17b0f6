//! Moderation audit trail.

use sqlx::{SqliteConnection, SqlitePool};

use crate::entities::audit::AdminAction;
use crate::types::{new_id, now_timestamp, DatabaseResult};

#[derive(Clone)]
pub struct AuditRepository {
    pool: SqlitePool,
}

impl AuditRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn record(
        &self,
        admin_id: &str,
        action: &str,
        target_table: &str,
        target_id: Option<&str>,
    ) -> DatabaseResult<AdminAction> {
        let mut conn = self.pool.acquire().await?;
        Self::record_in(&mut conn, admin_id, action, target_table, target_id).await
    }

    pub async fn record_in(
        conn: &mut SqliteConnection,
        admin_id: &str,
        action: &str,
        target_table: &str,
        target_id: Option<&str>,
    ) -> DatabaseResult<AdminAction> {
        let entry = AdminAction {
            id: new_id(),
            admin_id: admin_id.to_string(),
            action: action.to_string(),
            target_table: target_table.to_string(),
            target_id: target_id.map(str::to_string),
            created_at: now_timestamp(),
        };

        sqlx::query(
            "INSERT INTO admin_actions (id, admin_id, action, target_table, target_id, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&entry.id)
        .bind(&entry.admin_id)
        .bind(&entry.action)
        .bind(&entry.target_table)
        .bind(&entry.target_id)
        .bind(&entry.created_at)
        .execute(&mut *conn)
        .await?;
        Ok(entry)
    }

    pub async fn recent_actions(&self, limit: i64) -> DatabaseResult<Vec<AdminAction>> {
        let actions = sqlx::query_as::<_, AdminAction>(
            r#"
            SELECT id, admin_id, action, target_table, target_id, created_at
            FROM admin_actions
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(actions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::UserRepository;
    use crate::test_support::migrated_pool;

    #[tokio::test]
    async fn admin_actions_are_recorded() {
        let (pool, _dir) = migrated_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let admin = UserRepository::insert(&mut conn, "admin", "admin@example.com", "hash").await.unwrap();
        drop(conn);

        let repo = AuditRepository::new(pool);
        repo.record(&admin.id, "delete_word", "words", Some("w1")).await.unwrap();
        let actions = repo.recent_actions(10).await.unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].target_id.as_deref(), Some("w1"));
    }
}
