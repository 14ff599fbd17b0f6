//! Refresh-token bookkeeping and the login audit log.

use sqlx::{FromRow, SqlitePool};

use crate::types::{new_id, now_timestamp, DatabaseResult};

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct RefreshTokenRecord {
    pub token_id: String,
    pub user_id: String,
    pub expires_at: String,
    pub revoked: bool,
}

#[derive(Clone)]
pub struct TokenRepository {
    pool: SqlitePool,
}

impl TokenRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn store_refresh(&self, token_id: &str, user_id: &str, expires_at: &str) -> DatabaseResult<()> {
        sqlx::query(
            "INSERT INTO refresh_tokens (id, token_id, user_id, expires_at, revoked, created_at) VALUES (?, ?, ?, ?, 0, ?)",
        )
        .bind(new_id())
        .bind(token_id)
        .bind(user_id)
        .bind(expires_at)
        .bind(now_timestamp())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn find_refresh(&self, token_id: &str) -> DatabaseResult<Option<RefreshTokenRecord>> {
        let record = sqlx::query_as::<_, RefreshTokenRecord>(
            "SELECT token_id, user_id, expires_at, revoked FROM refresh_tokens WHERE token_id = ?",
        )
        .bind(token_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    /// Returns `true` only for the call that actually revoked the token, so a
    /// refresh token can be rotated at most once.
    pub async fn revoke_refresh(&self, token_id: &str) -> DatabaseResult<bool> {
        let result = sqlx::query("UPDATE refresh_tokens SET revoked = 1 WHERE token_id = ? AND revoked = 0")
            .bind(token_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn revoke_all_for_user(&self, user_id: &str) -> DatabaseResult<u64> {
        let result = sqlx::query("UPDATE refresh_tokens SET revoked = 1 WHERE user_id = ? AND revoked = 0")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn record_login(
        &self,
        user_id: &str,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) -> DatabaseResult<()> {
        sqlx::query("INSERT INTO login_logs (id, user_id, ip_address, user_agent, created_at) VALUES (?, ?, ?, ?, ?)")
            .bind(new_id())
            .bind(user_id)
            .bind(ip_address)
            .bind(user_agent)
            .bind(now_timestamp())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn login_count(&self, user_id: &str) -> DatabaseResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM login_logs WHERE user_id = ?")
            .bind(user_id)
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
    async fn refresh_tokens_revoke_once() {
        let (pool, _dir) = migrated_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let user = UserRepository::insert(&mut conn, "alice", "alice@example.com", "hash").await.unwrap();
        drop(conn);

        let repo = TokenRepository::new(pool);
        repo.store_refresh("jti-1", &user.id, "2099-01-01T00:00:00.000000Z").await.unwrap();

        let record = repo.find_refresh("jti-1").await.unwrap().unwrap();
        assert_eq!(record.user_id, user.id);
        assert!(!record.revoked);

        assert!(repo.revoke_refresh("jti-1").await.unwrap());
        assert!(!repo.revoke_refresh("jti-1").await.unwrap());
        assert!(repo.find_refresh("jti-1").await.unwrap().unwrap().revoked);
    }

    #[tokio::test]
    async fn logins_are_logged() {
        let (pool, _dir) = migrated_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let user = UserRepository::insert(&mut conn, "alice", "alice@example.com", "hash").await.unwrap();
        drop(conn);

        let repo = TokenRepository::new(pool);
        repo.record_login(&user.id, Some("127.0.0.1"), Some("curl/8")).await.unwrap();
        repo.record_login(&user.id, None, None).await.unwrap();
        assert_eq!(repo.login_count(&user.id).await.unwrap(), 2);
    }
}
