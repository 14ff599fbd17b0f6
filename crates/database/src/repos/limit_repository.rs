//! Per-user, per-day usage counters.

use chrono::NaiveDate;
use sqlx::{SqliteConnection, SqlitePool};

use crate::entities::usage::{DailyUsage, QuotaKind};
use crate::types::{new_id, DatabaseResult};

#[derive(Clone)]
pub struct LimitRepository {
    pool: SqlitePool,
}

impl LimitRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn usage(&self, user_id: &str, date: NaiveDate) -> DatabaseResult<DailyUsage> {
        let mut conn = self.pool.acquire().await?;
        Self::usage_in(&mut conn, user_id, date).await
    }

    /// Counters for the day, zero when nothing was recorded yet.
    pub async fn usage_in(conn: &mut SqliteConnection, user_id: &str, date: NaiveDate) -> DatabaseResult<DailyUsage> {
        let usage = sqlx::query_as::<_, DailyUsage>(
            r#"
            SELECT used_words, used_questions, used_answers, used_articles
            FROM user_daily_limits
            WHERE user_id = ? AND date = ?
            "#,
        )
        .bind(user_id)
        .bind(date.to_string())
        .fetch_optional(&mut *conn)
        .await?;
        Ok(usage.unwrap_or_default())
    }

    /// Create the day's row when missing. Concurrent callers converge on one row.
    pub async fn ensure_row_in(conn: &mut SqliteConnection, user_id: &str, date: NaiveDate) -> DatabaseResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_daily_limits (id, user_id, date)
            VALUES (?, ?, ?)
            ON CONFLICT(user_id, date) DO NOTHING
            "#,
        )
        .bind(new_id())
        .bind(user_id)
        .bind(date.to_string())
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Add one to the counter if it is still below `limit`. Returns whether it was
    /// incremented.
    pub async fn try_increment_in(
        conn: &mut SqliteConnection,
        user_id: &str,
        date: NaiveDate,
        kind: QuotaKind,
        limit: i64,
    ) -> DatabaseResult<bool> {
        Self::ensure_row_in(conn, user_id, date).await?;

        let column = kind.column();
        let result = sqlx::query(&format!(
            "UPDATE user_daily_limits SET {column} = {column} + 1 WHERE user_id = ? AND date = ? AND {column} < ?"
        ))
        .bind(user_id)
        .bind(date.to_string())
        .bind(limit)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Zero the chosen counters for the day. `None` resets all four.
    pub async fn reset(&self, user_id: &str, date: NaiveDate, kind: Option<QuotaKind>) -> DatabaseResult<()> {
        let assignments = match kind {
            Some(kind) => format!("{} = 0", kind.column()),
            None => QuotaKind::ALL
                .iter()
                .map(|kind| format!("{} = 0", kind.column()))
                .collect::<Vec<_>>()
                .join(", "),
        };

        sqlx::query(&format!(
            "UPDATE user_daily_limits SET {assignments} WHERE user_id = ? AND date = ?"
        ))
        .bind(user_id)
        .bind(date.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
