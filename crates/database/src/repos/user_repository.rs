//! User repository for database operations.

use sqlx::{SqliteConnection, SqlitePool};

use crate::entities::user::{PublicProfile, UpdateProfile, User, USER_COLUMNS};
use crate::repos::catalog_repository::RoleRepository;
use crate::types::{new_id, now_timestamp, DatabaseError, DatabaseResult};

#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a fresh account inside a caller-owned transaction.
    pub async fn insert(
        conn: &mut SqliteConnection,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> DatabaseResult<User> {
        let id = new_id();
        let now = now_timestamp();

        sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(&now)
        .bind(&now)
        .execute(&mut *conn)
        .await
        .map_err(|e| DatabaseError::unique_or(e, "Username or email already registered"))?;

        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(&id)
            .fetch_one(&mut *conn)
            .await?;
        Ok(user)
    }

    /// Grant a role by name inside a caller-owned transaction, creating the role on demand.
    pub async fn assign_role_in(
        conn: &mut SqliteConnection,
        user_id: &str,
        role_name: &str,
    ) -> DatabaseResult<bool> {
        let role = RoleRepository::ensure_in(&mut *conn, role_name).await?;
        let result = sqlx::query("INSERT OR IGNORE INTO user_roles (user_id, role_id) VALUES (?, ?)")
            .bind(user_id)
            .bind(&role.id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn find_by_id(&self, id: &str) -> DatabaseResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Resolve a login identifier, which may be either the username or the email.
    pub async fn find_by_id_in(conn: &mut SqliteConnection, id: &str) -> DatabaseResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(user)
    }

    /// Store recomputed XP, level and streak after an activity.
    pub async fn apply_progress_in(
        conn: &mut SqliteConnection,
        user_id: &str,
        xp: i64,
        current_level: &str,
        streak_days: i64,
        last_activity_date: &str,
    ) -> DatabaseResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET xp = ?, current_level = ?, streak_days = ?, last_activity_date = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(xp)
        .bind(current_level)
        .bind(streak_days)
        .bind(last_activity_date)
        .bind(now_timestamp())
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("User"));
        }
        Ok(())
    }

    pub async fn find_by_login(&self, identifier: &str) -> DatabaseResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE (username = ? OR email = ?) AND deleted_at IS NULL"
        ))
        .bind(identifier)
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn find_by_verification_token(&self, token: &str) -> DatabaseResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE verification_token = ? AND deleted_at IS NULL"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn public_profile(&self, id: &str) -> DatabaseResult<Option<PublicProfile>> {
        let profile = sqlx::query_as::<_, PublicProfile>(
            r#"
            SELECT id, username, native_language_id, target_language_id, xp, current_level, streak_days, created_at
            FROM users
            WHERE id = ? AND deleted_at IS NULL AND is_active = 1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    pub async fn username_taken(&self, username: &str, except_id: Option<&str>) -> DatabaseResult<bool> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = ? AND id != COALESCE(?, ''))",
        )
        .bind(username)
        .bind(except_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    pub async fn email_taken(&self, email: &str, except_id: Option<&str>) -> DatabaseResult<bool> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = ? AND id != COALESCE(?, ''))",
        )
        .bind(email)
        .bind(except_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    /// Apply a partial profile update. Empty language ids clear the column.
    pub async fn update_profile(&self, user_id: &str, request: &UpdateProfile) -> DatabaseResult<User> {
        let mut query_parts = Vec::new();
        let mut values: Vec<Option<String>> = Vec::new();

        if let Some(username) = &request.username {
            query_parts.push("username = ?");
            values.push(Some(username.clone()));
        }

        if let Some(email) = &request.email {
            query_parts.push("email = ?");
            values.push(Some(email.clone()));
        }

        let languages = [
            ("native_language_id = ?", &request.native_language_id),
            ("target_language_id = ?", &request.target_language_id),
            ("interface_language_id = ?", &request.interface_language_id),
        ];
        for (clause, value) in languages {
            if let Some(value) = value {
                query_parts.push(clause);
                values.push(Some(value.clone()).filter(|id| !id.is_empty()));
            }
        }

        if query_parts.is_empty() {
            return self
                .find_by_id(user_id)
                .await?
                .ok_or(DatabaseError::NotFound("User"));
        }

        query_parts.push("updated_at = ?");
        values.push(Some(now_timestamp()));

        let sql = format!(
            "UPDATE users SET {} WHERE id = ? AND deleted_at IS NULL",
            query_parts.join(", ")
        );

        let mut query = sqlx::query(&sql);
        for value in values {
            query = query.bind(value);
        }

        let result = query
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::unique_or(e, "Username or email already in use"))?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("User"));
        }

        self.find_by_id(user_id)
            .await?
            .ok_or(DatabaseError::NotFound("User"))
    }

    pub async fn set_verification_token(&self, user_id: &str, token: Option<&str>) -> DatabaseResult<()> {
        sqlx::query("UPDATE users SET verification_token = ?, updated_at = ? WHERE id = ?")
            .bind(token)
            .bind(now_timestamp())
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn mark_email_verified(&self, user_id: &str) -> DatabaseResult<()> {
        sqlx::query(
            "UPDATE users SET email_verified = 1, verification_token = NULL, updated_at = ? WHERE id = ?",
        )
        .bind(now_timestamp())
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn set_active(&self, user_id: &str, is_active: bool) -> DatabaseResult<()> {
        let result = sqlx::query("UPDATE users SET is_active = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL")
            .bind(is_active)
            .bind(now_timestamp())
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("User"));
        }
        Ok(())
    }

    pub async fn set_plan(&self, user_id: &str, plan_id: Option<&str>) -> DatabaseResult<()> {
        let result = sqlx::query("UPDATE users SET plan_id = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL")
            .bind(plan_id)
            .bind(now_timestamp())
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("User"));
        }
        Ok(())
    }

    pub async fn role_names(&self, user_id: &str) -> DatabaseResult<Vec<String>> {
        let roles = sqlx::query_scalar::<_, String>(
            r#"
            SELECT r.name
            FROM roles r
            JOIN user_roles ur ON ur.role_id = r.id
            WHERE ur.user_id = ?
            ORDER BY r.name ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(roles)
    }

    pub async fn assign_role(&self, user_id: &str, role_name: &str) -> DatabaseResult<bool> {
        let mut tx = self.pool.begin().await?;
        let assigned = Self::assign_role_in(&mut tx, user_id, role_name).await?;
        tx.commit().await?;
        Ok(assigned)
    }

    pub async fn remove_role(&self, user_id: &str, role_name: &str) -> DatabaseResult<bool> {
        let result = sqlx::query(
            "DELETE FROM user_roles WHERE user_id = ? AND role_id = (SELECT id FROM roles WHERE name = ?)",
        )
        .bind(user_id)
        .bind(role_name)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Page through accounts, optionally filtered by a username/email substring.
    pub async fn list(&self, search: Option<&str>, skip: i64, limit: i64) -> DatabaseResult<Vec<User>> {
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{s}%"));

        let users = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE deleted_at IS NULL
              AND (? IS NULL OR username LIKE ? OR email LIKE ?)
            ORDER BY created_at DESC, rowid DESC
            LIMIT ? OFFSET ?
            "#
        ))
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .bind(limit)
        .bind(skip)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    pub async fn count(&self) -> DatabaseResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE deleted_at IS NULL")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
