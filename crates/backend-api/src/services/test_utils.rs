//! Test utilities for service layer testing

use lanxpert_config::DatabaseConfig;
use lanxpert_database::{seed_reference_data, User, UserRepository};
use sqlx::SqlitePool;
use tempfile::TempDir;

/// Migrated and seeded database in a temporary directory.
pub async fn create_test_db() -> (SqlitePool, TempDir) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");
    let config = DatabaseConfig {
        url: format!("sqlite://{}", db_path.display()),
        max_connections: 4,
    };

    let pool = lanxpert_database::initialize_database(&config)
        .await
        .expect("Failed to create test database");
    seed_reference_data(&pool).await.expect("Failed to seed");

    (pool, temp_dir)
}

pub async fn create_user(pool: &SqlitePool, username: &str) -> User {
    let mut conn = pool.acquire().await.expect("connection");
    UserRepository::insert(&mut conn, username, &format!("{username}@example.com"), "not-a-hash")
        .await
        .expect("Failed to insert user")
}

/// Set a user's languages by code, returning the refreshed row.
pub async fn set_languages(pool: &SqlitePool, user: &User, native: Option<&str>, target: Option<&str>) -> User {
    sqlx::query(
        r#"
        UPDATE users
        SET native_language_id = (SELECT id FROM languages WHERE code = ?),
            target_language_id = (SELECT id FROM languages WHERE code = ?)
        WHERE id = ?
        "#,
    )
    .bind(native)
    .bind(target)
    .bind(&user.id)
    .execute(pool)
    .await
    .expect("Failed to set languages");

    UserRepository::new(pool.clone())
        .find_by_id(&user.id)
        .await
        .expect("query")
        .expect("user exists")
}
