//! LanXpert Database Crate
//!
//! Connection management, embedded migrations, row entities and the
//! repositories the HTTP layer and the CLI read and write through.

use lanxpert_config::DatabaseConfig;
use sqlx::SqlitePool;

pub mod connection;
pub mod entities;
pub mod migrations;
pub mod repos;
pub mod seed;
pub mod types;

pub use connection::prepare_database;
pub use migrations::{run_migrations, MIGRATOR};

pub use repos::{
    AnswerRepository, ArticleRepository, AuditRepository, ChatRepository, LanguageRepository,
    LimitRepository, NotificationRepository, PlanRepository, QuestionRepository, RefreshTokenRecord,
    RoleRepository, StatsRepository, TokenRepository, UserRepository, WordRepository,
};

pub use entities::{
    article::{Article, ArticleView, NewArticle, UpdateArticle},
    audit::AdminAction,
    catalog::{Language, Plan, PlanLimits, Role},
    chat::{Chat, ChatDetail, ChatParticipantView, ChatType, Message, QueueCandidate, UserReport},
    notification::{Notification, NotificationSettings},
    question::{
        Answer, AnswerReport, AnswerView, NewAnswer, NewQuestion, Question, QuestionFilter, QuestionView,
        UpdateQuestion,
    },
    stats::ActivityItem,
    usage::{DailyUsage, QuotaKind},
    user::{PublicProfile, UpdateProfile, User},
    word::{NewWord, UpdateWord, Word, WordFilter},
};

pub use seed::{seed_reference_data, SeedSummary};

pub use types::{
    errors::{is_unique_violation, DatabaseError},
    new_id, now_timestamp, today, DatabaseResult,
};

pub use sqlx::Pool;

/// Open the pool and bring the schema up to date.
pub async fn initialize_database(config: &DatabaseConfig) -> DatabaseResult<SqlitePool> {
    let pool = prepare_database(config)
        .await
        .map_err(|e| DatabaseError::Connection(format!("{e:#}")))?;

    run_migrations(&pool)
        .await
        .map_err(|e| DatabaseError::Migration(format!("{e:#}")))?;

    Ok(pool)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use tempfile::TempDir;

    pub async fn migrated_pool() -> (SqlitePool, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let config = DatabaseConfig {
            url: format!("sqlite://{}", db_path.display()),
            max_connections: 4,
        };

        let pool = initialize_database(&config).await.unwrap();
        (pool, temp_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::migrated_pool;

    #[tokio::test]
    async fn test_database_initialization_creates_schema() {
        let (pool, _temp_dir) = migrated_pool().await;

        let tables: Vec<String> =
            sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
                .fetch_all(&pool)
                .await
                .unwrap();

        for expected in ["users", "chats", "user_daily_limits", "refresh_tokens"] {
            assert!(tables.iter().any(|name| name == expected), "missing {expected}");
        }
    }

    #[tokio::test]
    async fn test_foreign_keys_enabled() {
        let (pool, _temp_dir) = migrated_pool().await;

        let result: (bool,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(&pool)
            .await
            .unwrap();

        assert!(result.0);
    }
}
