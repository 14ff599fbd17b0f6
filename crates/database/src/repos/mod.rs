//! Database repository implementations

pub mod article_repository;
pub mod audit_repository;
pub mod catalog_repository;
pub mod chat_repository;
pub mod limit_repository;
pub mod notification_repository;
pub mod question_repository;
pub mod stats_repository;
pub mod token_repository;
pub mod user_repository;
pub mod word_repository;

// Re-export all repositories for convenience
pub use article_repository::ArticleRepository;
pub use audit_repository::AuditRepository;
pub use catalog_repository::{LanguageRepository, PlanRepository, RoleRepository};
pub use chat_repository::ChatRepository;
pub use limit_repository::LimitRepository;
pub use notification_repository::NotificationRepository;
pub use question_repository::{AnswerRepository, QuestionRepository};
pub use stats_repository::StatsRepository;
pub use token_repository::{RefreshTokenRecord, TokenRepository};
pub use user_repository::UserRepository;
pub use word_repository::WordRepository;
