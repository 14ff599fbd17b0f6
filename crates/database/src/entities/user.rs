//! User entity definitions

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

pub(crate) const USER_COLUMNS: &str = "id, username, email, password_hash, native_language_id, \
    target_language_id, interface_language_id, plan_id, email_verified, verification_token, \
    is_active, xp, current_level, streak_days, last_activity_date, created_at, updated_at, deleted_at";

/// A learner account including its gamification counters.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub native_language_id: Option<String>,
    pub target_language_id: Option<String>,
    pub interface_language_id: Option<String>,
    pub plan_id: Option<String>,
    pub email_verified: bool,
    #[serde(skip)]
    pub verification_token: Option<String>,
    pub is_active: bool,
    pub xp: i64,
    pub current_level: String,
    pub streak_days: i64,
    pub last_activity_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip)]
    pub deleted_at: Option<String>,
}

impl User {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// What other learners may see about an account.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct PublicProfile {
    pub id: String,
    pub username: String,
    pub native_language_id: Option<String>,
    pub target_language_id: Option<String>,
    pub xp: i64,
    pub current_level: String,
    pub streak_days: i64,
    pub created_at: String,
}

/// Partial profile update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateProfile {
    pub username: Option<String>,
    pub email: Option<String>,
    pub native_language_id: Option<String>,
    pub target_language_id: Option<String>,
    pub interface_language_id: Option<String>,
}
