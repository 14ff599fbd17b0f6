use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

/// An entry in a learner's recent-activity feed.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct ActivityItem {
    /// `question` or `article`.
    pub kind: String,
    pub id: String,
    pub title: String,
    pub created_at: String,
}
