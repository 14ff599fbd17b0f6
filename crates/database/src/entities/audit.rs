use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

/// One moderation action, kept as an audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct AdminAction {
    pub id: String,
    pub admin_id: String,
    pub action: String,
    pub target_table: String,
    pub target_id: Option<String>,
    pub created_at: String,
}
