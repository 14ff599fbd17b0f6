//! Chat entity definitions

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Lifecycle of a conversation.
///
/// A `random_queue` chat holds a single learner waiting for a partner. Matching
/// turns it into `random`; leaving a two-party chat turns it into `terminated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ChatType {
    RandomQueue,
    Random,
    Direct,
    Terminated,
}

impl ChatType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatType::RandomQueue => "random_queue",
            ChatType::Random => "random",
            ChatType::Direct => "direct",
            ChatType::Terminated => "terminated",
        }
    }
}

impl std::fmt::Display for ChatType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct Chat {
    pub id: String,
    pub chat_type: ChatType,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct ChatParticipantView {
    pub user_id: String,
    pub username: String,
    pub native_language_id: Option<String>,
    pub target_language_id: Option<String>,
    pub joined_at: String,
}

/// A chat message. System messages carry no sender.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct Message {
    pub id: String,
    pub chat_id: String,
    pub sender_id: Option<String>,
    pub content: String,
    pub created_at: String,
}

impl Message {
    pub fn is_system(&self) -> bool {
        self.sender_id.is_none()
    }
}

/// A chat with everything a conversation list needs to render it.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChatDetail {
    pub id: String,
    pub chat_type: ChatType,
    pub created_at: String,
    pub updated_at: String,
    pub participants: Vec<ChatParticipantView>,
    pub last_message: Option<Message>,
}

/// A waiting `random_queue` chat together with its participants' languages.
///
/// Queues normally hold one learner; `participant_count` lets matchmaking skip
/// anything else.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct QueueCandidate {
    pub chat_id: String,
    pub user_id: String,
    pub native_language_id: Option<String>,
    pub participant_count: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct UserReport {
    pub id: String,
    pub reporter_id: String,
    pub reported_id: String,
    pub reason: String,
    pub description: String,
    pub status: String,
    pub created_at: String,
}
