use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

pub(crate) const QUESTION_COLUMNS: &str = "id, user_id, source_language_id, target_language_id, \
    question_text, description, is_active, created_at, updated_at";

pub(crate) const ANSWER_COLUMNS: &str = "id, question_id, user_id, answer_text, context_tags, \
    is_edited, created_at, updated_at";

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct QuestionFilter {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    /// Source language id.
    pub source_lang: Option<String>,
    /// Target language id.
    pub target_lang: Option<String>,
    pub user_id: Option<String>,
    /// Only questions nobody has answered yet.
    pub unanswered: Option<bool>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct AnswerReport {
    pub id: String,
    pub answer_id: String,
    pub user_id: String,
    pub reason: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct Question {
    pub id: String,
    pub user_id: String,
    pub source_language_id: Option<String>,
    pub target_language_id: Option<String>,
    pub question_text: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// A question joined with its author and answer count.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct QuestionView {
    pub id: String,
    pub user_id: String,
    pub author_username: String,
    pub source_language_id: Option<String>,
    pub target_language_id: Option<String>,
    pub question_text: String,
    pub description: Option<String>,
    pub answer_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewQuestion {
    pub source_language_id: Option<String>,
    pub target_language_id: Option<String>,
    pub question_text: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateQuestion {
    pub source_language_id: Option<String>,
    pub target_language_id: Option<String>,
    pub question_text: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct Answer {
    pub id: String,
    pub question_id: String,
    pub user_id: String,
    pub answer_text: String,
    pub context_tags: Option<String>,
    pub is_edited: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// An answer with its author, helpful vote tally and the viewer's own vote.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct AnswerView {
    pub id: String,
    pub question_id: String,
    pub user_id: String,
    pub author_username: String,
    pub answer_text: String,
    pub context_tags: Option<String>,
    pub is_edited: bool,
    pub helpful_count: i64,
    pub is_helpful: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewAnswer {
    pub question_id: String,
    pub answer_text: String,
    pub context_tags: Option<String>,
}
