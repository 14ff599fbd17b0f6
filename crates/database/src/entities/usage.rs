use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// The four actions capped per day by a user's plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum QuotaKind {
    Words,
    Questions,
    Answers,
    Articles,
}

impl QuotaKind {
    pub const ALL: [QuotaKind; 4] = [
        QuotaKind::Words,
        QuotaKind::Questions,
        QuotaKind::Answers,
        QuotaKind::Articles,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuotaKind::Words => "words",
            QuotaKind::Questions => "questions",
            QuotaKind::Answers => "answers",
            QuotaKind::Articles => "articles",
        }
    }

    /// Counter column in `user_daily_limits`.
    pub(crate) fn column(&self) -> &'static str {
        match self {
            QuotaKind::Words => "used_words",
            QuotaKind::Questions => "used_questions",
            QuotaKind::Answers => "used_answers",
            QuotaKind::Articles => "used_articles",
        }
    }
}

impl std::str::FromStr for QuotaKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        QuotaKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| format!("unknown limit type '{value}'"))
    }
}

/// One user's counters for one day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, FromRow, ToSchema)]
pub struct DailyUsage {
    pub used_words: i64,
    pub used_questions: i64,
    pub used_answers: i64,
    pub used_articles: i64,
}

impl DailyUsage {
    pub fn used(&self, kind: QuotaKind) -> i64 {
        match kind {
            QuotaKind::Words => self.used_words,
            QuotaKind::Questions => self.used_questions,
            QuotaKind::Answers => self.used_answers,
            QuotaKind::Articles => self.used_articles,
        }
    }
}
