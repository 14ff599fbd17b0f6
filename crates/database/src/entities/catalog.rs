use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::entities::usage::QuotaKind;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct Language {
    pub id: String,
    pub code: String,
    pub name: String,
}

/// A subscription tier and its daily quotas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Plan {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub daily_word_limit: i64,
    pub daily_question_limit: i64,
    pub daily_answer_limit: i64,
    pub daily_article_limit: i64,
    pub is_active: bool,
}

impl Plan {
    pub fn limits(&self) -> PlanLimits {
        PlanLimits {
            plan_name: Some(self.name.clone()),
            words: self.daily_word_limit,
            questions: self.daily_question_limit,
            answers: self.daily_answer_limit,
            articles: self.daily_article_limit,
        }
    }

    pub fn is_paid(&self) -> bool {
        self.price > 0.0
    }
}

/// Daily caps applied to a user. Accounts without a plan get [`PlanLimits::FREE`].
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PlanLimits {
    pub plan_name: Option<String>,
    pub words: i64,
    pub questions: i64,
    pub answers: i64,
    pub articles: i64,
}

impl PlanLimits {
    pub const FREE: PlanLimits = PlanLimits {
        plan_name: None,
        words: 5,
        questions: 2,
        answers: 5,
        articles: 1,
    };

    pub fn limit(&self, kind: QuotaKind) -> i64 {
        match kind {
            QuotaKind::Words => self.words,
            QuotaKind::Questions => self.questions,
            QuotaKind::Answers => self.answers,
            QuotaKind::Articles => self.articles,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct Role {
    pub id: String,
    pub name: String,
}
