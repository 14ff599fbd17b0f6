//! Reference data every deployment needs: languages, plans and roles.

use sqlx::SqlitePool;
use tracing::info;

use crate::entities::catalog::Plan;
use crate::repos::{LanguageRepository, PlanRepository, RoleRepository};
use crate::types::{new_id, DatabaseResult};

pub const LANGUAGES: [(&str, &str); 6] = [
    ("en", "English"),
    ("tr", "Turkish"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("jp", "Japanese"),
    ("de", "German"),
];

pub const ROLES: [&str; 3] = ["admin", "moderator", "user"];

/// `(name, price, words, questions, answers, articles)`
const PLANS: [(&str, f64, i64, i64, i64, i64); 3] = [
    ("Free", 0.0, 5, 2, 5, 1),
    ("Pro", 10.0, 50, 20, 50, 10),
    ("Enterprise", 50.0, 1000, 1000, 1000, 1000),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub languages: usize,
    pub plans: usize,
    pub roles: usize,
}

/// Upsert the reference rows. Safe to run repeatedly; plan prices and limits
/// are brought back to their canonical values.
pub async fn seed_reference_data(pool: &SqlitePool) -> DatabaseResult<SeedSummary> {
    let languages = LanguageRepository::new(pool.clone());
    for (code, name) in LANGUAGES {
        languages.upsert(code, name).await?;
    }

    let plans = PlanRepository::new(pool.clone());
    for (name, price, words, questions, answers, articles) in PLANS {
        plans
            .upsert(&Plan {
                id: new_id(),
                name: name.to_string(),
                price,
                daily_word_limit: words,
                daily_question_limit: questions,
                daily_answer_limit: answers,
                daily_article_limit: articles,
                is_active: true,
            })
            .await?;
    }

    let roles = RoleRepository::new(pool.clone());
    for role in ROLES {
        roles.ensure(role).await?;
    }

    let summary = SeedSummary {
        languages: LANGUAGES.len(),
        plans: PLANS.len(),
        roles: ROLES.len(),
    };
    info!(?summary, "reference data seeded");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::migrated_pool;

    #[tokio::test]
    async fn seeding_twice_keeps_one_row_per_entry() {
        let (pool, _dir) = migrated_pool().await;
        seed_reference_data(&pool).await.unwrap();
        seed_reference_data(&pool).await.unwrap();

        let languages = LanguageRepository::new(pool.clone()).count().await.unwrap();
        assert_eq!(languages, 6);

        let plans = PlanRepository::new(pool.clone()).list_active().await.unwrap();
        let names: Vec<_> = plans.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Free", "Pro", "Enterprise"]);
        assert_eq!(plans[1].daily_question_limit, 20);

        assert_eq!(RoleRepository::new(pool).list().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn seeding_restores_edited_plan_limits() {
        let (pool, _dir) = migrated_pool().await;
        seed_reference_data(&pool).await.unwrap();
        sqlx::query("UPDATE plans SET daily_word_limit = 1 WHERE name = 'Pro'")
            .execute(&pool)
            .await
            .unwrap();

        seed_reference_data(&pool).await.unwrap();
        let pro: i64 = sqlx::query_scalar("SELECT daily_word_limit FROM plans WHERE name = 'Pro'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(pro, 50);
    }
}
