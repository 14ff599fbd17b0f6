//! Daily usage quotas per plan.

use chrono::NaiveDate;
use lanxpert_database::{LimitRepository, PlanRepository, QuotaKind, User};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;
use utoipa::ToSchema;

use super::error::{ServiceError, ServiceResult};

/// Take one unit of `kind` from the user's allowance for `on`.
pub async fn consume(
    conn: &mut SqliteConnection,
    user: &User,
    kind: QuotaKind,
    on: NaiveDate,
) -> ServiceResult<()> {
    let limits = PlanRepository::limits_in(conn, user.plan_id.as_deref()).await?;
    let limit = limits.limit(kind);

    if LimitRepository::try_increment_in(conn, &user.id, on, kind, limit).await? {
        return Ok(());
    }

    info!(user_id = %user.id, kind = kind.as_str(), limit, "daily limit reached");
    let plan = limits.plan_name.as_deref().unwrap_or("Free");
    Err(ServiceError::QuotaExceeded(format!(
        "{plan} plan limit reached ({limit} {}/day). Please upgrade.",
        kind.as_str()
    )))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct QuotaUsage {
    pub current: i64,
    pub target: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DailyQuotaReport {
    pub words: QuotaUsage,
    pub questions: QuotaUsage,
    pub answers: QuotaUsage,
    pub articles: QuotaUsage,
}

pub async fn daily_report(pool: &SqlitePool, user: &User, on: NaiveDate) -> ServiceResult<DailyQuotaReport> {
    let mut conn = pool.acquire().await?;
    let limits = PlanRepository::limits_in(&mut conn, user.plan_id.as_deref()).await?;
    let usage = LimitRepository::usage_in(&mut conn, &user.id, on).await?;

    let entry = |kind: QuotaKind| QuotaUsage {
        current: usage.used(kind),
        target: limits.limit(kind),
    };

    Ok(DailyQuotaReport {
        words: entry(QuotaKind::Words),
        questions: entry(QuotaKind::Questions),
        answers: entry(QuotaKind::Answers),
        articles: entry(QuotaKind::Articles),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_utils::{create_test_db, create_user};
    use lanxpert_database::UserRepository;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[tokio::test]
    async fn free_users_get_default_limits() {
        let (pool, _dir) = create_test_db().await;
        let user = create_user(&pool, "freebie").await;
        let mut conn = pool.acquire().await.unwrap();

        for _ in 0..2 {
            consume(&mut conn, &user, QuotaKind::Questions, day()).await.unwrap();
        }
        let err = consume(&mut conn, &user, QuotaKind::Questions, day())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::QuotaExceeded(ref m) if m.contains("2 questions/day")));

        let tomorrow = day().succ_opt().unwrap();
        consume(&mut conn, &user, QuotaKind::Questions, tomorrow).await.unwrap();
        drop(conn);

        let report = daily_report(&pool, &user, day()).await.unwrap();
        assert_eq!(report.questions, QuotaUsage { current: 2, target: 2 });
        assert_eq!(report.words, QuotaUsage { current: 0, target: 5 });
    }

    #[tokio::test]
    async fn plan_limits_apply() {
        let (pool, _dir) = create_test_db().await;
        let user = create_user(&pool, "pro").await;
        let pro = PlanRepository::new(pool.clone())
            .list_active()
            .await
            .unwrap()
            .into_iter()
            .find(|plan| plan.name == "Pro")
            .unwrap();
        let users = UserRepository::new(pool.clone());
        users.set_plan(&user.id, Some(&pro.id)).await.unwrap();
        let user = users.find_by_id(&user.id).await.unwrap().unwrap();

        let mut conn = pool.acquire().await.unwrap();
        for _ in 0..10 {
            consume(&mut conn, &user, QuotaKind::Articles, day()).await.unwrap();
        }
        let err = consume(&mut conn, &user, QuotaKind::Articles, day()).await.unwrap_err();
        assert!(matches!(err, ServiceError::QuotaExceeded(ref m) if m.starts_with("Pro plan")));
    }
}
