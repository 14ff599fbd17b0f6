//! Reference data: languages, plans and roles.

use sqlx::{SqliteConnection, SqlitePool};

use crate::entities::catalog::{Language, Plan, PlanLimits, Role};
use crate::types::{new_id, DatabaseResult};

const PLAN_COLUMNS: &str = "id, name, price, daily_word_limit, daily_question_limit, \
    daily_answer_limit, daily_article_limit, is_active";

#[derive(Clone)]
pub struct LanguageRepository {
    pool: SqlitePool,
}

impl LanguageRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> DatabaseResult<Vec<Language>> {
        let languages = sqlx::query_as::<_, Language>("SELECT id, code, name FROM languages ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(languages)
    }

    pub async fn find_by_id(&self, id: &str) -> DatabaseResult<Option<Language>> {
        let language = sqlx::query_as::<_, Language>("SELECT id, code, name FROM languages WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(language)
    }

    pub async fn find_by_code(&self, code: &str) -> DatabaseResult<Option<Language>> {
        let language = sqlx::query_as::<_, Language>(
            "SELECT id, code, name FROM languages WHERE lower(code) = lower(?)",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(language)
    }

    /// Resolve a reference given either as an id or as a language code.
    pub async fn resolve(&self, id_or_code: &str) -> DatabaseResult<Option<Language>> {
        if let Some(language) = self.find_by_id(id_or_code).await? {
            return Ok(Some(language));
        }
        self.find_by_code(id_or_code).await
    }

    pub async fn exists(&self, id: &str) -> DatabaseResult<bool> {
        Ok(self.find_by_id(id).await?.is_some())
    }

    /// Insert or rename a language keyed by its code.
    pub async fn upsert(&self, code: &str, name: &str) -> DatabaseResult<Language> {
        sqlx::query(
            "INSERT INTO languages (id, code, name) VALUES (?, ?, ?) ON CONFLICT(code) DO UPDATE SET name = excluded.name",
        )
        .bind(new_id())
        .bind(code)
        .bind(name)
        .execute(&self.pool)
        .await?;

        let language = sqlx::query_as::<_, Language>("SELECT id, code, name FROM languages WHERE code = ?")
            .bind(code)
            .fetch_one(&self.pool)
            .await?;
        Ok(language)
    }

    pub async fn count(&self) -> DatabaseResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM languages")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[derive(Clone)]
pub struct PlanRepository {
    pool: SqlitePool,
}

impl PlanRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list_active(&self) -> DatabaseResult<Vec<Plan>> {
        let plans = sqlx::query_as::<_, Plan>(&format!(
            "SELECT {PLAN_COLUMNS} FROM plans WHERE is_active = 1 ORDER BY price ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(plans)
    }

    pub async fn find_by_id(&self, id: &str) -> DatabaseResult<Option<Plan>> {
        let plan = sqlx::query_as::<_, Plan>(&format!("SELECT {PLAN_COLUMNS} FROM plans WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(plan)
    }

    /// Limits that apply to a user holding `plan_id`, inside a caller-owned transaction.
    pub async fn limits_in(conn: &mut SqliteConnection, plan_id: Option<&str>) -> DatabaseResult<PlanLimits> {
        let Some(plan_id) = plan_id else {
            return Ok(PlanLimits::FREE);
        };

        let plan = sqlx::query_as::<_, Plan>(&format!("SELECT {PLAN_COLUMNS} FROM plans WHERE id = ?"))
            .bind(plan_id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(plan.map(|plan| plan.limits()).unwrap_or(PlanLimits::FREE))
    }

    /// Insert a plan or refresh its price and limits, keyed by name.
    pub async fn upsert(&self, plan: &Plan) -> DatabaseResult<Plan> {
        sqlx::query(
            r#"
            INSERT INTO plans (id, name, price, daily_word_limit, daily_question_limit, daily_answer_limit, daily_article_limit, is_active)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(name) DO UPDATE SET
                price = excluded.price,
                daily_word_limit = excluded.daily_word_limit,
                daily_question_limit = excluded.daily_question_limit,
                daily_answer_limit = excluded.daily_answer_limit,
                daily_article_limit = excluded.daily_article_limit,
                is_active = excluded.is_active
            "#,
        )
        .bind(&plan.id)
        .bind(&plan.name)
        .bind(plan.price)
        .bind(plan.daily_word_limit)
        .bind(plan.daily_question_limit)
        .bind(plan.daily_answer_limit)
        .bind(plan.daily_article_limit)
        .bind(plan.is_active)
        .execute(&self.pool)
        .await?;

        let stored = sqlx::query_as::<_, Plan>(&format!("SELECT {PLAN_COLUMNS} FROM plans WHERE name = ?"))
            .bind(&plan.name)
            .fetch_one(&self.pool)
            .await?;
        Ok(stored)
    }
}

#[derive(Clone)]
pub struct RoleRepository {
    pool: SqlitePool,
}

impl RoleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> DatabaseResult<Vec<Role>> {
        let roles = sqlx::query_as::<_, Role>("SELECT id, name FROM roles ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(roles)
    }

    pub async fn ensure(&self, name: &str) -> DatabaseResult<Role> {
        let mut conn = self.pool.acquire().await?;
        Self::ensure_in(&mut conn, name).await
    }

    /// Fetch a role by name, creating it when missing.
    pub async fn ensure_in(conn: &mut SqliteConnection, name: &str) -> DatabaseResult<Role> {
        sqlx::query("INSERT OR IGNORE INTO roles (id, name) VALUES (?, ?)")
            .bind(new_id())
            .bind(name)
            .execute(&mut *conn)
            .await?;

        let role = sqlx::query_as::<_, Role>("SELECT id, name FROM roles WHERE name = ?")
            .bind(name)
            .fetch_one(&mut *conn)
            .await?;
        Ok(role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::migrated_pool;

    #[tokio::test]
    async fn language_upsert_is_keyed_by_code() {
        let (pool, _dir) = migrated_pool().await;
        let repo = LanguageRepository::new(pool);

        let first = repo.upsert("en", "English").await.unwrap();
        let second = repo.upsert("en", "English (US)").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.name, "English (US)");
        assert_eq!(repo.count().await.unwrap(), 1);
        assert_eq!(repo.resolve("EN").await.unwrap().unwrap().id, first.id);
    }

    #[tokio::test]
    async fn missing_plan_falls_back_to_free_limits() {
        let (pool, _dir) = migrated_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        let limits = PlanRepository::limits_in(&mut conn, None).await.unwrap();
        assert_eq!(limits, PlanLimits::FREE);

        let limits = PlanRepository::limits_in(&mut conn, Some("no-such-plan")).await.unwrap();
        assert_eq!(limits.words, 5);
    }

    #[tokio::test]
    async fn plan_upsert_refreshes_limits() {
        let (pool, _dir) = migrated_pool().await;
        let repo = PlanRepository::new(pool);
        let mut plan = Plan {
            id: new_id(),
            name: "Pro".into(),
            price: 10.0,
            daily_word_limit: 50,
            daily_question_limit: 20,
            daily_answer_limit: 50,
            daily_article_limit: 10,
            is_active: true,
        };
        let stored = repo.upsert(&plan).await.unwrap();

        plan.id = new_id();
        plan.daily_word_limit = 75;
        let refreshed = repo.upsert(&plan).await.unwrap();

        assert_eq!(stored.id, refreshed.id);
        assert_eq!(refreshed.daily_word_limit, 75);
        assert_eq!(repo.list_active().await.unwrap().len(), 1);
    }
}
