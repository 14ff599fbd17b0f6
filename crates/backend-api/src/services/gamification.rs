//! XP, levels and daily streaks.

use chrono::NaiveDate;
use lanxpert_database::{User, UserRepository};
use serde::Serialize;
use sqlx::SqliteConnection;
use tracing::debug;
use utoipa::ToSchema;

use super::error::{ServiceError, ServiceResult};

pub const WORD_XP: i64 = 10;
pub const QUESTION_XP: i64 = 10;
pub const ANSWER_XP: i64 = 10;
pub const ARTICLE_XP: i64 = 50;

/// `(threshold, level reached once xp >= previous threshold)`, ascending.
const LEVELS: [(i64, &str); 5] = [
    (100, "Beginner"),
    (500, "A1 Elementary"),
    (1000, "A2 Pre-Intermediate"),
    (2000, "B1 Intermediate"),
    (4000, "B2 Upper-Intermediate"),
];

const TOP_LEVEL: &str = "C1 Advanced";

/// XP goals shown on the dashboard. Coarser than [`LEVELS`]; the last entry
/// is the goal for everyone past the one before it.
const GOALS: [i64; 6] = [500, 2000, 5000, 10_000, 25_000, 100_000];

pub fn level_for_xp(xp: i64) -> &'static str {
    LEVELS
        .iter()
        .find(|(threshold, _)| xp < *threshold)
        .map(|(_, name)| *name)
        .unwrap_or(TOP_LEVEL)
}

/// The dashboard's XP goal: the first entry of [`GOALS`] above `xp`, capped at
/// the last one.
pub fn next_level_goal(xp: i64) -> i64 {
    let top = GOALS[GOALS.len() - 1];
    GOALS[..GOALS.len() - 1]
        .iter()
        .copied()
        .find(|goal| xp < *goal)
        .unwrap_or(top)
}

/// Percentage of the way to [`next_level_goal`], capped at 100.
pub fn level_progress(xp: i64) -> i64 {
    let goal = next_level_goal(xp);
    if goal <= 0 {
        return 100;
    }
    (xp.max(0) * 100 / goal).min(100)
}

/// Streak after activity on `today`, given the last active day.
pub fn next_streak(last_activity: Option<NaiveDate>, streak_days: i64, today: NaiveDate) -> i64 {
    match last_activity {
        Some(last) if last == today => streak_days.max(1),
        Some(last) if today.pred_opt() == Some(last) => streak_days + 1,
        _ => 1,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Progress {
    pub xp: i64,
    pub current_level: String,
    pub streak_days: i64,
    pub next_level_goal: i64,
    pub level_progress: i64,
}

impl Progress {
    pub fn of(user: &User) -> Self {
        Self {
            xp: user.xp,
            current_level: user.current_level.clone(),
            streak_days: user.streak_days,
            next_level_goal: next_level_goal(user.xp),
            level_progress: level_progress(user.xp),
        }
    }
}

/// Award `xp_gain` and advance the streak for activity on `on`.
pub async fn record_activity(
    conn: &mut SqliteConnection,
    user_id: &str,
    xp_gain: i64,
    on: NaiveDate,
) -> ServiceResult<Progress> {
    let user = UserRepository::find_by_id_in(conn, user_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("User not found"))?;

    let last_activity = user
        .last_activity_date
        .as_deref()
        .and_then(|value| NaiveDate::parse_from_str(value, "%Y-%m-%d").ok());

    let xp = user.xp + xp_gain;
    let level = level_for_xp(xp);
    let streak = next_streak(last_activity, user.streak_days, on);

    UserRepository::apply_progress_in(conn, user_id, xp, level, streak, &on.to_string()).await?;

    if level != user.current_level {
        debug!(user_id, from = %user.current_level, to = level, "level changed");
    }

    Ok(Progress {
        xp,
        current_level: level.to_string(),
        streak_days: streak,
        next_level_goal: next_level_goal(xp),
        level_progress: level_progress(xp),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_utils::{create_test_db, create_user};

    fn date(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn levels_follow_the_ladder() {
        assert_eq!(level_for_xp(0), "Beginner");
        assert_eq!(level_for_xp(99), "Beginner");
        assert_eq!(level_for_xp(100), "A1 Elementary");
        assert_eq!(level_for_xp(999), "A2 Pre-Intermediate");
        assert_eq!(level_for_xp(1999), "B1 Intermediate");
        assert_eq!(level_for_xp(3999), "B2 Upper-Intermediate");
        assert_eq!(level_for_xp(4000), "C1 Advanced");
    }

    #[test]
    fn goal_and_progress() {
        assert_eq!(next_level_goal(0), 500);
        assert_eq!(next_level_goal(150), 500);
        assert_eq!(level_progress(150), 30);
        assert_eq!(next_level_goal(500), 2000);
        assert_eq!(next_level_goal(4999), 5000);
        assert_eq!(next_level_goal(5000), 10_000);
        assert_eq!(level_progress(5000), 50);
        assert_eq!(next_level_goal(24_999), 25_000);
        assert_eq!(next_level_goal(25_000), 100_000);
        assert_eq!(next_level_goal(250_000), 100_000);
        assert_eq!(level_progress(250_000), 100);
        assert_eq!(level_progress(0), 0);
    }

    #[test]
    fn streak_rules() {
        let today = date("2024-03-10");
        assert_eq!(next_streak(None, 0, today), 1);
        assert_eq!(next_streak(Some(today), 4, today), 4);
        assert_eq!(next_streak(Some(date("2024-03-09")), 4, today), 5);
        assert_eq!(next_streak(Some(date("2024-03-07")), 4, today), 1);
        assert_eq!(next_streak(Some(date("2024-02-29")), 2, date("2024-03-01")), 3);
    }

    #[tokio::test]
    async fn crossing_one_hundred_xp_changes_level() {
        let (pool, _dir) = create_test_db().await;
        let user = create_user(&pool, "leveler").await;
        let mut conn = pool.acquire().await.unwrap();

        let day = date("2024-05-01");
        let progress = record_activity(&mut conn, &user.id, 90, day).await.unwrap();
        assert_eq!(progress.current_level, "Beginner");
        assert_eq!(progress.streak_days, 1);

        let progress = record_activity(&mut conn, &user.id, 10, day).await.unwrap();
        assert_eq!(progress.xp, 100);
        assert_eq!(progress.current_level, "A1 Elementary");
        assert_eq!(progress.streak_days, 1);

        let progress = record_activity(&mut conn, &user.id, 0, date("2024-05-02")).await.unwrap();
        assert_eq!(progress.streak_days, 2);

        let progress = record_activity(&mut conn, &user.id, 0, date("2024-05-05")).await.unwrap();
        assert_eq!(progress.streak_days, 1);

        let stored = UserRepository::find_by_id_in(&mut conn, &user.id).await.unwrap().unwrap();
        assert_eq!(stored.last_activity_date.as_deref(), Some("2024-05-05"));
        assert_eq!(stored.current_level, "A1 Elementary");
    }
}
