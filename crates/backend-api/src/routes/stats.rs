use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use lanxpert_database::today;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::services::{
    quota::{self, DailyQuotaReport},
    stats::{self, ActivityEntry, OverviewStats},
};
use crate::util::MAX_PAGE_SIZE;
use crate::{ApiError, AppState};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ActivityQuery {
    /// Defaults to 5.
    pub limit: Option<i64>,
}

#[utoipa::path(
    get,
    path = "/api/v1/stats/overview",
    tag = "Stats",
    security(("bearerAuth" = [])),
    responses((status = 200, description = "Learning totals and level progress", body = OverviewStats))
)]
pub async fn overview(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<OverviewStats>, ApiError> {
    let user = state.current_user(&headers).await?;
    Ok(Json(stats::overview(state.db_pool(), &user).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/stats/activity",
    tag = "Stats",
    security(("bearerAuth" = [])),
    params(ActivityQuery),
    responses((status = 200, description = "Recent questions and articles", body = [ActivityEntry]))
)]
pub async fn activity(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<Vec<ActivityEntry>>, ApiError> {
    let user = state.current_user(&headers).await?;
    let limit = query.limit.unwrap_or(5).clamp(1, MAX_PAGE_SIZE);
    Ok(Json(stats::recent_activity(state.db_pool(), &user, limit).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/stats/daily",
    tag = "Stats",
    security(("bearerAuth" = [])),
    responses((status = 200, description = "Today's quota usage against the plan", body = DailyQuotaReport))
)]
pub async fn daily(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<DailyQuotaReport>, ApiError> {
    let user = state.current_user(&headers).await?;
    Ok(Json(quota::daily_report(state.db_pool(), &user, today()).await?))
}
