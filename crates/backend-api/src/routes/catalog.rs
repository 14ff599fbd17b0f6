use axum::{extract::State, Json};
use lanxpert_database::{Language, LanguageRepository, Plan, PlanRepository};

use crate::{ApiError, AppState};

#[utoipa::path(
    get,
    path = "/api/v1/languages",
    tag = "Catalog",
    responses((status = 200, description = "Supported languages", body = [Language]))
)]
pub async fn list_languages(State(state): State<AppState>) -> Result<Json<Vec<Language>>, ApiError> {
    let languages = LanguageRepository::new(state.db_pool().clone()).list().await?;
    Ok(Json(languages))
}

#[utoipa::path(
    get,
    path = "/api/v1/plans",
    tag = "Catalog",
    responses((status = 200, description = "Active subscription plans", body = [Plan]))
)]
pub async fn list_plans(State(state): State<AppState>) -> Result<Json<Vec<Plan>>, ApiError> {
    let plans = PlanRepository::new(state.db_pool().clone()).list_active().await?;
    Ok(Json(plans))
}
