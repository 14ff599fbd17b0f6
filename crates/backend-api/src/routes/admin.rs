//! Moderation endpoints. Everything here sits behind the admin gate; account
//! management additionally requires the super-admin role.

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use lanxpert_database::{
    AdminAction, AnswerReport, AnswerRepository, ArticleRepository, ArticleView, AuditRepository, ChatRepository,
    LimitRepository, NewWord, QuestionFilter, QuestionRepository, QuestionView, QuotaKind, TokenRepository,
    User, UserReport, UserRepository, Word, WordFilter, WordRepository,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::services::admin::{self, audit, BulkImportResult};
use crate::util::{page, Pagination};
use crate::{ApiError, AppState};

const DEFAULT_PAGE: i64 = 50;

const REPORT_STATUSES: [&str; 4] = ["open", "reviewed", "resolved", "dismissed"];

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardStats {
    pub users: i64,
    pub words: i64,
    pub articles: i64,
    pub questions: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminStatusResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AdminStatusResponse {
    fn ok(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            status: "success".to_string(),
            message: Some(message.into()),
        })
    }

    fn deleted() -> Json<Self> {
        Json(Self {
            status: "deleted".to_string(),
            message: None,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ToggleActiveResponse {
    pub status: String,
    pub is_active: bool,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserSearchQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    /// Substring of the username or email.
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PromoteQuery {
    pub role: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ResetLimitsQuery {
    /// `all`, `words`, `questions`, `answers` or `articles`.
    pub limit_type: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReportQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    /// Restrict user reports to one status.
    pub status: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReportsResponse {
    pub user_reports: Vec<UserReport>,
    pub answer_reports: Vec<AnswerReport>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateReportRequest {
    pub status: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ActionsQuery {
    pub limit: Option<i64>,
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/dashboard-stats",
    tag = "Admin",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Platform totals", body = DashboardStats),
        (status = 403, description = "Admin or moderator role required", body = crate::error::ErrorResponse)
    )
)]
pub async fn dashboard_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<DashboardStats>, ApiError> {
    state.require_admin(&headers).await?;
    let pool = state.db_pool().clone();

    Ok(Json(DashboardStats {
        users: UserRepository::new(pool.clone()).count().await?,
        words: WordRepository::new(pool.clone()).count().await?,
        articles: ArticleRepository::new(pool.clone()).count().await?,
        questions: QuestionRepository::new(pool).count().await?,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/words",
    tag = "Admin",
    security(("bearerAuth" = [])),
    params(WordFilter),
    responses((status = 200, description = "Words matching the filters", body = [Word]))
)]
pub async fn list_words(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(filter): Query<WordFilter>,
) -> Result<Json<Vec<Word>>, ApiError> {
    state.require_admin(&headers).await?;
    let (skip, limit) = page(filter.skip, filter.limit, DEFAULT_PAGE);

    let words = WordRepository::new(state.db_pool().clone())
        .list(&filter, skip, limit)
        .await?;
    Ok(Json(words))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/words/bulk",
    tag = "Admin",
    security(("bearerAuth" = [])),
    request_body = Vec<NewWord>,
    responses((status = 200, description = "Import summary", body = BulkImportResult))
)]
pub async fn bulk_create_words(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(items): Json<Vec<NewWord>>,
) -> Result<Json<BulkImportResult>, ApiError> {
    let admin = state.require_admin(&headers).await?;
    let result = admin::bulk_create_words(state.db_pool(), &admin, &items).await?;
    Ok(Json(result))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/questions",
    tag = "Admin",
    security(("bearerAuth" = [])),
    params(Pagination),
    responses((status = 200, description = "All questions, newest first", body = [QuestionView]))
)]
pub async fn list_questions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Vec<QuestionView>>, ApiError> {
    state.require_admin(&headers).await?;
    let (skip, limit) = pagination.resolve(DEFAULT_PAGE);

    let questions = QuestionRepository::new(state.db_pool().clone())
        .list(&QuestionFilter::default(), skip, limit)
        .await?;
    Ok(Json(questions))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/questions/{question_id}",
    tag = "Admin",
    security(("bearerAuth" = [])),
    params(("question_id" = String, Path, description = "Question id")),
    responses(
        (status = 200, description = "Question deleted", body = AdminStatusResponse),
        (status = 404, description = "Question not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_question(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(question_id): Path<String>,
) -> Result<Json<AdminStatusResponse>, ApiError> {
    let admin = state.require_admin(&headers).await?;

    let deleted = QuestionRepository::new(state.db_pool().clone())
        .delete(&question_id)
        .await?;
    if !deleted {
        return Err(ApiError::not_found("Question not found"));
    }

    audit(state.db_pool(), &admin, "delete_question", "questions", Some(&question_id)).await?;
    Ok(AdminStatusResponse::deleted())
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/articles",
    tag = "Admin",
    security(("bearerAuth" = [])),
    params(Pagination),
    responses((status = 200, description = "All articles including drafts", body = [ArticleView]))
)]
pub async fn list_articles(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Vec<ArticleView>>, ApiError> {
    state.require_admin(&headers).await?;
    let (skip, limit) = pagination.resolve(DEFAULT_PAGE);

    let articles = ArticleRepository::new(state.db_pool().clone())
        .list_all(skip, limit)
        .await?;
    Ok(Json(articles))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/articles/{article_id}",
    tag = "Admin",
    security(("bearerAuth" = [])),
    params(("article_id" = String, Path, description = "Article id")),
    responses(
        (status = 200, description = "Article deleted", body = AdminStatusResponse),
        (status = 404, description = "Article not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_article(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(article_id): Path<String>,
) -> Result<Json<AdminStatusResponse>, ApiError> {
    let admin = state.require_admin(&headers).await?;

    let deleted = ArticleRepository::new(state.db_pool().clone())
        .delete(&article_id)
        .await?;
    if !deleted {
        return Err(ApiError::not_found("Article not found"));
    }

    audit(state.db_pool(), &admin, "delete_article", "articles", Some(&article_id)).await?;
    Ok(AdminStatusResponse::deleted())
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/reports",
    tag = "Admin",
    security(("bearerAuth" = [])),
    params(ReportQuery),
    responses((status = 200, description = "User and answer reports, newest first", body = ReportsResponse))
)]
pub async fn list_reports(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ReportQuery>,
) -> Result<Json<ReportsResponse>, ApiError> {
    state.require_admin(&headers).await?;
    let (skip, limit) = page(query.skip, query.limit, DEFAULT_PAGE);
    let status = query.status.as_deref().filter(|s| !s.is_empty() && *s != "all");

    let user_reports = ChatRepository::new(state.db_pool().clone())
        .list_reports(status, skip, limit)
        .await?;
    let answer_reports = AnswerRepository::new(state.db_pool().clone())
        .list_reports(skip, limit)
        .await?;

    Ok(Json(ReportsResponse {
        user_reports,
        answer_reports,
    }))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/reports/{report_id}",
    tag = "Admin",
    security(("bearerAuth" = [])),
    params(("report_id" = String, Path, description = "User report id")),
    request_body = UpdateReportRequest,
    responses(
        (status = 200, description = "Report updated", body = UserReport),
        (status = 400, description = "Unknown status", body = crate::error::ErrorResponse),
        (status = 404, description = "Report not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_report(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(report_id): Path<String>,
    Json(request): Json<UpdateReportRequest>,
) -> Result<Json<UserReport>, ApiError> {
    let admin = state.require_admin(&headers).await?;

    let status = request.status.trim();
    if !REPORT_STATUSES.contains(&status) {
        return Err(ApiError::bad_request(format!(
            "Status must be one of: {}",
            REPORT_STATUSES.join(", ")
        )));
    }

    let report = ChatRepository::new(state.db_pool().clone())
        .set_report_status(&report_id, status)
        .await?;
    audit(state.db_pool(), &admin, "update_report", "user_reports", Some(&report_id)).await?;
    Ok(Json(report))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/actions",
    tag = "Admin",
    security(("bearerAuth" = [])),
    params(ActionsQuery),
    responses((status = 200, description = "Most recent moderation actions", body = [AdminAction]))
)]
pub async fn recent_actions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ActionsQuery>,
) -> Result<Json<Vec<AdminAction>>, ApiError> {
    state.require_admin(&headers).await?;
    let (_, limit) = page(None, query.limit, DEFAULT_PAGE);

    let actions = AuditRepository::new(state.db_pool().clone())
        .recent_actions(limit)
        .await?;
    Ok(Json(actions))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/users",
    tag = "Admin",
    security(("bearerAuth" = [])),
    params(UserSearchQuery),
    responses(
        (status = 200, description = "Accounts, newest first", body = [User]),
        (status = 403, description = "Super admin access required", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<UserSearchQuery>,
) -> Result<Json<Vec<User>>, ApiError> {
    state.require_super_admin(&headers).await?;
    let (skip, limit) = page(query.skip, query.limit, DEFAULT_PAGE);

    let users = UserRepository::new(state.db_pool().clone())
        .list(query.search.as_deref(), skip, limit)
        .await?;
    Ok(Json(users))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/users/{user_id}/toggle-active",
    tag = "Admin",
    security(("bearerAuth" = [])),
    params(("user_id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "New activation state", body = ToggleActiveResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn toggle_active(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Result<Json<ToggleActiveResponse>, ApiError> {
    let admin = state.require_super_admin(&headers).await?;
    let target = find_account(&state, &user_id).await?;
    if target.id == admin.id {
        return Err(ApiError::bad_request("Cannot deactivate your own account"));
    }

    let is_active = !target.is_active;
    UserRepository::new(state.db_pool().clone())
        .set_active(&target.id, is_active)
        .await?;
    if !is_active {
        let revoked = TokenRepository::new(state.db_pool().clone())
            .revoke_all_for_user(&target.id)
            .await?;
        info!(user_id = %target.id, revoked, "deactivated user sessions revoked");
    }
    audit(state.db_pool(), &admin, "toggle_user_active", "users", Some(&target.id)).await?;

    Ok(Json(ToggleActiveResponse {
        status: "success".to_string(),
        is_active,
    }))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/users/{user_id}/promote",
    tag = "Admin",
    security(("bearerAuth" = [])),
    params(("user_id" = String, Path, description = "User id"), PromoteQuery),
    responses(
        (status = 200, description = "Role granted", body = AdminStatusResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn promote_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
    Query(query): Query<PromoteQuery>,
) -> Result<Json<AdminStatusResponse>, ApiError> {
    let admin = state.require_super_admin(&headers).await?;
    let role = query.role.trim().to_lowercase();
    if role.is_empty() {
        return Err(ApiError::bad_request("Role is required"));
    }
    let target = find_account(&state, &user_id).await?;

    UserRepository::new(state.db_pool().clone())
        .assign_role(&target.id, &role)
        .await?;
    audit(state.db_pool(), &admin, &format!("promote_user:{role}"), "users", Some(&target.id)).await?;

    Ok(AdminStatusResponse::ok(format!("User promoted to {role}")))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/users/{user_id}/roles/{role_name}",
    tag = "Admin",
    security(("bearerAuth" = [])),
    params(
        ("user_id" = String, Path, description = "User id"),
        ("role_name" = String, Path, description = "Role to remove")
    ),
    responses(
        (status = 200, description = "Role removed", body = AdminStatusResponse),
        (status = 404, description = "User or role not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn remove_role(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((user_id, role_name)): Path<(String, String)>,
) -> Result<Json<AdminStatusResponse>, ApiError> {
    let admin = state.require_super_admin(&headers).await?;
    let target = find_account(&state, &user_id).await?;

    let removed = UserRepository::new(state.db_pool().clone())
        .remove_role(&target.id, &role_name)
        .await?;
    if !removed {
        return Err(ApiError::not_found("Role not found"));
    }
    audit(state.db_pool(), &admin, &format!("remove_role:{role_name}"), "users", Some(&target.id)).await?;

    Ok(AdminStatusResponse::ok(format!("Role {role_name} removed")))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/users/{user_id}/reset-limits",
    tag = "Admin",
    security(("bearerAuth" = [])),
    params(("user_id" = String, Path, description = "User id"), ResetLimitsQuery),
    responses(
        (status = 200, description = "Today's counters reset", body = AdminStatusResponse),
        (status = 400, description = "Unknown limit type", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn reset_limits(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
    Query(query): Query<ResetLimitsQuery>,
) -> Result<Json<AdminStatusResponse>, ApiError> {
    let admin = state.require_super_admin(&headers).await?;
    let target = find_account(&state, &user_id).await?;

    let kind = match query.limit_type.as_deref().unwrap_or("all") {
        "all" => None,
        other => Some(other.parse::<QuotaKind>().map_err(ApiError::bad_request)?),
    };

    LimitRepository::new(state.db_pool().clone())
        .reset(&target.id, lanxpert_database::today(), kind)
        .await?;
    audit(state.db_pool(), &admin, "reset_limits", "user_daily_limits", Some(&target.id)).await?;

    Ok(AdminStatusResponse::ok("Limits reset"))
}

async fn find_account(state: &AppState, user_id: &str) -> Result<User, ApiError> {
    UserRepository::new(state.db_pool().clone())
        .find_by_id(user_id)
        .await?
        .filter(|user| !user.is_deleted())
        .ok_or_else(|| ApiError::not_found("User not found"))
}
