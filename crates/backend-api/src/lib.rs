//! HTTP surface of the LanXpert backend: routing, extractors, error mapping and
//! the service layer behind the handlers.

mod docs;
mod error;
mod middleware;
mod state;
mod util;

pub mod routes;
pub mod services;

pub use docs::ApiDoc;
pub use error::{ApiError, ErrorResponse};
pub use state::{AppState, ADMIN_ROLES, SUPER_ADMIN_ROLE};

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config().cors.allowed_origins);

    let api = Router::new()
        // Auth
        .route("/token", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh))
        .route("/logout", post(routes::auth::logout))
        // Users
        .route("/users", post(routes::users::register))
        .route(
            "/users/me",
            get(routes::users::get_current_user).put(routes::users::update_current_user),
        )
        .route(
            "/users/me/notification-settings",
            get(routes::users::get_notification_settings)
                .put(routes::users::update_notification_settings),
        )
        .route(
            "/users/verify-email/send",
            post(routes::users::send_verification_email),
        )
        .route("/users/verify-email/verify", post(routes::users::verify_email))
        .route("/users/:user_id", get(routes::users::get_public_profile))
        // Catalog
        .route("/languages", get(routes::catalog::list_languages))
        .route("/plans", get(routes::catalog::list_plans))
        // Words
        .route(
            "/words",
            get(routes::words::list_words).post(routes::words::create_word),
        )
        .route("/words/random", get(routes::words::random_word))
        .route(
            "/words/:word_id",
            put(routes::words::update_word).delete(routes::words::delete_word),
        )
        // Questions and answers
        .route(
            "/questions",
            get(routes::questions::list_questions).post(routes::questions::create_question),
        )
        .route(
            "/questions/:question_id",
            get(routes::questions::get_question)
                .put(routes::questions::update_question)
                .delete(routes::questions::delete_question),
        )
        .route("/answers", post(routes::answers::create_answer))
        .route(
            "/answers/:answer_id",
            put(routes::answers::update_answer).delete(routes::answers::delete_answer),
        )
        .route("/answers/:answer_id/vote", post(routes::answers::vote_answer))
        .route("/answers/:answer_id/report", post(routes::answers::report_answer))
        // Articles
        .route(
            "/articles",
            get(routes::articles::list_articles).post(routes::articles::create_article),
        )
        .route(
            "/articles/:article_id",
            get(routes::articles::get_article)
                .put(routes::articles::update_article)
                .delete(routes::articles::delete_article),
        )
        .route("/articles/:article_id/like", post(routes::articles::toggle_like))
        // Notifications
        .route("/notifications", get(routes::notifications::list_notifications))
        .route(
            "/notifications/unread-count",
            get(routes::notifications::unread_count),
        )
        .route(
            "/notifications/read-all",
            post(routes::notifications::mark_all_read),
        )
        .route(
            "/notifications/:notification_id/read",
            put(routes::notifications::mark_read),
        )
        // Stats
        .route("/stats/overview", get(routes::stats::overview))
        .route("/stats/activity", get(routes::stats::activity))
        .route("/stats/daily", get(routes::stats::daily))
        // Chats
        .route("/chats", get(routes::chats::list_chats))
        .route("/chats/random", post(routes::chats::random_chat))
        .route("/chats/direct", post(routes::chats::direct_chat))
        .route("/chats/block", post(routes::chats::block_user))
        .route("/chats/block/:user_id", delete(routes::chats::unblock_user))
        .route("/chats/report", post(routes::chats::report_user))
        .route("/chats/:chat_id", delete(routes::chats::leave_chat))
        .route(
            "/chats/:chat_id/messages",
            get(routes::chats::list_messages).post(routes::chats::send_message),
        )
        // Admin
        .route("/admin/dashboard-stats", get(routes::admin::dashboard_stats))
        .route(
            "/admin/words",
            get(routes::admin::list_words).post(routes::words::create_word),
        )
        .route("/admin/words/bulk", post(routes::admin::bulk_create_words))
        .route(
            "/admin/words/:word_id",
            put(routes::words::update_word).delete(routes::words::delete_word),
        )
        .route("/admin/questions", get(routes::admin::list_questions))
        .route(
            "/admin/questions/:question_id",
            delete(routes::admin::delete_question),
        )
        .route("/admin/articles", get(routes::admin::list_articles))
        .route(
            "/admin/articles/:article_id",
            delete(routes::admin::delete_article),
        )
        .route("/admin/reports", get(routes::admin::list_reports))
        .route("/admin/reports/:report_id", put(routes::admin::update_report))
        .route("/admin/actions", get(routes::admin::recent_actions))
        .route("/admin/users", get(routes::admin::list_users))
        .route(
            "/admin/users/:user_id/toggle-active",
            put(routes::admin::toggle_active),
        )
        .route("/admin/users/:user_id/promote", put(routes::admin::promote_user))
        .route(
            "/admin/users/:user_id/roles/:role_name",
            delete(routes::admin::remove_role),
        )
        .route(
            "/admin/users/:user_id/reset-limits",
            post(routes::admin::reset_limits),
        );

    Router::new()
        .route("/", get(routes::health::root))
        .route("/health", get(routes::health::health_check))
        .nest("/api/v1", api)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        .layer(middleware::create_trace_layer())
}

/// A `*` entry allows every origin (without credentials); otherwise only the listed origins.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    if allowed_origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(origins).allow_credentials(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_origin_does_not_panic() {
        let _ = cors_layer(&["*".to_string()]);
        let _ = cors_layer(&["http://localhost:3000".to_string(), "not a header\n".to_string()]);
    }
}
