use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(title = "LanXpert API", description = "Language exchange and vocabulary practice backend"),
    paths(
        crate::routes::health::root,
        crate::routes::health::health_check,
        crate::routes::auth::login,
        crate::routes::auth::refresh,
        crate::routes::auth::logout,
        crate::routes::users::register,
        crate::routes::users::get_current_user,
        crate::routes::users::update_current_user,
        crate::routes::users::get_public_profile,
        crate::routes::users::send_verification_email,
        crate::routes::users::verify_email,
        crate::routes::users::get_notification_settings,
        crate::routes::users::update_notification_settings,
        crate::routes::catalog::list_languages,
        crate::routes::catalog::list_plans,
        crate::routes::words::list_words,
        crate::routes::words::random_word,
        crate::routes::words::create_word,
        crate::routes::words::update_word,
        crate::routes::words::delete_word,
        crate::routes::questions::list_questions,
        crate::routes::questions::get_question,
        crate::routes::questions::create_question,
        crate::routes::questions::update_question,
        crate::routes::questions::delete_question,
        crate::routes::answers::create_answer,
        crate::routes::answers::update_answer,
        crate::routes::answers::delete_answer,
        crate::routes::answers::vote_answer,
        crate::routes::answers::report_answer,
        crate::routes::articles::list_articles,
        crate::routes::articles::get_article,
        crate::routes::articles::create_article,
        crate::routes::articles::update_article,
        crate::routes::articles::delete_article,
        crate::routes::articles::toggle_like,
        crate::routes::notifications::list_notifications,
        crate::routes::notifications::unread_count,
        crate::routes::notifications::mark_read,
        crate::routes::notifications::mark_all_read,
        crate::routes::stats::overview,
        crate::routes::stats::activity,
        crate::routes::stats::daily,
        crate::routes::chats::list_chats,
        crate::routes::chats::random_chat,
        crate::routes::chats::direct_chat,
        crate::routes::chats::list_messages,
        crate::routes::chats::send_message,
        crate::routes::chats::block_user,
        crate::routes::chats::unblock_user,
        crate::routes::chats::report_user,
        crate::routes::chats::leave_chat,
        crate::routes::admin::dashboard_stats,
        crate::routes::admin::list_words,
        crate::routes::admin::bulk_create_words,
        crate::routes::admin::list_questions,
        crate::routes::admin::delete_question,
        crate::routes::admin::list_articles,
        crate::routes::admin::delete_article,
        crate::routes::admin::list_reports,
        crate::routes::admin::update_report,
        crate::routes::admin::recent_actions,
        crate::routes::admin::list_users,
        crate::routes::admin::toggle_active,
        crate::routes::admin::promote_user,
        crate::routes::admin::remove_role,
        crate::routes::admin::reset_limits
    ),
    components(
        schemas(
            crate::error::ErrorResponse,
            crate::routes::health::HealthResponse,
            crate::routes::health::WelcomeResponse,
            crate::routes::auth::LoginRequest,
            crate::routes::auth::TokenResponse,
            crate::routes::auth::RefreshRequest,
            crate::routes::auth::LogoutResponse,
            crate::routes::users::RegisterRequest,
            crate::routes::users::UserResponse,
            crate::routes::users::VerificationSentResponse,
            crate::routes::users::VerifyEmailRequest,
            crate::routes::users::MessageResponse,
            crate::routes::users::UpdateNotificationSettingsRequest,
            crate::routes::questions::QuestionWithAnswers,
            crate::routes::answers::UpdateAnswerRequest,
            crate::routes::answers::VoteRequest,
            crate::routes::answers::VoteResponse,
            crate::routes::answers::ReportAnswerRequest,
            crate::routes::articles::LikeResponse,
            crate::routes::notifications::UnreadCountResponse,
            crate::routes::notifications::MarkAllReadResponse,
            crate::routes::chats::DirectChatRequest,
            crate::routes::chats::SendMessageRequest,
            crate::routes::chats::BlockRequest,
            crate::routes::chats::ReportUserRequest,
            crate::routes::chats::StatusResponse,
            crate::routes::chats::LeaveChatResponse,
            crate::routes::admin::DashboardStats,
            crate::routes::admin::AdminStatusResponse,
            crate::routes::admin::ToggleActiveResponse,
            crate::routes::admin::ReportsResponse,
            crate::routes::admin::UpdateReportRequest,
            crate::services::community::LikeStatus,
            crate::services::chat::LeaveOutcome,
            crate::services::quota::QuotaUsage,
            crate::services::quota::DailyQuotaReport,
            crate::services::stats::OverviewStats,
            crate::services::stats::ActivityEntry,
            crate::services::admin::BulkImportResult,
            lanxpert_database::User,
            lanxpert_database::PublicProfile,
            lanxpert_database::UpdateProfile,
            lanxpert_database::NotificationSettings,
            lanxpert_database::Notification,
            lanxpert_database::Language,
            lanxpert_database::Plan,
            lanxpert_database::Word,
            lanxpert_database::NewWord,
            lanxpert_database::UpdateWord,
            lanxpert_database::Question,
            lanxpert_database::QuestionView,
            lanxpert_database::NewQuestion,
            lanxpert_database::UpdateQuestion,
            lanxpert_database::Answer,
            lanxpert_database::AnswerView,
            lanxpert_database::NewAnswer,
            lanxpert_database::AnswerReport,
            lanxpert_database::Article,
            lanxpert_database::ArticleView,
            lanxpert_database::NewArticle,
            lanxpert_database::UpdateArticle,
            lanxpert_database::Chat,
            lanxpert_database::ChatType,
            lanxpert_database::ChatDetail,
            lanxpert_database::ChatParticipantView,
            lanxpert_database::Message,
            lanxpert_database::UserReport,
            lanxpert_database::AdminAction
        )
    ),
    tags(
        (name = "Health", description = "Service health endpoints"),
        (name = "Auth", description = "Login, token refresh and logout"),
        (name = "Users", description = "Registration, profiles and settings"),
        (name = "Catalog", description = "Languages and plans"),
        (name = "Words", description = "Vocabulary and study draws"),
        (name = "Questions", description = "Community questions"),
        (name = "Answers", description = "Answers, votes and reports"),
        (name = "Articles", description = "Learner articles and likes"),
        (name = "Notifications", description = "In-app notifications"),
        (name = "Stats", description = "Learning progress"),
        (name = "Chats", description = "Random and direct conversations"),
        (name = "Admin", description = "Moderation and account management")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        let schemes = &mut components.security_schemes;

        let mut scheme = SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer));
        if let SecurityScheme::Http(http) = &mut scheme {
            http.bearer_format = Some("JWT".to_string());
        }

        schemes.insert("bearerAuth".to_string(), scheme);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_api_path_is_versioned() {
        let doc = ApiDoc::openapi();
        for path in doc.paths.paths.keys() {
            assert!(
                path == "/" || path == "/health" || path.starts_with("/api/v1/"),
                "unexpected path {path}"
            );
        }
        assert!(doc.paths.paths.contains_key("/api/v1/chats/random"));
    }

    #[test]
    fn bearer_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearerAuth"));
    }
}
