use crate::handlers::{
    admin::{delete_user, get_all_documents, get_user_logs, get_users, update_user},
    auth::{
        check_username, forgot_password, login, logout, me, refresh_token, register,
        resend_verification, reset_password, session_info, verify_email,
    },
    documents::{
        bulk_upload_documents, delete_document, get_document, get_documents, upload_avatar,
        upload_document,
    },
    health::health_check,
    profile::{change_password, get_profile, update_profile},
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Uploads have to fit the multipart body cap with some headroom over the
/// 10MB per-file limit.
const MAX_BODY_BYTES: usize = 12 * 1024 * 1024;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Registration and login
        .route("/api/v1/auth/register", post(register))
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/logout", post(logout))
        .route("/api/v1/auth/refresh", post(refresh_token))
        .route("/api/v1/auth/me", get(me))
        .route("/api/v1/auth/session", get(session_info))
        // Email verification and password recovery
        .route("/api/v1/auth/verify-email", post(verify_email))
        .route("/api/v1/auth/resend-verification", post(resend_verification))
        .route("/api/v1/auth/check-username", post(check_username))
        .route("/api/v1/auth/forgot-password", post(forgot_password))
        .route("/api/v1/auth/reset-password", post(reset_password))
        // Profile management
        .route("/api/v1/users/profile", get(get_profile))
        .route("/api/v1/users/profile", put(update_profile))
        .route("/api/v1/users/password", put(change_password))
        .route("/api/v1/users/avatar", post(upload_avatar))
        // Documents
        .route("/api/v1/users/documents", post(upload_document))
        .route("/api/v1/users/documents", get(get_documents))
        .route("/api/v1/users/documents/bulk", post(bulk_upload_documents))
        .route("/api/v1/users/documents/:document_id", get(get_document))
        .route(
            "/api/v1/users/documents/:document_id",
            delete(delete_document),
        )
        // Administration
        .route("/api/v1/admin/users", get(get_users))
        .route("/api/v1/admin/users/:user_id", put(update_user))
        .route("/api/v1/admin/users/:user_id", delete(delete_user))
        .route("/api/v1/admin/documents", get(get_all_documents))
        .route("/api/v1/admin/logs", get(get_user_logs))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .with_state(state)
}
