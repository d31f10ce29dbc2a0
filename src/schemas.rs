use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};

use crate::config::AppConfig;

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Runtime configuration (secrets, bcrypt cost, upload directory)
    pub config: AppConfig,
}

/// API response wrapper
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success status
    pub success: bool,
}

/// Error response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

/// Health check response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// Pagination metadata for list endpoints
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Pagination {
    /// Current page (1-based)
    pub page: u64,
    /// Page size
    pub limit: u64,
    /// Total number of matching items
    pub total: u64,
    /// Total number of pages
    pub pages: u64,
}

/// A page of items plus its pagination metadata
#[derive(Serialize, Deserialize, ToSchema)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::auth::register,
        crate::handlers::auth::login,
        crate::handlers::auth::refresh_token,
        crate::handlers::auth::logout,
        crate::handlers::auth::me,
        crate::handlers::auth::session_info,
        crate::handlers::auth::verify_email,
        crate::handlers::auth::resend_verification,
        crate::handlers::auth::check_username,
        crate::handlers::auth::forgot_password,
        crate::handlers::auth::reset_password,
        crate::handlers::profile::get_profile,
        crate::handlers::profile::update_profile,
        crate::handlers::profile::change_password,
        crate::handlers::documents::upload_document,
        crate::handlers::documents::bulk_upload_documents,
        crate::handlers::documents::upload_avatar,
        crate::handlers::documents::get_documents,
        crate::handlers::documents::get_document,
        crate::handlers::documents::delete_document,
        crate::handlers::admin::get_users,
        crate::handlers::admin::update_user,
        crate::handlers::admin::delete_user,
        crate::handlers::admin::get_all_documents,
        crate::handlers::admin::get_user_logs,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            Pagination,
            crate::handlers::auth::RegisterRequest,
            crate::handlers::auth::LoginRequest,
            crate::handlers::auth::LoginResponse,
            crate::handlers::auth::RefreshRequest,
            crate::handlers::auth::RefreshResponse,
            crate::handlers::auth::VerifyEmailRequest,
            crate::handlers::auth::ResendVerificationRequest,
            crate::handlers::auth::CheckUsernameRequest,
            crate::handlers::auth::CheckUsernameResponse,
            crate::handlers::auth::ForgotPasswordRequest,
            crate::handlers::auth::ResetPasswordRequest,
            crate::handlers::auth::UserSummary,
            crate::handlers::auth::MeResponse,
            crate::handlers::auth::SessionResponse,
            crate::handlers::profile::ProfileResponse,
            crate::handlers::profile::UpdateProfileRequest,
            crate::handlers::profile::ChangePasswordRequest,
            crate::handlers::documents::DocumentResponse,
            crate::handlers::documents::BulkUploadReport,
            crate::handlers::documents::BulkUploadResult,
            crate::handlers::admin::AdminUserResponse,
            crate::handlers::admin::AdminUpdateUserRequest,
            crate::handlers::admin::AdminDocumentResponse,
            crate::handlers::admin::UserLogResponse,
            ApiResponse<crate::handlers::auth::UserSummary>,
            ApiResponse<crate::handlers::auth::LoginResponse>,
            ApiResponse<crate::handlers::auth::RefreshResponse>,
            ApiResponse<crate::handlers::auth::MeResponse>,
            ApiResponse<crate::handlers::auth::SessionResponse>,
            ApiResponse<crate::handlers::auth::CheckUsernameResponse>,
            ApiResponse<crate::handlers::profile::ProfileResponse>,
            ApiResponse<crate::handlers::documents::DocumentResponse>,
            ApiResponse<crate::handlers::documents::BulkUploadReport>,
            ApiResponse<Paged<crate::handlers::documents::DocumentResponse>>,
            ApiResponse<Paged<crate::handlers::admin::AdminUserResponse>>,
            ApiResponse<Paged<crate::handlers::admin::AdminDocumentResponse>>,
            ApiResponse<Paged<crate::handlers::admin::UserLogResponse>>,
            ApiResponse<String>,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Registration, login, and token lifecycle"),
        (name = "profile", description = "Profile management for the signed-in user"),
        (name = "documents", description = "Document upload and management"),
        (name = "admin", description = "User administration endpoints"),
    ),
    info(
        title = "MyMentor API",
        description = "User management API - registration, authentication, profiles, documents, and administration",
        version = "0.1.0",
        contact(
            name = "MyMentor Team",
            email = "contact@mymentor.com"
        ),
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;

/// Registers the Bearer JWT scheme the protected paths reference.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
