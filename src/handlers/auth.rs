use axum::{extract::State, http::StatusCode, response::Json};
use chrono::{Duration, Utc};
use model::entities::prelude::{Session, User, VerificationToken};
use model::entities::{session, user, verification_token};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::audit::{log_user_action, RequestMeta};
use crate::auth::{self, password, tokens, CurrentUser};
use crate::errors::ApiError;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

/// Request body for registering a new account
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    #[validate(
        length(min = 3, max = 20, message = "Username must be 3-20 characters"),
        custom(function = validate_username_charset)
    )]
    pub username: String,
}

/// Request body for logging in. Accepts either the email or the username.
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email or username is required"))]
    pub email_or_username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub user: UserSummary,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RefreshResponse {
    pub access_token: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct VerifyEmailRequest {
    #[validate(length(min = 1, message = "Verification token is required"))]
    pub token: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct ResendVerificationRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CheckUsernameRequest {
    #[validate(
        length(min = 3, max = 20, message = "Username must be 3-20 characters"),
        custom(function = validate_username_charset)
    )]
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CheckUsernameResponse {
    pub available: bool,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "Reset token is required"))]
    pub token: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Public view of an account, shared by login and admin responses
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserSummary {
    pub id: i32,
    pub email: String,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub display_name: Option<String>,
    pub avatar: Option<String>,
    pub role: String,
    pub status: String,
}

impl From<user::Model> for UserSummary {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            username: model.username,
            first_name: model.first_name,
            last_name: model.last_name,
            display_name: model.display_name,
            avatar: model.avatar,
            role: model.role.as_str().to_string(),
            status: model.status.as_str().to_string(),
        }
    }
}

/// Identity as carried by the verified access token, no database round trip
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MeResponse {
    pub id: i32,
    pub email: String,
    pub role: String,
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    pub user: UserSummary,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

fn validate_username_charset(username: &str) -> Result<(), ValidationError> {
    if username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        Ok(())
    } else {
        let mut error = ValidationError::new("username_charset");
        error.message =
            Some("Username can only contain letters, numbers, underscores, and hyphens".into());
        Err(error)
    }
}

/// Create a one-time token row for email verification or password reset.
async fn create_one_time_token(
    db: &DatabaseConnection,
    user_id: i32,
    purpose: verification_token::TokenPurpose,
    ttl: Duration,
) -> Result<verification_token::Model, ApiError> {
    let now = Utc::now();
    let row = verification_token::ActiveModel {
        user_id: Set(user_id),
        purpose: Set(purpose),
        token: Set(tokens::generate_one_time_token()),
        expires_at: Set(now + ttl),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(row)
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = ApiResponse<UserSummary>),
        (status = 400, description = "Invalid request or duplicate email/username", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    meta: RequestMeta,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserSummary>>), ApiError> {
    payload.validate()?;
    debug!("Registering new user with email: {}", payload.email);

    // Reject duplicate email or username with a specific message
    let existing = User::find()
        .filter(
            Condition::any()
                .add(user::Column::Email.eq(payload.email.clone()))
                .add(user::Column::Username.eq(payload.username.clone())),
        )
        .one(&state.db)
        .await?;
    if let Some(existing) = existing {
        let message = if existing.email == payload.email {
            "Email already registered"
        } else {
            "Username already taken"
        };
        warn!("Registration rejected: {}", message);
        return Err(ApiError::Validation(message.to_string()));
    }

    let password_hash = password::hash_password(&payload.password, state.config.bcrypt_cost)?;

    let now = Utc::now();
    let new_user = user::ActiveModel {
        email: Set(payload.email.clone()),
        username: Set(payload.username.clone()),
        password_hash: Set(Some(password_hash)),
        first_name: Set(Some(payload.first_name.clone())),
        last_name: Set(Some(payload.last_name.clone())),
        display_name: Set(Some(format!(
            "{} {}",
            payload.first_name, payload.last_name
        ))),
        role: Set(user::UserRole::User),
        status: Set(user::UserStatus::PendingVerification),
        auth_provider: Set(user::AuthProvider::Local),
        email_verified: Set(false),
        login_attempts: Set(0),
        language: Set(Some("en".to_string())),
        currency: Set(Some("USD".to_string())),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let user_model = new_user.insert(&state.db).await?;

    // Email delivery is out of scope; the token is persisted for the
    // verification endpoint to consume.
    create_one_time_token(
        &state.db,
        user_model.id,
        verification_token::TokenPurpose::EmailVerification,
        Duration::hours(auth::EMAIL_VERIFICATION_HOURS),
    )
    .await?;

    log_user_action(
        &state.db,
        user_model.id,
        "USER_CREATED",
        Some(json!({"method": "registration"})),
        &meta,
    )
    .await;
    info!(
        "User registered with ID: {}, username: {}",
        user_model.id, user_model.username
    );

    let response = ApiResponse {
        data: UserSummary::from(user_model),
        message: "User registered successfully. Please check your email to verify your account."
            .to_string(),
        success: true,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Log in with email or username and password
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid credentials or locked account", body = ErrorResponse),
        (status = 403, description = "Unverified or inactive account", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    meta: RequestMeta,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    payload.validate()?;

    let user_model = User::find()
        .filter(
            Condition::any()
                .add(user::Column::Email.eq(payload.email_or_username.clone()))
                .add(user::Column::Username.eq(payload.email_or_username.clone())),
        )
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".to_string()))?;

    // Reject while the lockout window is open. The message stays generic so
    // the counter state is not observable from outside.
    if let Some(locked_until) = user_model.locked_until {
        if locked_until > Utc::now() {
            warn!("Login rejected for locked user {}", user_model.id);
            return Err(ApiError::Unauthorized(
                "Account is temporarily locked. Try again later.".to_string(),
            ));
        }
    }

    let password_hash = user_model
        .password_hash
        .clone()
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".to_string()))?;
    if !password::verify_password(&payload.password, &password_hash)? {
        auth::register_failed_login(&state.db, &user_model).await?;
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    if !user_model.email_verified {
        return Err(ApiError::Forbidden("Email is not verified".to_string()));
    }
    if user_model.status != user::UserStatus::Active {
        return Err(ApiError::Forbidden("Account is not active".to_string()));
    }

    // Success: clear lockout bookkeeping and stamp activity
    let now = Utc::now();
    let mut active: user::ActiveModel = user_model.into();
    active.login_attempts = Set(0);
    active.locked_until = Set(None);
    active.last_login_at = Set(Some(now));
    active.last_active_at = Set(Some(now));
    active.updated_at = Set(now);
    let user_model = active.update(&state.db).await?;

    // Server-side session plus revocable refresh token
    session::ActiveModel {
        session_token: Set(Uuid::new_v4().to_string()),
        user_id: Set(user_model.id),
        expires_at: Set(now + Duration::days(auth::SESSION_DAYS)),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    let refresh_token = auth::issue_refresh_token(&state.db, user_model.id, &state.config).await?;
    let access_token = tokens::generate_access_token(&user_model, &state.config)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("failed to sign access token: {}", e)))?;

    log_user_action(
        &state.db,
        user_model.id,
        "LOGIN",
        Some(json!({"method": "password"})),
        &meta,
    )
    .await;
    info!("User {} logged in", user_model.id);

    let response = ApiResponse {
        data: LoginResponse {
            user: UserSummary::from(user_model),
            access_token,
            refresh_token,
        },
        message: "Login successful".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Exchange a refresh token for a fresh access token
#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    tag = "auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Access token refreshed", body = ApiResponse<RefreshResponse>),
        (status = 401, description = "Invalid or revoked refresh token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, payload))]
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<ApiResponse<RefreshResponse>>, ApiError> {
    let user_model =
        auth::validate_refresh_token(&state.db, &payload.refresh_token, &state.config).await?;

    let access_token = tokens::generate_access_token(&user_model, &state.config)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("failed to sign access token: {}", e)))?;

    debug!("Issued fresh access token for user {}", user_model.id);
    let response = ApiResponse {
        data: RefreshResponse { access_token },
        message: "Access token refreshed".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Log out: revoke all refresh tokens and sessions of the caller
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Logged out successfully", body = ApiResponse<String>),
        (status = 401, description = "No active session", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn logout(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    meta: RequestMeta,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    log_user_action(
        &state.db,
        claims.sub,
        "LOGOUT",
        Some(json!({"method": "api"})),
        &meta,
    )
    .await;

    // Stamp last activity before the tokens go away
    if let Some(user_model) = User::find_by_id(claims.sub).one(&state.db).await? {
        let mut active: user::ActiveModel = user_model.into();
        active.last_active_at = Set(Some(Utc::now()));
        active.update(&state.db).await?;
    }

    auth::revoke_user_tokens(&state.db, claims.sub).await?;
    info!("User {} logged out", claims.sub);

    let response = ApiResponse {
        data: String::new(),
        message: "Logged out successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Identity of the caller, straight from the verified token
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Current identity", body = ApiResponse<MeResponse>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument]
pub async fn me(
    CurrentUser(claims): CurrentUser,
) -> Result<Json<ApiResponse<MeResponse>>, ApiError> {
    let response = ApiResponse {
        data: MeResponse {
            id: claims.sub,
            email: claims.email,
            role: claims.role.as_str().to_string(),
            status: claims.status.as_str().to_string(),
        },
        message: "Current identity retrieved".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Current server-side session of the caller
#[utoipa::path(
    get,
    path = "/api/v1/auth/session",
    tag = "auth",
    responses(
        (status = 200, description = "Active session", body = ApiResponse<SessionResponse>),
        (status = 401, description = "No active session", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn session_info(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
) -> Result<Json<ApiResponse<SessionResponse>>, ApiError> {
    let session_row = Session::find()
        .filter(session::Column::UserId.eq(claims.sub))
        .order_by_desc(session::Column::CreatedAt)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("No active session".to_string()))?;

    if session_row.expires_at < Utc::now() {
        return Err(ApiError::Unauthorized("No active session".to_string()));
    }

    let user_model = User::find_by_id(claims.sub)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let response = ApiResponse {
        data: SessionResponse {
            user: UserSummary::from(user_model),
            expires_at: session_row.expires_at,
        },
        message: "Session retrieved successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Confirm an email address with a one-time token
#[utoipa::path(
    post,
    path = "/api/v1/auth/verify-email",
    tag = "auth",
    request_body = VerifyEmailRequest,
    responses(
        (status = 200, description = "Email verified", body = ApiResponse<String>),
        (status = 400, description = "Invalid or expired verification token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, payload))]
pub async fn verify_email(
    State(state): State<AppState>,
    meta: RequestMeta,
    Json(payload): Json<VerifyEmailRequest>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    payload.validate()?;

    let invalid = || ApiError::Validation("Invalid or expired verification token".to_string());

    let token_row = VerificationToken::find()
        .filter(verification_token::Column::Token.eq(payload.token.clone()))
        .filter(
            verification_token::Column::Purpose
                .eq(verification_token::TokenPurpose::EmailVerification),
        )
        .one(&state.db)
        .await?
        .ok_or_else(invalid)?;

    if token_row.expires_at < Utc::now() {
        return Err(invalid());
    }

    let user_model = User::find_by_id(token_row.user_id)
        .one(&state.db)
        .await?
        .ok_or_else(invalid)?;
    if user_model.email_verified {
        return Err(invalid());
    }

    let user_id = user_model.id;
    let was_pending = user_model.status == user::UserStatus::PendingVerification;
    let mut active: user::ActiveModel = user_model.into();
    active.email_verified = Set(true);
    if was_pending {
        // Activate the account on first verification
        active.status = Set(user::UserStatus::Active);
    }
    active.updated_at = Set(Utc::now());
    active.update(&state.db).await?;

    VerificationToken::delete_by_id(token_row.id)
        .exec(&state.db)
        .await?;

    log_user_action(
        &state.db,
        user_id,
        "EMAIL_VERIFIED",
        Some(json!({"method": "token"})),
        &meta,
    )
    .await;
    info!("Email verified for user {}", user_id);

    let response = ApiResponse {
        data: String::new(),
        message: "Email verified successfully. You can now login to your account.".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Request a fresh verification email
#[utoipa::path(
    post,
    path = "/api/v1/auth/resend-verification",
    tag = "auth",
    request_body = ResendVerificationRequest,
    responses(
        (status = 200, description = "Verification email queued if the account exists", body = ApiResponse<String>),
        (status = 429, description = "Requested again too soon", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, payload))]
pub async fn resend_verification(
    State(state): State<AppState>,
    meta: RequestMeta,
    Json(payload): Json<ResendVerificationRequest>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    payload.validate()?;

    // The response is identical whether or not the account exists
    let neutral = ApiResponse {
        data: String::new(),
        message: "If an account with that email exists, a verification link has been sent."
            .to_string(),
        success: true,
    };

    let Some(user_model) = User::find()
        .filter(user::Column::Email.eq(payload.email.clone()))
        .one(&state.db)
        .await?
    else {
        return Ok(Json(neutral));
    };

    if user_model.email_verified || user_model.auth_provider != user::AuthProvider::Local {
        return Ok(Json(neutral));
    }

    // Throttle repeated requests
    let recent = VerificationToken::find()
        .filter(verification_token::Column::UserId.eq(user_model.id))
        .filter(
            verification_token::Column::Purpose
                .eq(verification_token::TokenPurpose::EmailVerification),
        )
        .filter(
            verification_token::Column::CreatedAt
                .gt(Utc::now() - Duration::minutes(auth::RESEND_COOLDOWN_MINUTES)),
        )
        .one(&state.db)
        .await?;
    if recent.is_some() {
        return Err(ApiError::TooManyRequests(format!(
            "Please wait {} minutes before requesting another verification email.",
            auth::RESEND_COOLDOWN_MINUTES
        )));
    }

    // Replace any outstanding verification token
    VerificationToken::delete_many()
        .filter(verification_token::Column::UserId.eq(user_model.id))
        .filter(
            verification_token::Column::Purpose
                .eq(verification_token::TokenPurpose::EmailVerification),
        )
        .exec(&state.db)
        .await?;
    create_one_time_token(
        &state.db,
        user_model.id,
        verification_token::TokenPurpose::EmailVerification,
        Duration::hours(auth::EMAIL_VERIFICATION_HOURS),
    )
    .await?;

    log_user_action(
        &state.db,
        user_model.id,
        "VERIFICATION_EMAIL_RESENT",
        Some(json!({"method": "api"})),
        &meta,
    )
    .await;

    Ok(Json(neutral))
}

/// Check whether a username is still available
#[utoipa::path(
    post,
    path = "/api/v1/auth/check-username",
    tag = "auth",
    request_body = CheckUsernameRequest,
    responses(
        (status = 200, description = "Availability checked", body = ApiResponse<CheckUsernameResponse>),
        (status = 400, description = "Invalid username", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn check_username(
    State(state): State<AppState>,
    Json(payload): Json<CheckUsernameRequest>,
) -> Result<Json<ApiResponse<CheckUsernameResponse>>, ApiError> {
    payload.validate()?;

    let existing = User::find()
        .filter(user::Column::Username.eq(payload.username.clone()))
        .one(&state.db)
        .await?;

    let available = existing.is_none();
    let response = ApiResponse {
        data: CheckUsernameResponse { available },
        message: if available {
            "Username is available".to_string()
        } else {
            "Username is already taken".to_string()
        },
        success: true,
    };
    Ok(Json(response))
}

/// Request a password reset token
#[utoipa::path(
    post,
    path = "/api/v1/auth/forgot-password",
    tag = "auth",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset link queued if the account exists", body = ApiResponse<String>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    meta: RequestMeta,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    payload.validate()?;

    // The response is identical whether or not the account exists
    let neutral = ApiResponse {
        data: String::new(),
        message: "If an account with that email exists, a password reset link has been sent."
            .to_string(),
        success: true,
    };

    let Some(user_model) = User::find()
        .filter(user::Column::Email.eq(payload.email.clone()))
        .one(&state.db)
        .await?
    else {
        return Ok(Json(neutral));
    };

    if user_model.auth_provider != user::AuthProvider::Local {
        return Ok(Json(neutral));
    }

    // Replace any outstanding reset token
    VerificationToken::delete_many()
        .filter(verification_token::Column::UserId.eq(user_model.id))
        .filter(
            verification_token::Column::Purpose
                .eq(verification_token::TokenPurpose::PasswordReset),
        )
        .exec(&state.db)
        .await?;
    create_one_time_token(
        &state.db,
        user_model.id,
        verification_token::TokenPurpose::PasswordReset,
        Duration::hours(auth::PASSWORD_RESET_HOURS),
    )
    .await?;

    log_user_action(
        &state.db,
        user_model.id,
        "PASSWORD_RESET_REQUESTED",
        Some(json!({"method": "email"})),
        &meta,
    )
    .await;

    Ok(Json(neutral))
}

/// Reset a password with a one-time token
#[utoipa::path(
    post,
    path = "/api/v1/auth/reset-password",
    tag = "auth",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset", body = ApiResponse<String>),
        (status = 400, description = "Invalid or expired reset token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    meta: RequestMeta,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    payload.validate()?;

    let invalid = || ApiError::Validation("Invalid or expired reset token".to_string());

    let token_row = VerificationToken::find()
        .filter(verification_token::Column::Token.eq(payload.token.clone()))
        .filter(
            verification_token::Column::Purpose
                .eq(verification_token::TokenPurpose::PasswordReset),
        )
        .one(&state.db)
        .await?
        .ok_or_else(invalid)?;

    if token_row.expires_at < Utc::now() {
        return Err(invalid());
    }

    let user_model = User::find_by_id(token_row.user_id)
        .one(&state.db)
        .await?
        .ok_or_else(invalid)?;

    if user_model.auth_provider != user::AuthProvider::Local {
        return Err(ApiError::Validation(
            "Password reset not available for external accounts".to_string(),
        ));
    }

    let password_hash = password::hash_password(&payload.password, state.config.bcrypt_cost)?;

    let user_id = user_model.id;
    let mut active: user::ActiveModel = user_model.into();
    active.password_hash = Set(Some(password_hash));
    // A completed reset also clears any lockout
    active.login_attempts = Set(0);
    active.locked_until = Set(None);
    active.updated_at = Set(Utc::now());
    active.update(&state.db).await?;

    VerificationToken::delete_by_id(token_row.id)
        .exec(&state.db)
        .await?;

    log_user_action(
        &state.db,
        user_id,
        "PASSWORD_RESET_COMPLETED",
        Some(json!({"method": "token"})),
        &meta,
    )
    .await;
    info!("Password reset completed for user {}", user_id);

    let response = ApiResponse {
        data: String::new(),
        message: "Password reset successfully. You can now login with your new password."
            .to_string(),
        success: true,
    };
    Ok(Json(response))
}
