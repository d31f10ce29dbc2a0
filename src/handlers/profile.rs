use axum::{extract::State, response::Json};
use chrono::{DateTime, Utc};
use model::entities::prelude::User;
use model::entities::user;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::audit::{log_user_action, RequestMeta};
use crate::auth::{password, CurrentUser};
use crate::errors::ApiError;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

/// Full profile of the signed-in user
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    pub id: i32,
    pub email: String,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub display_name: Option<String>,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub timezone: Option<String>,
    pub language: Option<String>,
    pub currency: Option<String>,
    pub website: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub social_links: Option<serde_json::Value>,
    #[schema(value_type = Option<Object>)]
    pub preferences: Option<serde_json::Value>,
    pub role: String,
    pub status: String,
    pub auth_provider: String,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub last_active_at: Option<DateTime<Utc>>,
}

impl From<user::Model> for ProfileResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            username: model.username,
            first_name: model.first_name,
            last_name: model.last_name,
            display_name: model.display_name,
            avatar: model.avatar,
            bio: model.bio,
            phone: model.phone,
            location: model.location,
            timezone: model.timezone,
            language: model.language,
            currency: model.currency,
            website: model.website,
            social_links: model.social_links,
            preferences: model.preferences,
            role: model.role.as_str().to_string(),
            status: model.status.as_str().to_string(),
            auth_provider: model.auth_provider.as_str().to_string(),
            email_verified: model.email_verified,
            created_at: model.created_at,
            updated_at: model.updated_at,
            last_login_at: model.last_login_at,
            last_active_at: model.last_active_at,
        }
    }
}

/// Request body for a partial profile update
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: Option<String>,
    #[validate(length(min = 1, message = "Display name is required"))]
    pub display_name: Option<String>,
    #[validate(length(max = 500, message = "Bio must be less than 500 characters"))]
    pub bio: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub timezone: Option<String>,
    pub language: Option<String>,
    pub currency: Option<String>,
    #[validate(url(message = "Invalid website URL"))]
    pub website: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub social_links: Option<serde_json::Value>,
    #[schema(value_type = Option<Object>)]
    pub preferences: Option<serde_json::Value>,
}

/// Request body for changing the password while logged in
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

/// Get the caller's profile
#[utoipa::path(
    get,
    path = "/api/v1/users/profile",
    tag = "profile",
    responses(
        (status = 200, description = "Profile retrieved successfully", body = ApiResponse<ProfileResponse>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
) -> Result<Json<ApiResponse<ProfileResponse>>, ApiError> {
    let user_model = User::find_by_id(claims.sub)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let response = ApiResponse {
        data: ProfileResponse::from(user_model),
        message: "Profile retrieved successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Update the caller's profile. Only provided fields are touched.
#[utoipa::path(
    put,
    path = "/api/v1/users/profile",
    tag = "profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated successfully", body = ApiResponse<ProfileResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    meta: RequestMeta,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<ProfileResponse>>, ApiError> {
    payload.validate()?;

    let user_model = User::find_by_id(claims.sub)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let mut active: user::ActiveModel = user_model.into();
    let mut updated_fields = Vec::new();

    if let Some(first_name) = payload.first_name {
        active.first_name = Set(Some(first_name));
        updated_fields.push("first_name");
    }
    if let Some(last_name) = payload.last_name {
        active.last_name = Set(Some(last_name));
        updated_fields.push("last_name");
    }
    if let Some(display_name) = payload.display_name {
        active.display_name = Set(Some(display_name));
        updated_fields.push("display_name");
    }
    if let Some(bio) = payload.bio {
        active.bio = Set(Some(bio));
        updated_fields.push("bio");
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(Some(phone));
        updated_fields.push("phone");
    }
    if let Some(location) = payload.location {
        active.location = Set(Some(location));
        updated_fields.push("location");
    }
    if let Some(timezone) = payload.timezone {
        active.timezone = Set(Some(timezone));
        updated_fields.push("timezone");
    }
    if let Some(language) = payload.language {
        active.language = Set(Some(language));
        updated_fields.push("language");
    }
    if let Some(currency) = payload.currency {
        active.currency = Set(Some(currency));
        updated_fields.push("currency");
    }
    if let Some(website) = payload.website {
        active.website = Set(Some(website));
        updated_fields.push("website");
    }
    if let Some(social_links) = payload.social_links {
        active.social_links = Set(Some(social_links));
        updated_fields.push("social_links");
    }
    if let Some(preferences) = payload.preferences {
        active.preferences = Set(Some(preferences));
        updated_fields.push("preferences");
    }

    debug!("Updating profile fields: {}", updated_fields.join(", "));
    active.updated_at = Set(Utc::now());
    let updated_user = active.update(&state.db).await?;

    log_user_action(
        &state.db,
        claims.sub,
        "PROFILE_UPDATED",
        Some(json!({"updated_fields": updated_fields})),
        &meta,
    )
    .await;
    info!("Profile updated for user {}", claims.sub);

    let response = ApiResponse {
        data: ProfileResponse::from(updated_user),
        message: "Profile updated successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Change the caller's password
#[utoipa::path(
    put,
    path = "/api/v1/users/password",
    tag = "profile",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed successfully", body = ApiResponse<String>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Current password is incorrect", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    meta: RequestMeta,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    payload.validate()?;

    let user_model = User::find_by_id(claims.sub)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let password_hash = user_model.password_hash.clone().ok_or_else(|| {
        ApiError::Validation("Password change not available for external accounts".to_string())
    })?;
    if !password::verify_password(&payload.current_password, &password_hash)? {
        return Err(ApiError::Unauthorized(
            "Current password is incorrect".to_string(),
        ));
    }

    let new_hash = password::hash_password(&payload.new_password, state.config.bcrypt_cost)?;
    let mut active: user::ActiveModel = user_model.into();
    active.password_hash = Set(Some(new_hash));
    active.updated_at = Set(Utc::now());
    active.update(&state.db).await?;

    log_user_action(&state.db, claims.sub, "PASSWORD_CHANGED", None, &meta).await;
    info!("Password changed for user {}", claims.sub);

    let response = ApiResponse {
        data: String::new(),
        message: "Password changed successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}
