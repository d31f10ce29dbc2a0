use axum::{
    extract::{Path as AxumPath, Query, State},
    response::Json,
};
use chrono::{DateTime, Utc};
use model::entities::prelude::{User, UserDocument, UserLog};
use model::entities::user::{self, UserRole, UserStatus};
use model::entities::{user_document, user_log};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::audit::{log_user_action, RequestMeta};
use crate::auth::{require_role, CurrentUser};
use crate::errors::ApiError;
use crate::schemas::{ApiResponse, AppState, ErrorResponse, Paged, Pagination};

/// Administrative view of an account, including lockout bookkeeping
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdminUserResponse {
    pub id: i32,
    pub email: String,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub display_name: Option<String>,
    pub avatar: Option<String>,
    pub role: String,
    pub status: String,
    pub auth_provider: String,
    pub email_verified: bool,
    pub login_attempts: i32,
    pub locked_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub last_active_at: Option<DateTime<Utc>>,
}

impl From<user::Model> for AdminUserResponse {
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
            auth_provider: model.auth_provider.as_str().to_string(),
            email_verified: model.email_verified,
            login_attempts: model.login_attempts,
            locked_until: model.locked_until,
            created_at: model.created_at,
            updated_at: model.updated_at,
            last_login_at: model.last_login_at,
            last_active_at: model.last_active_at,
        }
    }
}

/// Request body for an administrative user update
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct AdminUpdateUserRequest {
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: Option<String>,
    #[validate(length(min = 1, message = "Display name is required"))]
    pub display_name: Option<String>,
    #[validate(length(max = 500, message = "Bio must be less than 500 characters"))]
    pub bio: Option<String>,
    /// USER, ADMIN, or SUPERADMIN
    pub role: Option<String>,
    /// PENDING_VERIFICATION, ACTIVE, INACTIVE, SUSPENDED, or BANNED
    pub status: Option<String>,
    pub email_verified: Option<bool>,
}

/// A document together with its owner, for the admin listing
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdminDocumentResponse {
    pub id: i32,
    pub user_id: i32,
    pub owner_email: Option<String>,
    pub owner_username: Option<String>,
    pub file_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub file_type: String,
    pub category: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One audit trail entry
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserLogResponse {
    pub id: i32,
    pub user_id: i32,
    pub action: String,
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<user_log::Model> for UserLogResponse {
    fn from(model: user_log::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            action: model.action,
            details: model.details,
            ip_address: model.ip_address,
            user_agent: model.user_agent,
            created_at: model.created_at,
        }
    }
}

/// Query parameters for the admin user listing
#[derive(Debug, Deserialize, IntoParams)]
pub struct AdminUserListQuery {
    /// Page number (1-based)
    pub page: Option<u64>,
    /// Page size
    pub limit: Option<u64>,
    /// Search across email, username, and name fields
    pub search: Option<String>,
    /// Filter by role
    pub role: Option<String>,
    /// Filter by status
    pub status: Option<String>,
}

/// Query parameters for the admin document listing
#[derive(Debug, Deserialize, IntoParams)]
pub struct AdminDocumentListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// Filter by category
    pub category: Option<String>,
    /// Filter by owning user
    pub user_id: Option<i32>,
    /// Search in file name, description, and owner identity
    pub search: Option<String>,
}

/// Query parameters for the audit trail listing
#[derive(Debug, Deserialize, IntoParams)]
pub struct UserLogListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// Filter by acting user
    pub user_id: Option<i32>,
    /// Filter by exact action name
    pub action: Option<String>,
}

fn page_params(page: Option<u64>, limit: Option<u64>) -> (u64, u64) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(10).clamp(1, 100);
    (page, limit)
}

fn parse_role(value: &str) -> Result<UserRole, ApiError> {
    UserRole::parse(value).ok_or_else(|| ApiError::Validation("Invalid role".to_string()))
}

fn parse_status(value: &str) -> Result<UserStatus, ApiError> {
    UserStatus::parse(value).ok_or_else(|| ApiError::Validation("Invalid status".to_string()))
}

/// List users, paged, with search and role/status filters
#[utoipa::path(
    get,
    path = "/api/v1/admin/users",
    tag = "admin",
    params(AdminUserListQuery),
    responses(
        (status = 200, description = "Users retrieved successfully", body = ApiResponse<Paged<AdminUserResponse>>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Insufficient permissions", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_users(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Query(query): Query<AdminUserListQuery>,
) -> Result<Json<ApiResponse<Paged<AdminUserResponse>>>, ApiError> {
    require_role(&claims, UserRole::Admin)?;

    let (page, limit) = page_params(query.page, query.limit);

    let mut condition = Condition::all();
    if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
        condition = condition.add(
            Condition::any()
                .add(user::Column::Email.contains(search))
                .add(user::Column::Username.contains(search))
                .add(user::Column::FirstName.contains(search))
                .add(user::Column::LastName.contains(search))
                .add(user::Column::DisplayName.contains(search)),
        );
    }
    if let Some(role) = query.role.as_deref().filter(|r| !r.is_empty()) {
        condition = condition.add(user::Column::Role.eq(parse_role(role)?));
    }
    if let Some(status) = query.status.as_deref().filter(|s| !s.is_empty()) {
        condition = condition.add(user::Column::Status.eq(parse_status(status)?));
    }

    let paginator = User::find()
        .filter(condition)
        .order_by_desc(user::Column::CreatedAt)
        .paginate(&state.db, limit);
    let totals = paginator.num_items_and_pages().await?;
    let items = paginator.fetch_page(page - 1).await?;

    let response = ApiResponse {
        data: Paged {
            items: items.into_iter().map(AdminUserResponse::from).collect(),
            pagination: Pagination {
                page,
                limit,
                total: totals.number_of_items,
                pages: totals.number_of_pages,
            },
        },
        message: "Users retrieved successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Update another user's account. SUPERADMIN accounts and the SUPERADMIN
/// role itself can only be touched by a SUPERADMIN.
#[utoipa::path(
    put,
    path = "/api/v1/admin/users/{user_id}",
    tag = "admin",
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    request_body = AdminUpdateUserRequest,
    responses(
        (status = 200, description = "User updated successfully", body = ApiResponse<AdminUserResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Insufficient permissions", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    meta: RequestMeta,
    AxumPath(user_id): AxumPath<i32>,
    Json(payload): Json<AdminUpdateUserRequest>,
) -> Result<Json<ApiResponse<AdminUserResponse>>, ApiError> {
    require_role(&claims, UserRole::Admin)?;
    payload.validate()?;

    let target = User::find_by_id(user_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if target.role == UserRole::Superadmin && claims.role != UserRole::Superadmin {
        warn!(
            "User {} attempted to modify superadmin user {}",
            claims.sub, user_id
        );
        return Err(ApiError::Forbidden(
            "Cannot modify superadmin users".to_string(),
        ));
    }

    let new_role = match payload.role.as_deref() {
        Some(value) => {
            let parsed = parse_role(value)?;
            // Role escalation to SUPERADMIN is reserved for SUPERADMIN
            if parsed == UserRole::Superadmin && claims.role != UserRole::Superadmin {
                return Err(ApiError::Forbidden(
                    "Cannot assign superadmin role".to_string(),
                ));
            }
            Some(parsed)
        }
        None => None,
    };
    let new_status = match payload.status.as_deref() {
        Some(value) => Some(parse_status(value)?),
        None => None,
    };

    let mut active: user::ActiveModel = target.into();
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
    if let Some(role) = new_role {
        active.role = Set(role);
        updated_fields.push("role");
    }
    if let Some(status) = new_status {
        active.status = Set(status);
        updated_fields.push("status");
    }
    if let Some(email_verified) = payload.email_verified {
        active.email_verified = Set(email_verified);
        updated_fields.push("email_verified");
    }

    active.updated_at = Set(Utc::now());
    let updated_user = active.update(&state.db).await?;

    log_user_action(
        &state.db,
        claims.sub,
        "ADMIN_USER_UPDATED",
        Some(json!({
            "target_user_id": user_id,
            "updated_fields": updated_fields,
        })),
        &meta,
    )
    .await;
    info!(
        "User {} updated by admin {} (fields: {})",
        user_id,
        claims.sub,
        updated_fields.join(", ")
    );

    let response = ApiResponse {
        data: AdminUserResponse::from(updated_user),
        message: "User updated successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Delete another user's account, cascading to everything it owns
#[utoipa::path(
    delete,
    path = "/api/v1/admin/users/{user_id}",
    tag = "admin",
    params(
        ("user_id" = i32, Path, description = "User ID"),
    ),
    responses(
        (status = 200, description = "User deleted successfully", body = ApiResponse<String>),
        (status = 400, description = "Cannot delete own account", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Insufficient permissions", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    meta: RequestMeta,
    AxumPath(user_id): AxumPath<i32>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    require_role(&claims, UserRole::Admin)?;

    if user_id == claims.sub {
        return Err(ApiError::Validation(
            "Cannot delete your own account".to_string(),
        ));
    }

    let target = User::find_by_id(user_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if target.role == UserRole::Superadmin && claims.role != UserRole::Superadmin {
        warn!(
            "User {} attempted to delete superadmin user {}",
            claims.sub, user_id
        );
        return Err(ApiError::Forbidden(
            "Cannot delete superadmin users".to_string(),
        ));
    }

    User::delete_by_id(user_id).exec(&state.db).await?;

    log_user_action(
        &state.db,
        claims.sub,
        "ADMIN_USER_DELETED",
        Some(json!({"target_user_id": user_id})),
        &meta,
    )
    .await;
    info!("User {} deleted by admin {}", user_id, claims.sub);

    let response = ApiResponse {
        data: format!("User {} deleted", user_id),
        message: "User deleted successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// List all users' documents, paged, with owner identity
#[utoipa::path(
    get,
    path = "/api/v1/admin/documents",
    tag = "admin",
    params(AdminDocumentListQuery),
    responses(
        (status = 200, description = "Documents retrieved successfully", body = ApiResponse<Paged<AdminDocumentResponse>>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Insufficient permissions", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_all_documents(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Query(query): Query<AdminDocumentListQuery>,
) -> Result<Json<ApiResponse<Paged<AdminDocumentResponse>>>, ApiError> {
    require_role(&claims, UserRole::Admin)?;

    let (page, limit) = page_params(query.page, query.limit);

    let mut condition = Condition::all();
    if let Some(category) = query.category.as_deref().filter(|c| !c.is_empty()) {
        let parsed = user_document::DocumentCategory::parse(category)
            .ok_or_else(|| ApiError::Validation("Invalid document category".to_string()))?;
        condition = condition.add(user_document::Column::Category.eq(parsed));
    }
    if let Some(user_id) = query.user_id {
        condition = condition.add(user_document::Column::UserId.eq(user_id));
    }
    if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
        condition = condition.add(
            Condition::any()
                .add(user_document::Column::FileName.contains(search))
                .add(user_document::Column::Description.contains(search))
                .add(user::Column::Email.contains(search))
                .add(user::Column::Username.contains(search))
                .add(user::Column::FirstName.contains(search))
                .add(user::Column::LastName.contains(search)),
        );
    }

    let paginator = UserDocument::find()
        .find_also_related(User)
        .filter(condition)
        .order_by_desc(user_document::Column::CreatedAt)
        .paginate(&state.db, limit);
    let totals = paginator.num_items_and_pages().await?;
    let items = paginator.fetch_page(page - 1).await?;

    let documents = items
        .into_iter()
        .map(|(document, owner)| AdminDocumentResponse {
            id: document.id,
            user_id: document.user_id,
            owner_email: owner.as_ref().map(|u| u.email.clone()),
            owner_username: owner.as_ref().map(|u| u.username.clone()),
            file_name: document.file_name,
            file_path: document.file_path,
            file_size: document.file_size,
            file_type: document.file_type,
            category: document.category.as_str().to_string(),
            description: document.description,
            created_at: document.created_at,
        })
        .collect();

    let response = ApiResponse {
        data: Paged {
            items: documents,
            pagination: Pagination {
                page,
                limit,
                total: totals.number_of_items,
                pages: totals.number_of_pages,
            },
        },
        message: "Documents retrieved successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// List the audit trail, newest first
#[utoipa::path(
    get,
    path = "/api/v1/admin/logs",
    tag = "admin",
    params(UserLogListQuery),
    responses(
        (status = 200, description = "Audit entries retrieved successfully", body = ApiResponse<Paged<UserLogResponse>>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Insufficient permissions", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_user_logs(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Query(query): Query<UserLogListQuery>,
) -> Result<Json<ApiResponse<Paged<UserLogResponse>>>, ApiError> {
    require_role(&claims, UserRole::Admin)?;

    let (page, limit) = page_params(query.page, query.limit);

    let mut condition = Condition::all();
    if let Some(user_id) = query.user_id {
        condition = condition.add(user_log::Column::UserId.eq(user_id));
    }
    if let Some(action) = query.action.as_deref().filter(|a| !a.is_empty()) {
        condition = condition.add(user_log::Column::Action.eq(action));
    }

    let paginator = UserLog::find()
        .filter(condition)
        .order_by_desc(user_log::Column::CreatedAt)
        .paginate(&state.db, limit);
    let totals = paginator.num_items_and_pages().await?;
    let items = paginator.fetch_page(page - 1).await?;

    let response = ApiResponse {
        data: Paged {
            items: items.into_iter().map(UserLogResponse::from).collect(),
            pagination: Pagination {
                page,
                limit,
                total: totals.number_of_items,
                pages: totals.number_of_pages,
            },
        },
        message: "Audit entries retrieved successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}
