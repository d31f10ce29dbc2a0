use axum::{
    extract::{Multipart, Path as AxumPath, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use model::entities::prelude::{User, UserDocument};
use model::entities::user_document::{self, DocumentCategory};
use model::entities::user;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::audit::{log_user_action, RequestMeta};
use crate::auth::CurrentUser;
use crate::errors::ApiError;
use crate::schemas::{ApiResponse, AppState, ErrorResponse, Paged, Pagination};

/// Largest accepted document upload.
const MAX_DOCUMENT_BYTES: usize = 10 * 1024 * 1024;
/// Largest accepted avatar image.
const MAX_AVATAR_BYTES: usize = 5 * 1024 * 1024;
/// Files accepted in one bulk request.
const MAX_BULK_FILES: usize = 10;

const ALLOWED_DOCUMENT_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "text/plain",
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/webp",
];

const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/webp"];

/// Document metadata as returned by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DocumentResponse {
    pub id: i32,
    pub file_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub file_type: String,
    pub category: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<user_document::Model> for DocumentResponse {
    fn from(model: user_document::Model) -> Self {
        Self {
            id: model.id,
            file_name: model.file_name,
            file_path: model.file_path,
            file_size: model.file_size,
            file_type: model.file_type,
            category: model.category.as_str().to_string(),
            description: model.description,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Outcome of one file within a bulk upload
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BulkUploadResult {
    pub file_name: String,
    pub success: bool,
    pub message: String,
    pub document_id: Option<i32>,
}

/// Per-file report for a bulk upload request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BulkUploadReport {
    pub uploaded: usize,
    pub failed: usize,
    pub results: Vec<BulkUploadResult>,
}

/// Query parameters for listing documents
#[derive(Debug, Deserialize, IntoParams)]
pub struct DocumentListQuery {
    /// Page number (1-based)
    pub page: Option<u64>,
    /// Page size
    pub limit: Option<u64>,
    /// Filter by category (RESUME, PORTFOLIO, CERTIFICATE, OTHER)
    pub category: Option<String>,
    /// Search in file name and description
    pub search: Option<String>,
}

/// One file pulled out of a multipart request
struct UploadedFile {
    file_name: String,
    content_type: String,
    bytes: axum::body::Bytes,
}

fn page_params(page: Option<u64>, limit: Option<u64>) -> (u64, u64) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(10).clamp(1, 100);
    (page, limit)
}

fn parse_category(value: &str) -> Result<DocumentCategory, ApiError> {
    DocumentCategory::parse(value)
        .ok_or_else(|| ApiError::Validation("Invalid document category".to_string()))
}

fn check_file(file: &UploadedFile, allowed: &[&str], max_bytes: usize) -> Result<(), ApiError> {
    if file.bytes.len() > max_bytes {
        return Err(ApiError::Validation(format!(
            "File size must be less than {}MB",
            max_bytes / (1024 * 1024)
        )));
    }
    if !allowed.contains(&file.content_type.as_str()) {
        return Err(ApiError::Validation(
            "Only PDF, Word, Excel, text, and image files are allowed".to_string(),
        ));
    }
    Ok(())
}

/// Write an uploaded file under the upload directory and return its public
/// path. The stored name is regenerated; only the extension survives, and
/// only when it is plain alphanumeric.
async fn store_file(
    base: &Path,
    subdir: &str,
    stem: &str,
    original_name: &str,
    bytes: &[u8],
) -> Result<String, ApiError> {
    let extension = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or("bin");
    let stored_name = format!("{}_{}.{}", stem, Uuid::new_v4().simple(), extension);

    let dir = base.join(subdir);
    fs::create_dir_all(&dir)
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("failed to create upload dir: {}", e)))?;
    fs::write(dir.join(&stored_name), bytes)
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("failed to store upload: {}", e)))?;

    Ok(format!("/uploads/{}/{}", subdir, stored_name))
}

/// Map a stored public path back onto the disk location under the upload dir.
fn disk_path(base: &Path, public_path: &str) -> Option<std::path::PathBuf> {
    public_path
        .strip_prefix("/uploads/")
        .map(|rest| base.join(rest))
}

async fn insert_document(
    state: &AppState,
    user_id: i32,
    file: &UploadedFile,
    category: DocumentCategory,
    description: Option<String>,
    meta: &RequestMeta,
) -> Result<user_document::Model, ApiError> {
    let public_path = store_file(
        &state.config.upload_dir,
        "documents",
        &format!("doc_{}", user_id),
        &file.file_name,
        &file.bytes,
    )
    .await?;

    let now = Utc::now();
    let document = user_document::ActiveModel {
        user_id: Set(user_id),
        file_name: Set(file.file_name.clone()),
        file_path: Set(public_path),
        file_size: Set(file.bytes.len() as i64),
        file_type: Set(file.content_type.clone()),
        category: Set(category),
        description: Set(description),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    log_user_action(
        &state.db,
        user_id,
        "DOCUMENT_UPLOADED",
        Some(json!({
            "document_id": document.id,
            "file_name": document.file_name,
            "file_size": document.file_size,
            "file_type": document.file_type,
            "category": document.category.as_str(),
        })),
        meta,
    )
    .await;

    Ok(document)
}

/// Upload a single document (multipart: `document`, `category`, `description`)
#[utoipa::path(
    post,
    path = "/api/v1/users/documents",
    tag = "documents",
    responses(
        (status = 201, description = "Document uploaded successfully", body = ApiResponse<DocumentResponse>),
        (status = 400, description = "Missing file, bad category, or file rejected", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip_all, fields(user_id = claims.sub))]
pub async fn upload_document(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    meta: RequestMeta,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<DocumentResponse>>), ApiError> {
    let (files, category, description) = read_upload_form(multipart, "document").await?;

    let file = files
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::Validation("No file provided".to_string()))?;
    let category = parse_category(
        category
            .as_deref()
            .ok_or_else(|| ApiError::Validation("Document category is required".to_string()))?,
    )?;
    if description.as_deref().is_some_and(|d| d.len() > 500) {
        return Err(ApiError::Validation(
            "Description must be less than 500 characters".to_string(),
        ));
    }

    check_file(&file, ALLOWED_DOCUMENT_TYPES, MAX_DOCUMENT_BYTES)?;

    let document = insert_document(&state, claims.sub, &file, category, description, &meta).await?;
    info!(
        "Document {} uploaded by user {} ({} bytes)",
        document.id, claims.sub, document.file_size
    );

    let response = ApiResponse {
        data: DocumentResponse::from(document),
        message: "Document uploaded successfully".to_string(),
        success: true,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Upload up to ten documents in one request (multipart: repeated `files`)
#[utoipa::path(
    post,
    path = "/api/v1/users/documents/bulk",
    tag = "documents",
    responses(
        (status = 200, description = "Per-file upload report", body = ApiResponse<BulkUploadReport>),
        (status = 400, description = "No files or too many files", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip_all, fields(user_id = claims.sub))]
pub async fn bulk_upload_documents(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    meta: RequestMeta,
    multipart: Multipart,
) -> Result<Json<ApiResponse<BulkUploadReport>>, ApiError> {
    let (files, category, description) = read_upload_form(multipart, "files").await?;

    if files.is_empty() {
        return Err(ApiError::Validation("No files provided".to_string()));
    }
    if files.len() > MAX_BULK_FILES {
        return Err(ApiError::Validation(format!(
            "Maximum {} files allowed per request",
            MAX_BULK_FILES
        )));
    }
    let category = parse_category(
        category
            .as_deref()
            .ok_or_else(|| ApiError::Validation("Document category is required".to_string()))?,
    )?;

    let mut results = Vec::with_capacity(files.len());
    let mut uploaded = 0;
    for file in &files {
        match check_file(file, ALLOWED_DOCUMENT_TYPES, MAX_DOCUMENT_BYTES) {
            Ok(()) => {
                match insert_document(&state, claims.sub, file, category, description.clone(), &meta)
                    .await
                {
                    Ok(document) => {
                        uploaded += 1;
                        results.push(BulkUploadResult {
                            file_name: file.file_name.clone(),
                            success: true,
                            message: "Uploaded".to_string(),
                            document_id: Some(document.id),
                        });
                    }
                    Err(e) => {
                        warn!("Bulk upload failed for '{}': {}", file.file_name, e);
                        results.push(BulkUploadResult {
                            file_name: file.file_name.clone(),
                            success: false,
                            message: "Upload failed".to_string(),
                            document_id: None,
                        });
                    }
                }
            }
            Err(e) => {
                results.push(BulkUploadResult {
                    file_name: file.file_name.clone(),
                    success: false,
                    message: e.to_string(),
                    document_id: None,
                });
            }
        }
    }

    let failed = results.len() - uploaded;
    info!(
        "Bulk upload for user {}: {} uploaded, {} failed",
        claims.sub, uploaded, failed
    );

    let response = ApiResponse {
        data: BulkUploadReport {
            uploaded,
            failed,
            results,
        },
        message: format!("{} of {} files uploaded", uploaded, uploaded + failed),
        success: true,
    };
    Ok(Json(response))
}

/// Upload a new avatar image (multipart: `avatar`)
#[utoipa::path(
    post,
    path = "/api/v1/users/avatar",
    tag = "documents",
    responses(
        (status = 200, description = "Avatar updated, returns its public path", body = ApiResponse<String>),
        (status = 400, description = "Missing file or file rejected", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip_all, fields(user_id = claims.sub))]
pub async fn upload_avatar(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    meta: RequestMeta,
    multipart: Multipart,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    let (files, _, _) = read_upload_form(multipart, "avatar").await?;
    let file = files
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::Validation("No file provided".to_string()))?;

    if !ALLOWED_IMAGE_TYPES.contains(&file.content_type.as_str()) {
        return Err(ApiError::Validation(
            "Only JPEG, PNG, and WebP images are allowed".to_string(),
        ));
    }
    if file.bytes.len() > MAX_AVATAR_BYTES {
        return Err(ApiError::Validation(format!(
            "File size must be less than {}MB",
            MAX_AVATAR_BYTES / (1024 * 1024)
        )));
    }

    let user_model = User::find_by_id(claims.sub)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let public_path = store_file(
        &state.config.upload_dir,
        "avatars",
        &format!("avatar_{}", claims.sub),
        &file.file_name,
        &file.bytes,
    )
    .await?;

    // Drop the previous avatar file if we stored one
    let previous = user_model.avatar.clone();
    let mut active: user::ActiveModel = user_model.into();
    active.avatar = Set(Some(public_path.clone()));
    active.updated_at = Set(Utc::now());
    active.update(&state.db).await?;

    if let Some(old_path) = previous.as_deref().and_then(|p| disk_path(&state.config.upload_dir, p)) {
        if fs::remove_file(&old_path).await.is_err() {
            debug!("Previous avatar file {:?} was already gone", old_path);
        }
    }

    log_user_action(
        &state.db,
        claims.sub,
        "AVATAR_UPDATED",
        Some(json!({"avatar": public_path})),
        &meta,
    )
    .await;
    info!("Avatar updated for user {}", claims.sub);

    let response = ApiResponse {
        data: public_path,
        message: "Avatar updated successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// List the caller's documents, newest first
#[utoipa::path(
    get,
    path = "/api/v1/users/documents",
    tag = "documents",
    params(DocumentListQuery),
    responses(
        (status = 200, description = "Documents retrieved successfully", body = ApiResponse<Paged<DocumentResponse>>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_documents(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Query(query): Query<DocumentListQuery>,
) -> Result<Json<ApiResponse<Paged<DocumentResponse>>>, ApiError> {
    let (page, limit) = page_params(query.page, query.limit);

    let mut condition = Condition::all().add(user_document::Column::UserId.eq(claims.sub));
    if let Some(category) = query.category.as_deref().filter(|c| !c.is_empty()) {
        condition = condition.add(user_document::Column::Category.eq(parse_category(category)?));
    }
    if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
        condition = condition.add(
            Condition::any()
                .add(user_document::Column::FileName.contains(search))
                .add(user_document::Column::Description.contains(search)),
        );
    }

    let paginator = UserDocument::find()
        .filter(condition)
        .order_by_desc(user_document::Column::CreatedAt)
        .paginate(&state.db, limit);
    let totals = paginator.num_items_and_pages().await?;
    let items = paginator.fetch_page(page - 1).await?;

    let response = ApiResponse {
        data: Paged {
            items: items.into_iter().map(DocumentResponse::from).collect(),
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

/// Get one of the caller's documents
#[utoipa::path(
    get,
    path = "/api/v1/users/documents/{document_id}",
    tag = "documents",
    params(
        ("document_id" = i32, Path, description = "Document ID"),
    ),
    responses(
        (status = 200, description = "Document retrieved successfully", body = ApiResponse<DocumentResponse>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Document not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_document(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    AxumPath(document_id): AxumPath<i32>,
) -> Result<Json<ApiResponse<DocumentResponse>>, ApiError> {
    let document = UserDocument::find_by_id(document_id)
        .one(&state.db)
        .await?
        // Someone else's document looks the same as a missing one
        .filter(|d| d.user_id == claims.sub)
        .ok_or_else(|| ApiError::NotFound("Document not found".to_string()))?;

    let response = ApiResponse {
        data: DocumentResponse::from(document),
        message: "Document retrieved successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Delete one of the caller's documents
#[utoipa::path(
    delete,
    path = "/api/v1/users/documents/{document_id}",
    tag = "documents",
    params(
        ("document_id" = i32, Path, description = "Document ID"),
    ),
    responses(
        (status = 200, description = "Document deleted successfully", body = ApiResponse<String>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Document not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_document(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    meta: RequestMeta,
    AxumPath(document_id): AxumPath<i32>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    let document = UserDocument::find_by_id(document_id)
        .one(&state.db)
        .await?
        .filter(|d| d.user_id == claims.sub)
        .ok_or_else(|| ApiError::NotFound("Document not found".to_string()))?;

    // The row is authoritative; losing the disk file is only worth a warning
    if let Some(path) = disk_path(&state.config.upload_dir, &document.file_path) {
        if let Err(e) = fs::remove_file(&path).await {
            warn!("Failed to remove stored file {:?}: {}", path, e);
        }
    }

    UserDocument::delete_by_id(document.id)
        .exec(&state.db)
        .await?;

    log_user_action(
        &state.db,
        claims.sub,
        "DOCUMENT_DELETED",
        Some(json!({"document_id": document.id, "file_name": document.file_name})),
        &meta,
    )
    .await;
    info!("Document {} deleted by user {}", document.id, claims.sub);

    let response = ApiResponse {
        data: format!("Document {} deleted", document.id),
        message: "Document deleted successfully".to_string(),
        success: true,
    };
    Ok(Json(response))
}

/// Pull files and the `category`/`description` text fields out of a
/// multipart request. `file_field` is the form name file parts arrive under.
async fn read_upload_form(
    mut multipart: Multipart,
    file_field: &str,
) -> Result<(Vec<UploadedFile>, Option<String>, Option<String>), ApiError> {
    let mut files = Vec::new();
    let mut category = None;
    let mut description = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::Validation("Malformed multipart request".to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == file_field {
            let file_name = field
                .file_name()
                .unwrap_or("upload.bin")
                .to_string();
            let content_type = field.content_type().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|_| ApiError::Validation("Malformed multipart request".to_string()))?;
            files.push(UploadedFile {
                file_name,
                content_type,
                bytes,
            });
        } else if name == "category" {
            category = Some(
                field
                    .text()
                    .await
                    .map_err(|_| ApiError::Validation("Malformed multipart request".to_string()))?,
            );
        } else if name == "description" {
            let text = field
                .text()
                .await
                .map_err(|_| ApiError::Validation("Malformed multipart request".to_string()))?;
            if !text.is_empty() {
                description = Some(text);
            }
        }
    }

    Ok((files, category, description))
}
