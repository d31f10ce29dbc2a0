//! Authentication and authorization: password hashing, token issuance and
//! verification, login-attempt lockout, and the extractor that gates
//! authenticated routes.

pub mod password;
pub mod tokens;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use chrono::{Duration, Utc};
use model::entities::prelude::{RefreshToken, Session, User};
use model::entities::{refresh_token, session, user};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tracing::warn;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::errors::ApiError;
use crate::schemas::AppState;
use tokens::AccessClaims;

/// Failed logins allowed before the account is locked.
pub const MAX_LOGIN_ATTEMPTS: i32 = 5;
/// How long a locked account stays locked.
pub const LOCKOUT_MINUTES: i64 = 15;
/// Lifetime of a login session row.
pub const SESSION_DAYS: i64 = 7;
/// Lifetime of an email verification token.
pub const EMAIL_VERIFICATION_HOURS: i64 = 24;
/// Lifetime of a password reset token.
pub const PASSWORD_RESET_HOURS: i64 = 1;
/// Minimum wait before another verification email may be requested.
pub const RESEND_COOLDOWN_MINUTES: i64 = 5;

/// Verified access-token claims of the calling user. Extracting this from a
/// request performs the Bearer-token check; handlers that take it are
/// reachable only with a valid, unexpired access token.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AccessClaims);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing authentication token".to_string()))?;

        let token = header_value
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Unauthorized("Missing authentication token".to_string()))?;

        let claims = tokens::verify_access_token(token, &state.config)
            .ok_or_else(|| ApiError::Unauthorized("Invalid authentication token".to_string()))?;

        Ok(CurrentUser(claims))
    }
}

/// Gate an operation on the static role hierarchy (SUPERADMIN > ADMIN > USER).
pub fn require_role(claims: &AccessClaims, required: user::UserRole) -> Result<(), ApiError> {
    if claims.role.at_least(required) {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Insufficient permissions".to_string()))
    }
}

/// Record a failed password attempt, locking the account once the threshold
/// is reached. Successful login resets both fields.
pub async fn register_failed_login(
    db: &DatabaseConnection,
    user: &user::Model,
) -> Result<(), sea_orm::DbErr> {
    let attempts = user.login_attempts + 1;
    let locked_until = if attempts >= MAX_LOGIN_ATTEMPTS {
        warn!(
            "Locking user {} for {} minutes after {} failed login attempts",
            user.id, LOCKOUT_MINUTES, attempts
        );
        Some(Utc::now() + Duration::minutes(LOCKOUT_MINUTES))
    } else {
        None
    };

    let mut active: user::ActiveModel = user.clone().into();
    active.login_attempts = Set(attempts);
    active.locked_until = Set(locked_until);
    active.updated_at = Set(Utc::now());
    active.update(db).await?;

    Ok(())
}

/// Issue a refresh JWT and persist its id and hash for later validation.
pub async fn issue_refresh_token(
    db: &DatabaseConnection,
    user_id: i32,
    config: &AppConfig,
) -> Result<String, ApiError> {
    let token_id = Uuid::new_v4().to_string();
    let token = tokens::generate_refresh_token(user_id, &token_id, config)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("failed to sign refresh token: {}", e)))?;

    let now = Utc::now();
    refresh_token::ActiveModel {
        id: Set(token_id),
        user_id: Set(user_id),
        token_hash: Set(tokens::hash_token(&token)),
        expires_at: Set(now + Duration::days(tokens::REFRESH_TOKEN_DAYS)),
        created_at: Set(now),
    }
    .insert(db)
    .await?;

    Ok(token)
}

/// Validate a refresh JWT against its persisted row. The signature must
/// verify, the row must still exist (logout deletes it), the stored hash
/// must match, and the row must be unexpired.
pub async fn validate_refresh_token(
    db: &DatabaseConnection,
    token: &str,
    config: &AppConfig,
) -> Result<user::Model, ApiError> {
    let claims = tokens::verify_refresh_token(token, config)
        .ok_or_else(|| ApiError::Unauthorized("Invalid refresh token".to_string()))?;

    let stored = RefreshToken::find_by_id(claims.token_id.clone())
        .one(db)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Refresh token has been revoked".to_string()))?;

    if stored.token_hash != tokens::hash_token(token) || stored.expires_at < Utc::now() {
        return Err(ApiError::Unauthorized("Invalid refresh token".to_string()));
    }

    let user_model = User::find_by_id(stored.user_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid refresh token".to_string()))?;

    Ok(user_model)
}

/// Delete every refresh token and session belonging to a user.
pub async fn revoke_user_tokens(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<(), sea_orm::DbErr> {
    RefreshToken::delete_many()
        .filter(refresh_token::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    Session::delete_many()
        .filter(session::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::tokens;

    #[test]
    fn one_time_tokens_are_unique_hex() {
        let a = tokens::generate_one_time_token();
        let b = tokens::generate_one_time_token();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn token_hash_is_stable() {
        let token = "some-refresh-token";
        assert_eq!(tokens::hash_token(token), tokens::hash_token(token));
        assert_ne!(tokens::hash_token(token), tokens::hash_token("other"));
    }
}
