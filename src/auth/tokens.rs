use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use model::entities::user::{self, UserRole, UserStatus};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::AppConfig;

/// Lifetime of an access token.
pub const ACCESS_TOKEN_MINUTES: i64 = 15;
/// Lifetime of a refresh token.
pub const REFRESH_TOKEN_DAYS: i64 = 7;

/// Claims carried by a short-lived access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// User id
    pub sub: i32,
    pub email: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub iat: i64,
    pub exp: i64,
}

/// Claims carried by a refresh token. `token_id` keys the persisted,
/// revocable half of the token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// User id
    pub sub: i32,
    pub token_id: String,
    pub iat: i64,
    pub exp: i64,
}

pub fn generate_access_token(
    user: &user::Model,
    config: &AppConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = AccessClaims {
        sub: user.id,
        email: user.email.clone(),
        role: user.role,
        status: user.status,
        iat: now.timestamp(),
        exp: (now + Duration::minutes(ACCESS_TOKEN_MINUTES)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
}

pub fn verify_access_token(token: &str, config: &AppConfig) -> Option<AccessClaims> {
    decode::<AccessClaims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .ok()
}

pub fn generate_refresh_token(
    user_id: i32,
    token_id: &str,
    config: &AppConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = RefreshClaims {
        sub: user_id,
        token_id: token_id.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::days(REFRESH_TOKEN_DAYS)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_refresh_secret.as_bytes()),
    )
}

pub fn verify_refresh_token(token: &str, config: &AppConfig) -> Option<RefreshClaims> {
    decode::<RefreshClaims>(
        token,
        &DecodingKey::from_secret(config.jwt_refresh_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .ok()
}

/// 32 random bytes, hex encoded. Used for email verification and password
/// reset tokens.
pub fn generate_one_time_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// SHA-256 hex digest of a token. Refresh tokens are stored hashed.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
