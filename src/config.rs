use anyhow::Result;
use sea_orm::Database;
use std::path::PathBuf;

use crate::schemas::AppState;

/// Runtime configuration, loaded from the environment with development
/// defaults. Secrets default to obviously-unsafe values so a missing
/// `.env` is loud in the logs instead of a startup failure.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Secret used to sign access tokens
    pub jwt_secret: String,
    /// Secret used to sign refresh tokens
    pub jwt_refresh_secret: String,
    /// Bcrypt work factor for password hashing
    pub bcrypt_cost: u32,
    /// Directory uploaded files are stored under
    pub upload_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("JWT_SECRET not set, using development default");
            "dev-jwt-secret".to_string()
        });
        let jwt_refresh_secret = std::env::var("JWT_REFRESH_SECRET").unwrap_or_else(|_| {
            tracing::warn!("JWT_REFRESH_SECRET not set, using development default");
            "dev-jwt-refresh-secret".to_string()
        });
        let bcrypt_cost = std::env::var("BCRYPT_COST")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(bcrypt::DEFAULT_COST);
        let upload_dir = std::env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("uploads"));

        Self {
            jwt_secret,
            jwt_refresh_secret,
            bcrypt_cost,
            upload_dir,
        }
    }
}

/// Initialize application state against the given database
pub async fn initialize_app_state_with_url(database_url: &str) -> Result<AppState> {
    let config = AppConfig::from_env();

    // Connect to database
    tracing::info!("Connecting to database: {}", database_url);
    let db = Database::connect(database_url).await?;

    Ok(AppState { db, config })
}

/// Get bind address from environment or use default
pub fn get_bind_address() -> String {
    std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string())
}
