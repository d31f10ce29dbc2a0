#[cfg(test)]
pub mod test_utils {
    use crate::auth::password;
    use crate::config::AppConfig;
    use crate::router::create_router;
    use crate::schemas::AppState;
    use axum::Router;
    use chrono::Utc;
    use migration::{Migrator, MigratorTrait};
    use model::entities::user;
    use sea_orm::{ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, Set};
    use tracing::Level;
    use tracing_subscriber::FmtSubscriber;
    use uuid::Uuid;

    /// Minimum bcrypt cost keeps the suite fast; production cost comes from
    /// configuration.
    pub const TEST_BCRYPT_COST: u32 = 4;

    /// Default password used by `create_user`.
    pub const TEST_PASSWORD: &str = "correct-horse-42";

    /// Create an in-memory SQLite database for testing
    pub async fn setup_test_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to connect to in-memory database");

        db.execute_unprepared("PRAGMA foreign_keys = ON;")
            .await
            .expect("Failed to enable foreign keys");

        // Run migrations
        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        db
    }

    /// Configuration for tests: fixed secrets, fast hashing, and a fresh
    /// temp directory for uploads.
    pub fn test_config() -> AppConfig {
        AppConfig {
            jwt_secret: "test-jwt-secret".to_string(),
            jwt_refresh_secret: "test-jwt-refresh-secret".to_string(),
            bcrypt_cost: TEST_BCRYPT_COST,
            upload_dir: std::env::temp_dir()
                .join(format!("mymentor-test-{}", Uuid::new_v4().simple())),
        }
    }

    /// Create AppState for testing
    pub async fn setup_test_app_state() -> AppState {
        let db = setup_test_db().await;
        AppState {
            db,
            config: test_config(),
        }
    }

    /// Insert a user directly, bypassing registration and verification.
    pub async fn create_user(
        state: &AppState,
        email: &str,
        username: &str,
        role: user::UserRole,
    ) -> user::Model {
        let password_hash =
            password::hash_password(TEST_PASSWORD, TEST_BCRYPT_COST).expect("Failed to hash");
        let now = Utc::now();
        user::ActiveModel {
            email: Set(email.to_string()),
            username: Set(username.to_string()),
            password_hash: Set(Some(password_hash)),
            role: Set(role),
            status: Set(user::UserStatus::Active),
            auth_provider: Set(user::AuthProvider::Local),
            email_verified: Set(true),
            login_attempts: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&state.db)
        .await
        .expect("Failed to create test user")
    }

    /// Initialize tracing for tests with output to STDERR.
    ///
    /// The log level is determined by the RUST_LOG environment variable,
    /// defaulting to WARN if not set.
    fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
        let log_level = std::env::var("RUST_LOG")
            .ok()
            .and_then(|level| match level.to_uppercase().as_str() {
                "ERROR" => Some(Level::ERROR),
                "WARN" => Some(Level::WARN),
                "INFO" => Some(Level::INFO),
                "DEBUG" => Some(Level::DEBUG),
                "TRACE" => Some(Level::TRACE),
                _ => None,
            })
            .unwrap_or(Level::WARN);

        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_writer(std::io::stderr) // Output to stderr, which is captured by tests
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    /// Create axum app for testing, returning the state alongside so tests
    /// can inspect the database directly.
    pub async fn setup_test_app() -> (Router, AppState) {
        let _ = init_test_tracing();

        let state = setup_test_app_state().await;
        let router = create_router(state.clone());
        (router, state)
    }
}
