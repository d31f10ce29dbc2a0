use anyhow::{bail, Result};
use chrono::Utc;
use migration::{Migrator, MigratorTrait};
use model::entities::prelude::User;
use model::entities::user;
use sea_orm::{ActiveModelTrait, ColumnTrait, Condition, Database, EntityTrait, QueryFilter, Set};
use tracing::{info, warn};

use crate::auth::password;
use crate::config::AppConfig;

/// Bootstrap the first SUPERADMIN account. Applies pending migrations first
/// so `seed` works against an empty database file.
pub async fn seed_superadmin(
    database_url: &str,
    email: &str,
    username: &str,
    password_plain: &str,
) -> Result<()> {
    info!("Seeding superadmin account '{}'", email);

    let db = Database::connect(database_url).await?;
    Migrator::up(&db, None).await?;

    let existing = User::find()
        .filter(
            Condition::any()
                .add(user::Column::Email.eq(email))
                .add(user::Column::Username.eq(username)),
        )
        .one(&db)
        .await?;
    if existing.is_some() {
        bail!("a user with that email or username already exists");
    }

    let config = AppConfig::from_env();
    let password_hash = password::hash_password(password_plain, config.bcrypt_cost)?;

    let now = Utc::now();
    let superadmin = user::ActiveModel {
        email: Set(email.to_string()),
        username: Set(username.to_string()),
        password_hash: Set(Some(password_hash)),
        first_name: Set(Some("Super".to_string())),
        last_name: Set(Some("Admin".to_string())),
        display_name: Set(Some("Super Administrator".to_string())),
        role: Set(user::UserRole::Superadmin),
        status: Set(user::UserStatus::Active),
        auth_provider: Set(user::AuthProvider::Local),
        email_verified: Set(true),
        login_attempts: Set(0),
        language: Set(Some("en".to_string())),
        currency: Set(Some("USD".to_string())),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&db)
    .await?;

    info!(
        "Superadmin created with ID: {}, email: {}",
        superadmin.id, superadmin.email
    );
    warn!("Change the seeded password after first login");

    Ok(())
}
