//! This file serves as the root for all SeaORM entity modules.
//! We define the data models for the user-management application here:
//! accounts, their sessions and tokens, the audit trail, and uploaded
//! documents.

pub mod refresh_token;
pub mod session;
pub mod user;
pub mod user_document;
pub mod user_log;
pub mod verification_token;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::refresh_token::Entity as RefreshToken;
    pub use super::session::Entity as Session;
    pub use super::user::Entity as User;
    pub use super::user_document::Entity as UserDocument;
    pub use super::user_log::Entity as UserLog;
    pub use super::verification_token::Entity as VerificationToken;
}

#[cfg(test)]
mod test {
    use chrono::{Duration, Utc};
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{
        ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection, DbErr,
        EntityTrait, QueryFilter, Set,
    };

    use super::*;
    use prelude::*;

    async fn setup_db() -> Result<DatabaseConnection, DbErr> {
        // Connect to the SQLite database
        let db = Database::connect("sqlite::memory:").await?;

        // Enable foreign keys
        db.execute_unprepared("PRAGMA foreign_keys = ON;").await?;

        // Try to apply migrations first
        Migrator::up(&db, None).await.expect("Migrations failed.");
        Ok(db)
    }

    fn new_user(email: &str, username: &str) -> user::ActiveModel {
        let now = Utc::now();
        user::ActiveModel {
            email: Set(email.to_string()),
            username: Set(username.to_string()),
            password_hash: Set(Some("$2b$12$dummy".to_string())),
            role: Set(user::UserRole::User),
            status: Set(user::UserStatus::PendingVerification),
            auth_provider: Set(user::AuthProvider::Local),
            email_verified: Set(false),
            login_attempts: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_entity_integration() -> Result<(), DbErr> {
        let db = setup_db().await?;
        let now = Utc::now();

        // Create users
        let alice = new_user("alice@example.com", "alice").insert(&db).await?;
        let bob = new_user("bob@example.com", "bob").insert(&db).await?;

        // Duplicate email must be rejected by the unique constraint
        let dup = new_user("alice@example.com", "alice2").insert(&db).await;
        assert!(dup.is_err());

        // Create a session for alice
        let session = session::ActiveModel {
            session_token: Set("sess-token-1".to_string()),
            user_id: Set(alice.id),
            expires_at: Set(now + Duration::days(7)),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        // Create a refresh token for alice
        let refresh = refresh_token::ActiveModel {
            id: Set("0f2c1a4e-token-id".to_string()),
            user_id: Set(alice.id),
            token_hash: Set("deadbeef".to_string()),
            expires_at: Set(now + Duration::days(7)),
            created_at: Set(now),
        }
        .insert(&db)
        .await?;

        // Create a verification token for bob
        let verification = verification_token::ActiveModel {
            user_id: Set(bob.id),
            purpose: Set(verification_token::TokenPurpose::EmailVerification),
            token: Set("abc123".to_string()),
            expires_at: Set(now + Duration::hours(24)),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        // Create an audit log entry
        let log = user_log::ActiveModel {
            user_id: Set(alice.id),
            action: Set("USER_CREATED".to_string()),
            details: Set(Some(serde_json::json!({"method": "test"}))),
            ip_address: Set(Some("127.0.0.1".to_string())),
            user_agent: Set(Some("test-agent".to_string())),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        // Create a document for alice
        let document = user_document::ActiveModel {
            user_id: Set(alice.id),
            file_name: Set("resume.pdf".to_string()),
            file_path: Set("/uploads/documents/doc_1_x.pdf".to_string()),
            file_size: Set(1024),
            file_type: Set("application/pdf".to_string()),
            category: Set(user_document::DocumentCategory::Resume),
            description: Set(Some("Current resume".to_string())),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        // Read back and verify data
        let users = User::find().all(&db).await?;
        assert_eq!(users.len(), 2);
        assert!(users.iter().any(|u| u.username == "alice"));
        assert!(users.iter().any(|u| u.username == "bob"));

        let sessions = Session::find()
            .filter(session::Column::UserId.eq(alice.id))
            .all(&db)
            .await?;
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, session.id);

        let refresh_tokens = RefreshToken::find().all(&db).await?;
        assert_eq!(refresh_tokens.len(), 1);
        assert_eq!(refresh_tokens[0].id, refresh.id);
        assert_eq!(refresh_tokens[0].user_id, alice.id);

        let verifications = VerificationToken::find()
            .filter(verification_token::Column::Token.eq("abc123"))
            .all(&db)
            .await?;
        assert_eq!(verifications.len(), 1);
        assert_eq!(verifications[0].id, verification.id);
        assert_eq!(
            verifications[0].purpose,
            verification_token::TokenPurpose::EmailVerification
        );

        let logs = UserLog::find().all(&db).await?;
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].id, log.id);
        assert_eq!(logs[0].action, "USER_CREATED");

        let documents = UserDocument::find().all(&db).await?;
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].id, document.id);
        assert_eq!(
            documents[0].category,
            user_document::DocumentCategory::Resume
        );

        // Deleting a user cascades to everything it owns
        User::delete_by_id(alice.id).exec(&db).await?;
        assert_eq!(Session::find().all(&db).await?.len(), 0);
        assert_eq!(RefreshToken::find().all(&db).await?.len(), 0);
        assert_eq!(UserDocument::find().all(&db).await?.len(), 0);
        assert_eq!(UserLog::find().all(&db).await?.len(), 0);

        // Bob's verification token is untouched
        assert_eq!(VerificationToken::find().all(&db).await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_role_hierarchy_ranks() {
        use user::UserRole;

        assert!(UserRole::Superadmin.at_least(UserRole::Admin));
        assert!(UserRole::Superadmin.at_least(UserRole::Superadmin));
        assert!(UserRole::Admin.at_least(UserRole::User));
        assert!(!UserRole::Admin.at_least(UserRole::Superadmin));
        assert!(!UserRole::User.at_least(UserRole::Admin));
    }
}
