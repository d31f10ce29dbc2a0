#[cfg(test)]
mod integration_tests {
    use crate::schemas::ApiResponse;
    use crate::test_utils::test_utils::{create_user, setup_test_app, TEST_PASSWORD};
    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;
    use model::entities::prelude::{Session, User, UserLog, VerificationToken};
    use model::entities::user::UserRole;
    use model::entities::{session, user, user_log, verification_token};
    use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
    use serde_json::{json, Value};

    /// Log in and return (access_token, refresh_token).
    async fn login(server: &TestServer, email_or_username: &str, password: &str) -> (String, String) {
        let response = server
            .post("/api/v1/auth/login")
            .json(&json!({
                "email_or_username": email_or_username,
                "password": password,
            }))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        (
            body.data["access_token"].as_str().unwrap().to_string(),
            body.data["refresh_token"].as_str().unwrap().to_string(),
        )
    }

    #[tokio::test]
    async fn test_health_check() {
        let (app, _state) = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let response = server.get("/health").await;

        response.assert_status(StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_register_and_verify_flow() {
        let (app, state) = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        let register_body = json!({
            "email": "jane@example.com",
            "password": "a-long-password",
            "first_name": "Jane",
            "last_name": "Doe",
            "username": "jane_doe",
        });

        let response = server.post("/api/v1/auth/register").json(&register_body).await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<Value> = response.json();
        assert!(body.success);
        assert_eq!(body.data["username"], "jane_doe");
        assert_eq!(body.data["status"], "PENDING_VERIFICATION");
        let user_id = body.data["id"].as_i64().unwrap() as i32;

        // Duplicate email is rejected with a specific message
        let response = server.post("/api/v1/auth/register").json(&register_body).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let error: Value = response.json();
        assert_eq!(error["error"], "Email already registered");

        // Same username under a different email
        let response = server
            .post("/api/v1/auth/register")
            .json(&json!({
                "email": "other@example.com",
                "password": "a-long-password",
                "first_name": "Other",
                "last_name": "Person",
                "username": "jane_doe",
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let error: Value = response.json();
        assert_eq!(error["error"], "Username already taken");

        // Login before verification is refused
        let response = server
            .post("/api/v1/auth/login")
            .json(&json!({
                "email_or_username": "jane@example.com",
                "password": "a-long-password",
            }))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);

        // Consume the persisted verification token
        let token_row = VerificationToken::find()
            .filter(verification_token::Column::UserId.eq(user_id))
            .filter(
                verification_token::Column::Purpose
                    .eq(verification_token::TokenPurpose::EmailVerification),
            )
            .one(&state.db)
            .await
            .unwrap()
            .expect("verification token should exist");

        let response = server
            .post("/api/v1/auth/verify-email")
            .json(&json!({"token": token_row.token}))
            .await;
        response.assert_status(StatusCode::OK);

        // The token is single-use
        let response = server
            .post("/api/v1/auth/verify-email")
            .json(&json!({"token": token_row.token}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        // Login now succeeds and creates a session row
        let (access_token, _refresh) = login(&server, "jane@example.com", "a-long-password").await;
        let sessions = Session::find()
            .filter(session::Column::UserId.eq(user_id))
            .all(&state.db)
            .await
            .unwrap();
        assert_eq!(sessions.len(), 1);

        // Identity comes straight from the token
        let response = server
            .get("/api/v1/auth/me")
            .authorization_bearer(&access_token)
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["email"], "jane@example.com");
        assert_eq!(body.data["role"], "USER");

        // The account was promoted to ACTIVE
        let user_row = User::find_by_id(user_id)
            .one(&state.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user_row.status, user::UserStatus::Active);
        assert!(user_row.email_verified);
    }

    #[tokio::test]
    async fn test_register_validation() {
        let (app, _state) = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        // Bad email, short password, illegal username characters
        let response = server
            .post("/api/v1/auth/register")
            .json(&json!({
                "email": "not-an-email",
                "password": "short",
                "first_name": "",
                "last_name": "Doe",
                "username": "bad name!",
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let error: Value = response.json();
        assert_eq!(error["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_login_lockout_after_failed_attempts() {
        let (app, state) = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let locked_out = create_user(&state, "victim@example.com", "victim", UserRole::User).await;

        // Five wrong passwords lock the account
        for _ in 0..5 {
            let response = server
                .post("/api/v1/auth/login")
                .json(&json!({
                    "email_or_username": "victim@example.com",
                    "password": "wrong-password",
                }))
                .await;
            response.assert_status(StatusCode::UNAUTHORIZED);
        }

        let user_row = User::find_by_id(locked_out.id)
            .one(&state.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user_row.login_attempts, 5);
        assert!(user_row.locked_until.is_some());

        // The correct password no longer helps while the window is open
        let response = server
            .post("/api/v1/auth/login")
            .json(&json!({
                "email_or_username": "victim@example.com",
                "password": TEST_PASSWORD,
            }))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_lockout_counter_resets_on_success() {
        let (app, state) = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let account = create_user(&state, "bouncy@example.com", "bouncy", UserRole::User).await;

        // A few failures, but below the threshold
        for _ in 0..3 {
            server
                .post("/api/v1/auth/login")
                .json(&json!({
                    "email_or_username": "bouncy",
                    "password": "wrong-password",
                }))
                .await
                .assert_status(StatusCode::UNAUTHORIZED);
        }

        login(&server, "bouncy", TEST_PASSWORD).await;

        let user_row = User::find_by_id(account.id)
            .one(&state.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user_row.login_attempts, 0);
        assert!(user_row.locked_until.is_none());
        assert!(user_row.last_login_at.is_some());
    }

    #[tokio::test]
    async fn test_refresh_and_logout_revocation() {
        let (app, state) = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        create_user(&state, "refresher@example.com", "refresher", UserRole::User).await;

        let (access_token, refresh_token) =
            login(&server, "refresher@example.com", TEST_PASSWORD).await;

        // A valid refresh token yields a working access token
        let response = server
            .post("/api/v1/auth/refresh")
            .json(&json!({"refresh_token": refresh_token}))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        let fresh_access = body.data["access_token"].as_str().unwrap().to_string();

        server
            .get("/api/v1/auth/me")
            .authorization_bearer(&fresh_access)
            .await
            .assert_status(StatusCode::OK);

        // Garbage is rejected
        server
            .post("/api/v1/auth/refresh")
            .json(&json!({"refresh_token": "not-a-jwt"}))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        // Logout revokes every refresh token and session
        server
            .post("/api/v1/auth/logout")
            .authorization_bearer(&access_token)
            .await
            .assert_status(StatusCode::OK);

        server
            .post("/api/v1/auth/refresh")
            .json(&json!({"refresh_token": refresh_token}))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        let response = server
            .get("/api/v1/auth/session")
            .authorization_bearer(&access_token)
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_password_reset_flow() {
        let (app, state) = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let account = create_user(&state, "forgetful@example.com", "forgetful", UserRole::User).await;

        // The response does not reveal whether the account exists
        let response = server
            .post("/api/v1/auth/forgot-password")
            .json(&json!({"email": "nobody@example.com"}))
            .await;
        response.assert_status(StatusCode::OK);

        let response = server
            .post("/api/v1/auth/forgot-password")
            .json(&json!({"email": "forgetful@example.com"}))
            .await;
        response.assert_status(StatusCode::OK);

        let token_row = VerificationToken::find()
            .filter(verification_token::Column::UserId.eq(account.id))
            .filter(
                verification_token::Column::Purpose
                    .eq(verification_token::TokenPurpose::PasswordReset),
            )
            .one(&state.db)
            .await
            .unwrap()
            .expect("reset token should exist");

        // Too-short replacement password is rejected
        server
            .post("/api/v1/auth/reset-password")
            .json(&json!({"token": token_row.token, "password": "short"}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        server
            .post("/api/v1/auth/reset-password")
            .json(&json!({"token": token_row.token, "password": "brand-new-password"}))
            .await
            .assert_status(StatusCode::OK);

        // Old password is dead, new one works, token is spent
        server
            .post("/api/v1/auth/login")
            .json(&json!({
                "email_or_username": "forgetful@example.com",
                "password": TEST_PASSWORD,
            }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        login(&server, "forgetful@example.com", "brand-new-password").await;

        server
            .post("/api/v1/auth/reset-password")
            .json(&json!({"token": token_row.token, "password": "another-password"}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_check_username() {
        let (app, state) = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        create_user(&state, "taken@example.com", "taken_name", UserRole::User).await;

        let response = server
            .post("/api/v1/auth/check-username")
            .json(&json!({"username": "taken_name"}))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["available"], false);

        let response = server
            .post("/api/v1/auth/check-username")
            .json(&json!({"username": "free_name"}))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["available"], true);
    }

    #[tokio::test]
    async fn test_profile_update_and_password_change() {
        let (app, state) = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        create_user(&state, "profiled@example.com", "profiled", UserRole::User).await;
        let (access_token, _) = login(&server, "profiled", TEST_PASSWORD).await;

        // Unauthenticated profile access is refused
        server
            .get("/api/v1/users/profile")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        let response = server
            .get("/api/v1/users/profile")
            .authorization_bearer(&access_token)
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["username"], "profiled");

        // Invalid website URL is rejected
        server
            .put("/api/v1/users/profile")
            .authorization_bearer(&access_token)
            .json(&json!({"website": "not a url"}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let response = server
            .put("/api/v1/users/profile")
            .authorization_bearer(&access_token)
            .json(&json!({
                "bio": "Mentor of mentors",
                "location": "Lisbon",
                "website": "https://example.com",
                "social_links": {"github": "https://github.com/profiled"},
            }))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["bio"], "Mentor of mentors");
        assert_eq!(body.data["location"], "Lisbon");
        assert_eq!(body.data["social_links"]["github"], "https://github.com/profiled");

        // Wrong current password
        server
            .put("/api/v1/users/password")
            .authorization_bearer(&access_token)
            .json(&json!({
                "current_password": "wrong-password",
                "new_password": "a-new-password",
            }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        server
            .put("/api/v1/users/password")
            .authorization_bearer(&access_token)
            .json(&json!({
                "current_password": TEST_PASSWORD,
                "new_password": "a-new-password",
            }))
            .await
            .assert_status(StatusCode::OK);

        login(&server, "profiled", "a-new-password").await;
    }

    #[tokio::test]
    async fn test_admin_role_enforcement_and_guards() {
        let (app, state) = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let plain = create_user(&state, "plain@example.com", "plain", UserRole::User).await;
        let admin = create_user(&state, "admin@example.com", "admin", UserRole::Admin).await;
        let superadmin =
            create_user(&state, "root@example.com", "root", UserRole::Superadmin).await;

        let (user_token, _) = login(&server, "plain", TEST_PASSWORD).await;
        let (admin_token, _) = login(&server, "admin", TEST_PASSWORD).await;
        let (super_token, _) = login(&server, "root", TEST_PASSWORD).await;

        // Plain users are kept out
        server
            .get("/api/v1/admin/users")
            .authorization_bearer(&user_token)
            .await
            .assert_status(StatusCode::FORBIDDEN);

        // Admins can list, filter, and search
        let response = server
            .get("/api/v1/admin/users")
            .authorization_bearer(&admin_token)
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["pagination"]["total"], 3);

        let response = server
            .get("/api/v1/admin/users?role=USER")
            .authorization_bearer(&admin_token)
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["pagination"]["total"], 1);
        assert_eq!(body.data["items"][0]["username"], "plain");

        // An admin cannot touch a superadmin account
        server
            .put(&format!("/api/v1/admin/users/{}", superadmin.id))
            .authorization_bearer(&admin_token)
            .json(&json!({"status": "SUSPENDED"}))
            .await
            .assert_status(StatusCode::FORBIDDEN);

        // Nor hand out the superadmin role
        server
            .put(&format!("/api/v1/admin/users/{}", plain.id))
            .authorization_bearer(&admin_token)
            .json(&json!({"role": "SUPERADMIN"}))
            .await
            .assert_status(StatusCode::FORBIDDEN);

        // Suspending a regular user works and locks them out of login
        let response = server
            .put(&format!("/api/v1/admin/users/{}", plain.id))
            .authorization_bearer(&admin_token)
            .json(&json!({"status": "SUSPENDED"}))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["status"], "SUSPENDED");

        server
            .post("/api/v1/auth/login")
            .json(&json!({
                "email_or_username": "plain",
                "password": TEST_PASSWORD,
            }))
            .await
            .assert_status(StatusCode::FORBIDDEN);

        // Deletion guards: no self-delete, no admin-deletes-superadmin
        server
            .delete(&format!("/api/v1/admin/users/{}", admin.id))
            .authorization_bearer(&admin_token)
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        server
            .delete(&format!("/api/v1/admin/users/{}", superadmin.id))
            .authorization_bearer(&admin_token)
            .await
            .assert_status(StatusCode::FORBIDDEN);

        // A superadmin can delete the user outright
        server
            .delete(&format!("/api/v1/admin/users/{}", plain.id))
            .authorization_bearer(&super_token)
            .await
            .assert_status(StatusCode::OK);
        assert!(User::find_by_id(plain.id)
            .one(&state.db)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_document_upload_listing_and_ownership() {
        let (app, state) = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        create_user(&state, "owner@example.com", "owner", UserRole::User).await;
        create_user(&state, "peeker@example.com", "peeker", UserRole::User).await;
        create_user(&state, "admin@example.com", "admin", UserRole::Admin).await;

        let (owner_token, _) = login(&server, "owner", TEST_PASSWORD).await;
        let (peeker_token, _) = login(&server, "peeker", TEST_PASSWORD).await;
        let (admin_token, _) = login(&server, "admin", TEST_PASSWORD).await;

        // Upload a resume
        let form = MultipartForm::new()
            .add_text("category", "RESUME")
            .add_text("description", "Current resume")
            .add_part(
                "document",
                Part::bytes(b"%PDF-1.4 fake resume".to_vec())
                    .file_name("resume.pdf")
                    .mime_type("application/pdf"),
            );
        let response = server
            .post("/api/v1/users/documents")
            .authorization_bearer(&owner_token)
            .multipart(form)
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["file_name"], "resume.pdf");
        assert_eq!(body.data["category"], "RESUME");
        let document_id = body.data["id"].as_i64().unwrap();

        // Disallowed MIME type
        let form = MultipartForm::new().add_text("category", "OTHER").add_part(
            "document",
            Part::bytes(b"PK..".to_vec())
                .file_name("archive.zip")
                .mime_type("application/zip"),
        );
        server
            .post("/api/v1/users/documents")
            .authorization_bearer(&owner_token)
            .multipart(form)
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        // Unknown category
        let form = MultipartForm::new().add_text("category", "MIXTAPE").add_part(
            "document",
            Part::bytes(b"notes".to_vec())
                .file_name("notes.txt")
                .mime_type("text/plain"),
        );
        server
            .post("/api/v1/users/documents")
            .authorization_bearer(&owner_token)
            .multipart(form)
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        // The owner sees the document, another user does not
        let response = server
            .get("/api/v1/users/documents")
            .authorization_bearer(&owner_token)
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["pagination"]["total"], 1);

        let response = server
            .get("/api/v1/users/documents")
            .authorization_bearer(&peeker_token)
            .await;
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["pagination"]["total"], 0);

        server
            .get(&format!("/api/v1/users/documents/{}", document_id))
            .authorization_bearer(&peeker_token)
            .await
            .assert_status(StatusCode::NOT_FOUND);

        server
            .get(&format!("/api/v1/users/documents/{}", document_id))
            .authorization_bearer(&owner_token)
            .await
            .assert_status(StatusCode::OK);

        // Admins see all documents with owner identity
        let response = server
            .get("/api/v1/admin/documents")
            .authorization_bearer(&admin_token)
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["pagination"]["total"], 1);
        assert_eq!(body.data["items"][0]["owner_username"], "owner");

        // Search by file name through the admin listing
        let response = server
            .get("/api/v1/admin/documents?search=resume")
            .authorization_bearer(&admin_token)
            .await;
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["pagination"]["total"], 1);

        // Deleting removes the row
        server
            .delete(&format!("/api/v1/users/documents/{}", document_id))
            .authorization_bearer(&owner_token)
            .await
            .assert_status(StatusCode::OK);
        let response = server
            .get("/api/v1/users/documents")
            .authorization_bearer(&owner_token)
            .await;
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["pagination"]["total"], 0);
    }

    #[tokio::test]
    async fn test_bulk_document_upload_reports_per_file() {
        let (app, state) = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        create_user(&state, "bulk@example.com", "bulk", UserRole::User).await;
        let (token, _) = login(&server, "bulk", TEST_PASSWORD).await;

        let form = MultipartForm::new()
            .add_text("category", "CERTIFICATE")
            .add_part(
                "files",
                Part::bytes(b"%PDF-1.4 cert one".to_vec())
                    .file_name("cert1.pdf")
                    .mime_type("application/pdf"),
            )
            .add_part(
                "files",
                Part::bytes(b"binary blob".to_vec())
                    .file_name("tool.exe")
                    .mime_type("application/octet-stream"),
            )
            .add_part(
                "files",
                Part::bytes(b"plain notes".to_vec())
                    .file_name("notes.txt")
                    .mime_type("text/plain"),
            );

        let response = server
            .post("/api/v1/users/documents/bulk")
            .authorization_bearer(&token)
            .multipart(form)
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["uploaded"], 2);
        assert_eq!(body.data["failed"], 1);
        let results = body.data["results"].as_array().unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[1]["file_name"], "tool.exe");
        assert_eq!(results[1]["success"], false);

        // Both stored documents are listed
        let response = server
            .get("/api/v1/users/documents")
            .authorization_bearer(&token)
            .await;
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["pagination"]["total"], 2);
    }

    #[tokio::test]
    async fn test_audit_trail_records_actions() {
        let (app, state) = setup_test_app().await;
        let server = TestServer::new(app).unwrap();
        let watched = create_user(&state, "watched@example.com", "watched", UserRole::User).await;
        create_user(&state, "admin@example.com", "admin", UserRole::Admin).await;

        let (watched_token, _) = login(&server, "watched", TEST_PASSWORD).await;
        let (admin_token, _) = login(&server, "admin", TEST_PASSWORD).await;

        server
            .put("/api/v1/users/profile")
            .authorization_bearer(&watched_token)
            .json(&json!({"bio": "watched bio"}))
            .await
            .assert_status(StatusCode::OK);

        // Rows landed in the audit table
        let logs = UserLog::find()
            .filter(user_log::Column::UserId.eq(watched.id))
            .all(&state.db)
            .await
            .unwrap();
        let actions: Vec<_> = logs.iter().map(|l| l.action.as_str()).collect();
        assert!(actions.contains(&"LOGIN"));
        assert!(actions.contains(&"PROFILE_UPDATED"));

        // Audit listing is admin-only, filterable by action
        server
            .get("/api/v1/admin/logs")
            .authorization_bearer(&watched_token)
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let response = server
            .get(&format!(
                "/api/v1/admin/logs?user_id={}&action=PROFILE_UPDATED",
                watched.id
            ))
            .authorization_bearer(&admin_token)
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Value> = response.json();
        assert_eq!(body.data["pagination"]["total"], 1);
        assert_eq!(body.data["items"][0]["action"], "PROFILE_UPDATED");
        assert_eq!(body.data["items"][0]["details"]["updated_fields"][0], "bio");
    }

    #[tokio::test]
    async fn test_resend_verification_is_throttled() {
        let (app, _state) = setup_test_app().await;
        let server = TestServer::new(app).unwrap();

        server
            .post("/api/v1/auth/register")
            .json(&json!({
                "email": "slow@example.com",
                "password": "a-long-password",
                "first_name": "Slow",
                "last_name": "Mailer",
                "username": "slowmailer",
            }))
            .await
            .assert_status(StatusCode::CREATED);

        // The registration token is fresh, so an immediate resend is throttled
        let response = server
            .post("/api/v1/auth/resend-verification")
            .json(&json!({"email": "slow@example.com"}))
            .await;
        response.assert_status(StatusCode::TOO_MANY_REQUESTS);

        // Unknown addresses get the neutral answer, not an error
        server
            .post("/api/v1/auth/resend-verification")
            .json(&json!({"email": "ghost@example.com"}))
            .await
            .assert_status(StatusCode::OK);
    }
}
