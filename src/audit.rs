//! Audit trail plumbing. Writes are best-effort: a failed insert is
//! reported to tracing and otherwise swallowed, so logging can never fail
//! the request that produced it.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use chrono::Utc;
use model::entities::user_log;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use std::convert::Infallible;
use tracing::warn;

/// Client metadata recorded with every audit entry.
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestMeta
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Infallible> {
        let ip_address = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(|value| value.trim().to_string());
        let user_agent = parts
            .headers
            .get(axum::http::header::USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        Ok(RequestMeta {
            ip_address,
            user_agent,
        })
    }
}

/// Append an entry to the audit trail.
pub async fn log_user_action(
    db: &DatabaseConnection,
    user_id: i32,
    action: &str,
    details: Option<serde_json::Value>,
    meta: &RequestMeta,
) {
    let entry = user_log::ActiveModel {
        user_id: Set(user_id),
        action: Set(action.to_string()),
        details: Set(details),
        ip_address: Set(meta.ip_address.clone()),
        user_agent: Set(meta.user_agent.clone()),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    if let Err(db_error) = entry.insert(db).await {
        warn!(
            "Failed to record audit entry '{}' for user {}: {}",
            action, user_id, db_error
        );
    }
}
