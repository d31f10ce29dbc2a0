use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account role, ranked for authorization checks.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    #[sea_orm(string_value = "USER")]
    User,
    #[sea_orm(string_value = "ADMIN")]
    Admin,
    #[sea_orm(string_value = "SUPERADMIN")]
    Superadmin,
}

impl UserRole {
    /// Numeric rank: SUPERADMIN > ADMIN > USER.
    pub fn rank(&self) -> u8 {
        match self {
            UserRole::Superadmin => 3,
            UserRole::Admin => 2,
            UserRole::User => 1,
        }
    }

    pub fn at_least(&self, required: UserRole) -> bool {
        self.rank() >= required.rank()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Superadmin => "SUPERADMIN",
            UserRole::Admin => "ADMIN",
            UserRole::User => "USER",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "SUPERADMIN" => Some(UserRole::Superadmin),
            "ADMIN" => Some(UserRole::Admin),
            "USER" => Some(UserRole::User),
            _ => None,
        }
    }
}

/// Lifecycle status of an account.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(24))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    #[sea_orm(string_value = "PENDING_VERIFICATION")]
    PendingVerification,
    #[sea_orm(string_value = "ACTIVE")]
    Active,
    #[sea_orm(string_value = "INACTIVE")]
    Inactive,
    #[sea_orm(string_value = "SUSPENDED")]
    Suspended,
    #[sea_orm(string_value = "BANNED")]
    Banned,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::PendingVerification => "PENDING_VERIFICATION",
            UserStatus::Active => "ACTIVE",
            UserStatus::Inactive => "INACTIVE",
            UserStatus::Suspended => "SUSPENDED",
            UserStatus::Banned => "BANNED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PENDING_VERIFICATION" => Some(UserStatus::PendingVerification),
            "ACTIVE" => Some(UserStatus::Active),
            "INACTIVE" => Some(UserStatus::Inactive),
            "SUSPENDED" => Some(UserStatus::Suspended),
            "BANNED" => Some(UserStatus::Banned),
            _ => None,
        }
    }
}

/// How the account authenticates. Only LOCAL accounts carry a password hash;
/// password reset and verification resend are restricted to LOCAL.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthProvider {
    #[sea_orm(string_value = "LOCAL")]
    Local,
    #[sea_orm(string_value = "GOOGLE")]
    Google,
}

impl AuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthProvider::Local => "LOCAL",
            AuthProvider::Google => "GOOGLE",
        }
    }
}

/// Represents a registered user: credentials, role/status, profile fields,
/// and login-attempt lockout bookkeeping.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub email: String,
    #[sea_orm(unique)]
    pub username: String,
    /// Bcrypt hash. None for accounts created through an external provider.
    pub password_hash: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub display_name: Option<String>,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub timezone: Option<String>,
    pub language: Option<String>,
    pub currency: Option<String>,
    pub website: Option<String>,
    pub social_links: Option<Json>,
    pub preferences: Option<Json>,
    pub role: UserRole,
    pub status: UserStatus,
    pub auth_provider: AuthProvider,
    pub email_verified: bool,
    /// Failed logins since the last success. At the lockout threshold the
    /// account is locked until `locked_until`.
    pub login_attempts: i32,
    pub locked_until: Option<ChronoDateTimeUtc>,
    pub last_login_at: Option<ChronoDateTimeUtc>,
    pub last_active_at: Option<ChronoDateTimeUtc>,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::session::Entity")]
    Session,
    #[sea_orm(has_many = "super::refresh_token::Entity")]
    RefreshToken,
    #[sea_orm(has_many = "super::verification_token::Entity")]
    VerificationToken,
    #[sea_orm(has_many = "super::user_log::Entity")]
    UserLog,
    #[sea_orm(has_many = "super::user_document::Entity")]
    UserDocument,
}

impl Related<super::session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Session.def()
    }
}

impl Related<super::refresh_token::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RefreshToken.def()
    }
}

impl Related<super::user_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserLog.def()
    }
}

impl Related<super::user_document::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserDocument.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
