use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create users table
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string(Users::Email).unique_key())
                    .col(string(Users::Username).unique_key())
                    .col(string_null(Users::PasswordHash))
                    .col(string_null(Users::FirstName))
                    .col(string_null(Users::LastName))
                    .col(string_null(Users::DisplayName))
                    .col(string_null(Users::Avatar))
                    .col(string_null(Users::Bio))
                    .col(string_null(Users::Phone))
                    .col(string_null(Users::Location))
                    .col(string_null(Users::Timezone))
                    .col(string_null(Users::Language))
                    .col(string_null(Users::Currency))
                    .col(string_null(Users::Website))
                    .col(json_null(Users::SocialLinks))
                    .col(json_null(Users::Preferences))
                    .col(string(Users::Role).default("USER"))
                    .col(string(Users::Status).default("PENDING_VERIFICATION"))
                    .col(string(Users::AuthProvider).default("LOCAL"))
                    .col(boolean(Users::EmailVerified).default(false))
                    .col(integer(Users::LoginAttempts).default(0))
                    .col(timestamp_with_time_zone_null(Users::LockedUntil))
                    .col(timestamp_with_time_zone_null(Users::LastLoginAt))
                    .col(timestamp_with_time_zone_null(Users::LastActiveAt))
                    .col(timestamp_with_time_zone(Users::CreatedAt))
                    .col(timestamp_with_time_zone(Users::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Email,
    Username,
    PasswordHash,
    FirstName,
    LastName,
    DisplayName,
    Avatar,
    Bio,
    Phone,
    Location,
    Timezone,
    Language,
    Currency,
    Website,
    SocialLinks,
    Preferences,
    Role,
    Status,
    AuthProvider,
    EmailVerified,
    LoginAttempts,
    LockedUntil,
    LastLoginAt,
    LastActiveAt,
    CreatedAt,
    UpdatedAt,
}
