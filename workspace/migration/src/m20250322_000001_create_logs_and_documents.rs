use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create user_logs table
        manager
            .create_table(
                Table::create()
                    .table(UserLogs::Table)
                    .if_not_exists()
                    .col(pk_auto(UserLogs::Id))
                    .col(integer(UserLogs::UserId))
                    .col(string(UserLogs::Action))
                    .col(json_null(UserLogs::Details))
                    .col(string_null(UserLogs::IpAddress))
                    .col(string_null(UserLogs::UserAgent))
                    .col(timestamp_with_time_zone(UserLogs::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_logs_user")
                            .from(UserLogs::Table, UserLogs::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create user_documents table
        manager
            .create_table(
                Table::create()
                    .table(UserDocuments::Table)
                    .if_not_exists()
                    .col(pk_auto(UserDocuments::Id))
                    .col(integer(UserDocuments::UserId))
                    .col(string(UserDocuments::FileName))
                    .col(string(UserDocuments::FilePath))
                    .col(big_integer(UserDocuments::FileSize))
                    .col(string(UserDocuments::FileType))
                    .col(string(UserDocuments::Category))
                    .col(string_null(UserDocuments::Description))
                    .col(timestamp_with_time_zone(UserDocuments::CreatedAt))
                    .col(timestamp_with_time_zone(UserDocuments::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_documents_user")
                            .from(UserDocuments::Table, UserDocuments::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserDocuments::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(UserLogs::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum UserLogs {
    Table,
    Id,
    UserId,
    Action,
    Details,
    IpAddress,
    UserAgent,
    CreatedAt,
}

#[derive(DeriveIden)]
enum UserDocuments {
    Table,
    Id,
    UserId,
    FileName,
    FilePath,
    FileSize,
    FileType,
    Category,
    Description,
    CreatedAt,
    UpdatedAt,
}
