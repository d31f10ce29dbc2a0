pub use sea_orm_migration::prelude::*;

mod m20250310_000001_create_users;
mod m20250310_000002_create_auth_tokens;
mod m20250322_000001_create_logs_and_documents;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250310_000001_create_users::Migration),
            Box::new(m20250310_000002_create_auth_tokens::Migration),
            Box::new(m20250322_000001_create_logs_and_documents::Migration),
        ]
    }
}
