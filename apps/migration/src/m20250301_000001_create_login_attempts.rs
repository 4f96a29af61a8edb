use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LoginAttempts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(LoginAttempts::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(LoginAttempts::IpAddress).string().not_null())
                    .col(ColumnDef::new(LoginAttempts::Email).string().not_null())
                    .col(
                        ColumnDef::new(LoginAttempts::Success)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(LoginAttempts::AttemptedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Window lookups filter on the key and a time bound
        manager
            .create_index(
                Index::create()
                    .name("idx_login_attempts_key_time")
                    .table(LoginAttempts::Table)
                    .col(LoginAttempts::IpAddress)
                    .col(LoginAttempts::Email)
                    .col(LoginAttempts::AttemptedAt)
                    .to_owned(),
            )
            .await?;

        // Compaction deletes by age alone
        manager
            .create_index(
                Index::create()
                    .name("idx_login_attempts_attempted_at")
                    .table(LoginAttempts::Table)
                    .col(LoginAttempts::AttemptedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LoginAttempts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum LoginAttempts {
    Table,
    Id,
    IpAddress,
    Email,
    Success,
    AttemptedAt,
}
