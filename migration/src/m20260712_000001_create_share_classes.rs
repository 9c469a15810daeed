//! Migration to create the share_classes table
//!
//! Share classes categorize shares by privilege; here that is just
//! votes conferred per share.

use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ShareClasses::Table)
                    .if_not_exists()
                    .col(string_len(ShareClasses::Id, 32).primary_key())
                    .col(string_len(ShareClasses::Name, 32).unique_key())
                    .col(integer(ShareClasses::Votes).default(1))
                    .col(string_null(ShareClasses::Remarks))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ShareClasses::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ShareClasses {
    Table,
    Id,
    Name,
    Votes,
    Remarks,
}
