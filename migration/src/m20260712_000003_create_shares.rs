//! Migration to create the shares table
//!
//! Shares use their sequential number as the primary key, because that is
//! how they are identified in the real-world registry as well. Numbers are
//! assigned by the issuance service, never by the database.

use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Shares::Table)
                    .if_not_exists()
                    .col(big_integer(Shares::Id).primary_key())
                    .col(date(Shares::IssuedOn))
                    .col(date_null(Shares::CanceledOn))
                    .col(boolean(Shares::IsBound).default(false))
                    .col(string_len(Shares::ShareClassId, 32))
                    .to_owned(),
            )
            .await?;

        // The free-range scan filters on is_bound over the whole table
        manager
            .create_index(
                Index::create()
                    .name("idx_shares_is_bound")
                    .table(Shares::Table)
                    .col(Shares::IsBound)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_shares_share_class")
                    .table(Shares::Table)
                    .col(Shares::ShareClassId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Shares::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Shares {
    Table,
    Id,
    IssuedOn,
    CanceledOn,
    IsBound,
    ShareClassId,
}
