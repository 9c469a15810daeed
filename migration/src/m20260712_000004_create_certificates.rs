//! Migration to create the certificates table
//!
//! A certificate bundles a contiguous, fixed-for-life range of shares.
//! owner_id is the initial owner written at bundle time; the current owner
//! is derived from the transaction log, never stored.

use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Certificates::Table)
                    .if_not_exists()
                    .col(string_len(Certificates::Id, 32).primary_key())
                    .col(big_integer(Certificates::FirstShare))
                    .col(big_integer(Certificates::LastShare))
                    .col(big_integer(Certificates::ShareCount))
                    .col(string_len(Certificates::OwnerId, 32))
                    .col(date(Certificates::IssuedOn))
                    .col(date_null(Certificates::CanceledOn))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_certificates_owner")
                    .table(Certificates::Table)
                    .col(Certificates::OwnerId)
                    .to_owned(),
            )
            .await?;

        // List views order live certificates by their first share number
        manager
            .create_index(
                Index::create()
                    .name("idx_certificates_first_share")
                    .table(Certificates::Table)
                    .col(Certificates::FirstShare)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Certificates::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Certificates {
    Table,
    Id,
    FirstShare,
    LastShare,
    ShareCount,
    OwnerId,
    IssuedOn,
    CanceledOn,
}
