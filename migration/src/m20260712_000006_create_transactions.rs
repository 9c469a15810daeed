//! Migration to create the transactions table
//!
//! One row per change of certificate ownership. Rows are append-only; the
//! auto-increment key doubles as the insertion-order tiebreak when two
//! transactions share a recorded_on date.

use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(pk_auto(Transactions::Id))
                    .col(string_len(Transactions::CertificateId, 32))
                    .col(string_len(Transactions::SellerId, 32))
                    .col(string_len(Transactions::BuyerId, 32))
                    .col(decimal_len(Transactions::Price, 16, 2).default(0))
                    .col(decimal_len(Transactions::PricePerShare, 20, 6).default(0))
                    .col(date(Transactions::RecordedOn))
                    .col(string_null(Transactions::Remarks))
                    .col(timestamp(Transactions::CreatedAt).default(Expr::current_timestamp()))
                    .to_owned(),
            )
            .await?;

        // Timeline queries scan per certificate in recorded_on order
        manager
            .create_index(
                Index::create()
                    .name("idx_transactions_certificate_recorded")
                    .table(Transactions::Table)
                    .col(Transactions::CertificateId)
                    .col(Transactions::RecordedOn)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_transactions_seller")
                    .table(Transactions::Table)
                    .col(Transactions::SellerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_transactions_buyer")
                    .table(Transactions::Table)
                    .col(Transactions::BuyerId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Transactions {
    Table,
    Id,
    CertificateId,
    SellerId,
    BuyerId,
    Price,
    PricePerShare,
    RecordedOn,
    Remarks,
    CreatedAt,
}
