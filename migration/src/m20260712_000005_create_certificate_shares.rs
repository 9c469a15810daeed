//! Migration to create the certificate_shares membership table
//!
//! Records which shares a certificate holds. Rows are kept after the
//! certificate is canceled: the binding history is what the re-bundle
//! date floor is computed from.

use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CertificateShares::Table)
                    .if_not_exists()
                    .col(big_integer(CertificateShares::ShareId))
                    .col(string_len(CertificateShares::CertificateId, 32))
                    .primary_key(
                        Index::create()
                            .name("pk_certificate_shares")
                            .col(CertificateShares::ShareId)
                            .col(CertificateShares::CertificateId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_certificate_shares_certificate")
                    .table(CertificateShares::Table)
                    .col(CertificateShares::CertificateId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CertificateShares::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CertificateShares {
    Table,
    ShareId,
    CertificateId,
}
