//! Migration to create the shareholders table
//!
//! Shareholders come in two flavors, natural and juridical persons. The
//! subtype-specific columns live in this one table, nullable, with a kind
//! discriminator; the application layer maps them to a tagged enum.

use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Shareholders::Table)
                    .if_not_exists()
                    .col(string_len(Shareholders::Id, 32).primary_key())
                    .col(string(Shareholders::Email).unique_key())
                    .col(string(Shareholders::Street))
                    .col(string_null(Shareholders::StreetExt))
                    .col(string_len(Shareholders::ZipCode, 32))
                    .col(string_len(Shareholders::City, 64))
                    .col(string_len(Shareholders::Country, 64))
                    .col(string_len(Shareholders::Kind, 16))
                    // natural person columns
                    .col(string_len_null(Shareholders::FirstName, 64))
                    .col(string_len_null(Shareholders::LastName, 64))
                    .col(string_len_null(Shareholders::Nin, 16))
                    .col(string_len_null(Shareholders::Nationality, 64))
                    // juridical person columns
                    .col(string_len_null(Shareholders::CompanyName, 128))
                    .col(string_len_null(Shareholders::BusinessId, 32))
                    .col(string_len_null(Shareholders::ContactPerson, 128))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_shareholders_kind")
                    .table(Shareholders::Table)
                    .col(Shareholders::Kind)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Shareholders::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Shareholders {
    Table,
    Id,
    Email,
    Street,
    StreetExt,
    ZipCode,
    City,
    Country,
    Kind,
    FirstName,
    LastName,
    Nin,
    Nationality,
    CompanyName,
    BusinessId,
    ContactPerson,
}
