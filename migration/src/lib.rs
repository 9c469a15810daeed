pub use sea_orm_migration::prelude::*;

mod m20260712_000001_create_share_classes;
mod m20260712_000002_create_shareholders;
mod m20260712_000003_create_shares;
mod m20260712_000004_create_certificates;
mod m20260712_000005_create_certificate_shares;
mod m20260712_000006_create_transactions;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260712_000001_create_share_classes::Migration),
            Box::new(m20260712_000002_create_shareholders::Migration),
            Box::new(m20260712_000003_create_shares::Migration),
            Box::new(m20260712_000004_create_certificates::Migration),
            Box::new(m20260712_000005_create_certificate_shares::Migration),
            Box::new(m20260712_000006_create_transactions::Migration),
        ]
    }
}
