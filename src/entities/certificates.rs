//! SeaORM entity for the certificates table
//!
//! Certificates are named after the first and last share in their range
//! (e.g. 001-050) and must contain every share in between. The range is
//! fixed for the certificate's whole life, so first/last/count are stored
//! directly instead of being re-derived from the membership table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "certificates")]
pub struct Model {
    /// 32-char hex UUID
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub first_share: i64,
    pub last_share: i64,
    /// Cached last_share - first_share + 1
    pub share_count: i64,
    /// Initial owner, written once at bundle time; current owner is
    /// derived from the transaction log
    pub owner_id: String,
    pub issued_on: Date,
    pub canceled_on: Option<Date>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
