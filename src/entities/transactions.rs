//! SeaORM entity for the transactions table
//!
//! Append-only ownership-transfer events. The auto-increment key is the
//! insertion-order tiebreak for transactions recorded on the same date.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub certificate_id: String,
    pub seller_id: String,
    pub buyer_id: String,
    /// Total price in EUR
    #[sea_orm(column_type = "Decimal(Some((16, 2)))")]
    pub price: Decimal,
    /// Cached price / share_count of the certificate
    #[sea_orm(column_type = "Decimal(Some((20, 6)))")]
    pub price_per_share: Decimal,
    pub recorded_on: Date,
    pub remarks: Option<String>,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
