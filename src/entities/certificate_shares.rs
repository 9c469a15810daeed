//! SeaORM entity for the certificate_shares membership table
//!
//! Many-to-many between certificates and shares. Historical rows are kept
//! after cancellation; the re-bundle date floor walks this history.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "certificate_shares")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub share_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub certificate_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
