//! SeaORM entity for the shares table
//!
//! Shares are numbered sequentially and the number is the primary key;
//! it is never reused, even for canceled shares.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "shares")]
pub struct Model {
    /// Share number, assigned by the issuance service
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    pub issued_on: Date,
    pub canceled_on: Option<Date>,
    /// True while the share belongs to a live certificate
    pub is_bound: bool,
    pub share_class_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
