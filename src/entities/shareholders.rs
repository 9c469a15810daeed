//! SeaORM entity for the shareholders table
//!
//! Natural and juridical persons share one table with a kind discriminator;
//! the subtype columns are nullable here and mapped to a tagged enum in
//! models::shareholder.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind column value for natural persons
pub const KIND_NATURAL: &str = "natural_person";
/// Kind column value for juridical persons
pub const KIND_JURIDICAL: &str = "juridical_person";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "shareholders")]
pub struct Model {
    /// 32-char hex UUID
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub email: String,
    pub street: String,
    pub street_ext: Option<String>,
    pub zip_code: String,
    pub city: String,
    pub country: String,
    pub kind: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// National identification number (DDMMYY date of birth or full HETU)
    pub nin: Option<String>,
    pub nationality: Option<String>,
    pub company_name: Option<String>,
    pub business_id: Option<String>,
    pub contact_person: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
