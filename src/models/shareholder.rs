//! Domain view of shareholders
//!
//! The storage row keeps subtype columns nullable behind a kind
//! discriminator; this module folds them into a tagged enum so that
//! everything downstream works with an exhaustive match instead of
//! checking nullable fields.

use sea_orm::DbErr;
use serde::{Deserialize, Serialize};

use crate::entities::shareholders::{self, KIND_JURIDICAL, KIND_NATURAL};
use crate::error::RegistryError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shareholder {
    pub id: String,
    pub email: String,
    pub street: String,
    pub street_ext: Option<String>,
    pub zip_code: String,
    pub city: String,
    pub country: String,
    pub kind: ShareholderKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShareholderKind {
    NaturalPerson {
        first_name: String,
        last_name: String,
        nin: String,
        nationality: String,
    },
    JuridicalPerson {
        name: String,
        business_id: String,
        contact_person: String,
    },
}

impl Shareholder {
    /// Registry display name: "Last, First" for people, company name
    /// for organizations
    pub fn display_name(&self) -> String {
        match &self.kind {
            ShareholderKind::NaturalPerson {
                first_name,
                last_name,
                ..
            } => format!("{}, {}", last_name, first_name),
            ShareholderKind::JuridicalPerson { name, .. } => name.clone(),
        }
    }

    /// National identification number or business id, depending on kind
    pub fn identifier(&self) -> &str {
        match &self.kind {
            ShareholderKind::NaturalPerson { nin, .. } => nin,
            ShareholderKind::JuridicalPerson { business_id, .. } => business_id,
        }
    }

    pub fn kind_label(&self) -> &'static str {
        match &self.kind {
            ShareholderKind::NaturalPerson { .. } => KIND_NATURAL,
            ShareholderKind::JuridicalPerson { .. } => KIND_JURIDICAL,
        }
    }
}

impl TryFrom<shareholders::Model> for Shareholder {
    type Error = RegistryError;

    fn try_from(row: shareholders::Model) -> Result<Self, Self::Error> {
        let malformed = |id: &str| {
            RegistryError::Storage(DbErr::Custom(format!(
                "shareholder {} has malformed subtype columns",
                id
            )))
        };

        let kind = match row.kind.as_str() {
            KIND_NATURAL => ShareholderKind::NaturalPerson {
                first_name: row.first_name.ok_or_else(|| malformed(&row.id))?,
                last_name: row.last_name.ok_or_else(|| malformed(&row.id))?,
                nin: row.nin.ok_or_else(|| malformed(&row.id))?,
                nationality: row.nationality.ok_or_else(|| malformed(&row.id))?,
            },
            KIND_JURIDICAL => ShareholderKind::JuridicalPerson {
                name: row.company_name.ok_or_else(|| malformed(&row.id))?,
                business_id: row.business_id.ok_or_else(|| malformed(&row.id))?,
                contact_person: row.contact_person.ok_or_else(|| malformed(&row.id))?,
            },
            _ => return Err(malformed(&row.id)),
        };

        Ok(Shareholder {
            id: row.id,
            email: row.email,
            street: row.street,
            street_ext: row.street_ext,
            zip_code: row.zip_code,
            city: row.city,
            country: row.country,
            kind,
        })
    }
}

/// Row of the shareholder list view: identity plus how many shares the
/// holder currently controls through live certificates
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShareholderListEntry {
    pub id: String,
    pub name: String,
    pub email: String,
    pub country: String,
    pub kind: String,
    pub identifier: String,
    pub share_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn natural_row() -> shareholders::Model {
        shareholders::Model {
            id: "a1".to_string(),
            email: "maija@example.fi".to_string(),
            street: "Mannerheimintie 1".to_string(),
            street_ext: None,
            zip_code: "00100".to_string(),
            city: "Helsinki".to_string(),
            country: "Finland".to_string(),
            kind: KIND_NATURAL.to_string(),
            first_name: Some("Maija".to_string()),
            last_name: Some("Meikäläinen".to_string()),
            nin: Some("010190".to_string()),
            nationality: Some("Finnish".to_string()),
            company_name: None,
            business_id: None,
            contact_person: None,
        }
    }

    #[test]
    fn test_natural_person_display_name_is_last_comma_first() {
        let holder = Shareholder::try_from(natural_row()).unwrap();
        assert_eq!(holder.display_name(), "Meikäläinen, Maija");
        assert_eq!(holder.identifier(), "010190");
    }

    #[test]
    fn test_juridical_person_display_name_is_company_name() {
        let mut row = natural_row();
        row.kind = KIND_JURIDICAL.to_string();
        row.first_name = None;
        row.last_name = None;
        row.nin = None;
        row.nationality = None;
        row.company_name = Some("Oy Firma Ab".to_string());
        row.business_id = Some("1234567-8".to_string());
        row.contact_person = Some("Meikäläinen, Maija".to_string());

        let holder = Shareholder::try_from(row).unwrap();
        assert_eq!(holder.display_name(), "Oy Firma Ab");
        assert_eq!(holder.identifier(), "1234567-8");
    }

    #[test]
    fn test_missing_subtype_column_is_a_storage_error() {
        let mut row = natural_row();
        row.nin = None;
        assert!(matches!(
            Shareholder::try_from(row),
            Err(RegistryError::Storage(_))
        ));
    }

    #[test]
    fn test_unknown_kind_is_a_storage_error() {
        let mut row = natural_row();
        row.kind = "cooperative".to_string();
        assert!(matches!(
            Shareholder::try_from(row),
            Err(RegistryError::Storage(_))
        ));
    }
}
