//! Shareholder directory
//!
//! Creation and lookup of natural and juridical persons. The directory
//! re-validates its business rules (unique email, unique business id,
//! NIN format) itself; it does not trust whatever form layer sits in
//! front of it.

use std::collections::HashMap;
use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, Set,
};
use tracing::info;
use uuid::Uuid;

use crate::entities::shareholders::{KIND_JURIDICAL, KIND_NATURAL};
use crate::entities::{certificates, prelude::*, shareholders, transactions};
use crate::error::RegistryError;
use crate::models::shareholder::{Shareholder, ShareholderListEntry};
use crate::services::registry_cache::{RegistryCache, UnitOfWork};

lazy_static! {
    /// DDMMYY with impossible dates screened out. Day 29 is accepted in
    /// February regardless of year; leap years are not accounted for.
    static ref DDMMYY: Regex = Regex::new(
        r"^(?:31(?:0[13578]|1[02])|30(?:0[13-9]|1[012])|(?:0[1-9]|[12][0-9])(?:0[1-9]|1[012]))\d\d$"
    )
    .unwrap();
    /// Individual part of a Finnish HETU: century sign, rolling number,
    /// check character. Format only; the checksum is not verified.
    static ref HETU: Regex = Regex::new(r"^[A+-]\d{3}[0-9A-FHJ-NPR-Y]$").unwrap();
}

pub struct NaturalPersonInput {
    pub email: String,
    pub street: String,
    pub street_ext: Option<String>,
    pub zip_code: String,
    pub city: String,
    pub country: String,
    pub first_name: String,
    pub last_name: String,
    pub nin: String,
    pub nationality: String,
}

pub struct JuridicalPersonInput {
    pub email: String,
    pub street: String,
    pub street_ext: Option<String>,
    pub zip_code: String,
    pub city: String,
    pub country: String,
    pub name: String,
    pub business_id: String,
    pub contact_person: String,
}

pub struct ShareholderDirectory {
    db: DatabaseConnection,
    cache: Arc<RegistryCache>,
}

impl ShareholderDirectory {
    pub fn new(db: DatabaseConnection, cache: Arc<RegistryCache>) -> Self {
        Self { db, cache }
    }

    pub async fn create_natural_person(
        &self,
        input: NaturalPersonInput,
    ) -> Result<Shareholder, RegistryError> {
        validate_nin(&input.nin)?;
        self.check_unique(shareholders::Column::Email, "email", &input.email)
            .await?;

        let row = shareholders::ActiveModel {
            id: Set(Uuid::new_v4().simple().to_string()),
            email: Set(input.email),
            street: Set(input.street),
            street_ext: Set(input.street_ext),
            zip_code: Set(input.zip_code),
            city: Set(input.city),
            country: Set(input.country),
            kind: Set(KIND_NATURAL.to_string()),
            first_name: Set(Some(input.first_name)),
            last_name: Set(Some(input.last_name)),
            nin: Set(Some(input.nin)),
            nationality: Set(Some(input.nationality)),
            company_name: Set(None),
            business_id: Set(None),
            contact_person: Set(None),
        };
        self.insert(row).await
    }

    pub async fn create_juridical_person(
        &self,
        input: JuridicalPersonInput,
    ) -> Result<Shareholder, RegistryError> {
        self.check_unique(shareholders::Column::Email, "email", &input.email)
            .await?;
        self.check_unique(
            shareholders::Column::BusinessId,
            "business id",
            &input.business_id,
        )
        .await?;

        let row = shareholders::ActiveModel {
            id: Set(Uuid::new_v4().simple().to_string()),
            email: Set(input.email),
            street: Set(input.street),
            street_ext: Set(input.street_ext),
            zip_code: Set(input.zip_code),
            city: Set(input.city),
            country: Set(input.country),
            kind: Set(KIND_JURIDICAL.to_string()),
            first_name: Set(None),
            last_name: Set(None),
            nin: Set(None),
            nationality: Set(None),
            company_name: Set(Some(input.name)),
            business_id: Set(Some(input.business_id)),
            contact_person: Set(Some(input.contact_person)),
        };
        self.insert(row).await
    }

    async fn insert(&self, row: shareholders::ActiveModel) -> Result<Shareholder, RegistryError> {
        let uow = UnitOfWork::new(self.db.clone(), self.cache.clone());
        let created = uow
            .commit(move |txn| Box::pin(async move { Ok(row.insert(txn).await?) }))
            .await?;

        info!(shareholder_id = %created.id, kind = %created.kind, "created shareholder");
        created.try_into()
    }

    pub async fn get(&self, id: &str) -> Result<Shareholder, RegistryError> {
        Shareholders::find_by_id(id.to_owned())
            .one(&self.db)
            .await?
            .ok_or_else(|| RegistryError::NotFound {
                entity: "shareholder",
                id: id.to_owned(),
            })?
            .try_into()
    }

    /// All shareholders sorted by display name, each with the number of
    /// shares currently controlled through live certificates. Derived
    /// ownership: a certificate counts for the buyer of its latest
    /// transaction, or its initial owner when it has none.
    pub async fn list(&self) -> Result<Vec<ShareholderListEntry>, RegistryError> {
        let holders = Shareholders::find().all(&self.db).await?;

        let live = Certificates::find()
            .filter(certificates::Column::CanceledOn.is_null())
            .all(&self.db)
            .await?;
        let mut share_counts: HashMap<String, i64> = HashMap::new();
        if !live.is_empty() {
            let cert_ids: Vec<String> = live.iter().map(|c| c.id.clone()).collect();
            let transfers = Transactions::find()
                .filter(transactions::Column::CertificateId.is_in(cert_ids))
                .all(&self.db)
                .await?;
            let mut by_cert: HashMap<&str, Vec<&transactions::Model>> = HashMap::new();
            for t in &transfers {
                by_cert.entry(t.certificate_id.as_str()).or_default().push(t);
            }
            for cert in &live {
                let owner_id = by_cert
                    .get(cert.id.as_str())
                    .and_then(|ts| {
                        ts.iter()
                            .max_by_key(|t| (t.recorded_on, t.id))
                            .map(|t| t.buyer_id.clone())
                    })
                    .unwrap_or_else(|| cert.owner_id.clone());
                *share_counts.entry(owner_id).or_insert(0) += cert.share_count;
            }
        }

        let mut entries = Vec::with_capacity(holders.len());
        for row in holders {
            let holder = Shareholder::try_from(row)?;
            entries.push(ShareholderListEntry {
                name: holder.display_name(),
                kind: holder.kind_label().to_string(),
                identifier: holder.identifier().to_string(),
                share_count: share_counts.get(&holder.id).copied().unwrap_or(0),
                email: holder.email,
                country: holder.country,
                id: holder.id,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// True if the shareholder is the initial owner of any certificate or
    /// a party to any transaction. Such shareholders are part of the
    /// registry's history and must not be deleted.
    pub async fn has_transactions(&self, id: &str) -> Result<bool, RegistryError> {
        let owns = Certificates::find()
            .filter(certificates::Column::OwnerId.eq(id))
            .count(&self.db)
            .await?;
        if owns > 0 {
            return Ok(true);
        }

        let party_to = Transactions::find()
            .filter(
                Condition::any()
                    .add(transactions::Column::SellerId.eq(id))
                    .add(transactions::Column::BuyerId.eq(id)),
            )
            .count(&self.db)
            .await?;
        Ok(party_to > 0)
    }

    pub async fn count_all(&self) -> Result<u64, RegistryError> {
        Ok(Shareholders::find().count(&self.db).await?)
    }

    async fn check_unique(
        &self,
        column: shareholders::Column,
        field: &'static str,
        value: &str,
    ) -> Result<(), RegistryError> {
        let taken = Shareholders::find()
            .filter(column.eq(value))
            .count(&self.db)
            .await?;
        if taken > 0 {
            return Err(RegistryError::Duplicate {
                field,
                value: value.to_owned(),
            });
        }
        Ok(())
    }
}

/// A NIN is either a bare DDMMYY date of birth, or a date of birth
/// followed by the individual HETU part. Impossible dates (Feb 30,
/// Apr 31, day 00) are rejected; Feb 29 is accepted in any year.
pub fn validate_nin(value: &str) -> Result<(), RegistryError> {
    let invalid = || RegistryError::InvalidNin {
        value: value.to_owned(),
    };

    let s = value.trim();
    if !s.is_ascii() {
        return Err(invalid());
    }

    if s.len() == 6 && DDMMYY.is_match(s) {
        return Ok(());
    }
    if s.len() == 11 && DDMMYY.is_match(&s[..6]) && HETU.is_match(&s[6..]) {
        return Ok(());
    }
    Err(invalid())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_date_of_birth_is_accepted() {
        assert!(validate_nin("010190").is_ok());
        assert!(validate_nin("311299").is_ok());
        assert!(validate_nin("300611").is_ok());
    }

    #[test]
    fn test_full_hetu_is_accepted() {
        assert!(validate_nin("010190-123A").is_ok());
        assert!(validate_nin("311299A456K").is_ok());
        assert!(validate_nin("010190+789Y").is_ok());
    }

    #[test]
    fn test_impossible_dates_are_rejected() {
        // no 32nd, no month 13, no day 00
        assert!(validate_nin("320190").is_err());
        assert!(validate_nin("011390").is_err());
        assert!(validate_nin("000190").is_err());
        // 31st of a 30-day month, 30th of February
        assert!(validate_nin("310490").is_err());
        assert!(validate_nin("300290").is_err());
    }

    #[test]
    fn test_feb_29_passes_in_any_year() {
        // leap years are not accounted for; 2090 is fine, and so would
        // a non-leap year be
        assert!(validate_nin("290290").is_ok());
        assert!(validate_nin("290215").is_ok());
    }

    #[test]
    fn test_malformed_hetu_part_is_rejected() {
        // bad century sign, bad check character
        assert!(validate_nin("010190*123A").is_err());
        assert!(validate_nin("010190-123G").is_err());
        // truncated
        assert!(validate_nin("010190-12").is_err());
    }

    #[test]
    fn test_non_ascii_input_is_rejected_not_panicked_on() {
        assert!(validate_nin("öööööö").is_err());
        assert!(validate_nin("010190-123Ä").is_err());
    }
}
