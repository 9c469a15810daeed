//! Ownership-transfer log per certificate
//!
//! Transactions are append-only: recording a transfer never touches a
//! prior row, and the current owner is always derived from the log (the
//! buyer of the latest transaction, falling back to the certificate's
//! initial owner), never stored.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, NotSet,
    QueryFilter, QueryOrder, Set,
};
use tracing::info;

use crate::entities::{certificates, prelude::*, shareholders, transactions};
use crate::error::RegistryError;
use crate::models::certificate::OwnerRef;
use crate::models::share_range::{self, ShareRange};
use crate::models::shareholder::Shareholder;
use crate::models::transaction::TransferLogEntry;
use crate::services::registry_cache::{RegistryCache, UnitOfWork};
use crate::services::temporal::{check_not_before, check_not_future, today};

pub struct TransferRequest {
    pub certificate_id: String,
    pub seller_id: String,
    pub buyer_id: String,
    /// Total price in EUR, zero for gratuitous transfers
    pub price: Decimal,
    pub recorded_on: NaiveDate,
    pub remarks: Option<String>,
}

pub struct OwnershipTimeline {
    db: DatabaseConnection,
    cache: Arc<RegistryCache>,
}

impl OwnershipTimeline {
    pub fn new(db: DatabaseConnection, cache: Arc<RegistryCache>) -> Self {
        Self { db, cache }
    }

    /// Append one ownership transfer to a certificate's timeline.
    pub async fn record_transfer(
        &self,
        req: TransferRequest,
    ) -> Result<transactions::Model, RegistryError> {
        if req.buyer_id == req.seller_id {
            return Err(RegistryError::SameParty {
                shareholder_id: req.buyer_id,
            });
        }
        if req.price < Decimal::ZERO {
            return Err(RegistryError::NegativePrice { price: req.price });
        }

        let certificate = Certificates::find_by_id(req.certificate_id.clone())
            .one(&self.db)
            .await?
            .ok_or_else(|| RegistryError::NotFound {
                entity: "certificate",
                id: req.certificate_id.clone(),
            })?;
        if certificate.canceled_on.is_some() {
            return Err(RegistryError::CertificateCanceled {
                certificate_id: certificate.id,
            });
        }

        for party in [&req.seller_id, &req.buyer_id] {
            Shareholders::find_by_id(party.clone())
                .one(&self.db)
                .await?
                .ok_or_else(|| RegistryError::NotFound {
                    entity: "shareholder",
                    id: party.clone(),
                })?;
        }

        let floor = self
            .latest_transaction_date(&certificate.id)
            .await?
            .unwrap_or(certificate.issued_on);
        check_not_before(req.recorded_on, floor)?;
        check_not_future(req.recorded_on, today())?;

        let transfer = transactions::ActiveModel {
            id: NotSet,
            certificate_id: Set(req.certificate_id),
            seller_id: Set(req.seller_id),
            buyer_id: Set(req.buyer_id),
            price: Set(req.price),
            price_per_share: Set(req.price / Decimal::from(certificate.share_count)),
            recorded_on: Set(req.recorded_on),
            remarks: Set(req.remarks),
            created_at: NotSet,
        };

        let uow = UnitOfWork::new(self.db.clone(), self.cache.clone());
        let recorded = uow
            .commit(move |txn| Box::pin(async move { Ok(transfer.insert(txn).await?) }))
            .await?;

        info!(
            transaction_id = recorded.id,
            certificate_id = %recorded.certificate_id,
            recorded_on = %recorded.recorded_on,
            "recorded ownership transfer"
        );
        Ok(recorded)
    }

    /// Current owner: buyer of the latest transaction, or the initial
    /// owner when the certificate has no transactions yet.
    pub async fn current_owner(&self, certificate_id: &str) -> Result<OwnerRef, RegistryError> {
        if let Some(hit) = self.cache.get_owner(certificate_id).await {
            return Ok(hit);
        }

        let certificate = Certificates::find_by_id(certificate_id.to_owned())
            .one(&self.db)
            .await?
            .ok_or_else(|| RegistryError::NotFound {
                entity: "certificate",
                id: certificate_id.to_owned(),
            })?;

        let transfers = Transactions::find()
            .filter(transactions::Column::CertificateId.eq(certificate_id))
            .all(&self.db)
            .await?;
        let owner_id = pick_latest(&transfers)
            .map(|t| t.buyer_id.clone())
            .unwrap_or(certificate.owner_id);

        let holder: Shareholder = Shareholders::find_by_id(owner_id.clone())
            .one(&self.db)
            .await?
            .ok_or_else(|| RegistryError::NotFound {
                entity: "shareholder",
                id: owner_id,
            })?
            .try_into()?;

        let owner = OwnerRef {
            id: holder.id.clone(),
            name: holder.display_name(),
        };
        self.cache.put_owner(certificate_id, owner.clone()).await;
        Ok(owner)
    }

    /// Date of the latest transaction on a certificate, None if there
    /// are none.
    pub async fn latest_transaction_date(
        &self,
        certificate_id: &str,
    ) -> Result<Option<NaiveDate>, RegistryError> {
        if let Some(hit) = self.cache.get_latest_transfer_date(certificate_id).await {
            return Ok(hit);
        }

        let transfers = Transactions::find()
            .filter(transactions::Column::CertificateId.eq(certificate_id))
            .all(&self.db)
            .await?;
        let date = pick_latest(&transfers).map(|t| t.recorded_on);

        self.cache
            .put_latest_transfer_date(certificate_id, date)
            .await;
        Ok(date)
    }

    /// Transfer log of one certificate, oldest first.
    pub async fn transfers_for_certificate(
        &self,
        certificate_id: &str,
    ) -> Result<Vec<TransferLogEntry>, RegistryError> {
        let transfers = Transactions::find()
            .filter(transactions::Column::CertificateId.eq(certificate_id))
            .order_by_asc(transactions::Column::RecordedOn)
            .order_by_asc(transactions::Column::Id)
            .all(&self.db)
            .await?;
        self.to_log_entries(transfers).await
    }

    /// Transfer log across all certificates, oldest first.
    pub async fn all_transfers(&self) -> Result<Vec<TransferLogEntry>, RegistryError> {
        let transfers = Transactions::find()
            .order_by_asc(transactions::Column::RecordedOn)
            .order_by_asc(transactions::Column::Id)
            .all(&self.db)
            .await?;
        self.to_log_entries(transfers).await
    }

    /// Transfers where the given shareholder was either party, oldest
    /// first.
    pub async fn transfers_for_shareholder(
        &self,
        shareholder_id: &str,
    ) -> Result<Vec<TransferLogEntry>, RegistryError> {
        let transfers = Transactions::find()
            .filter(
                Condition::any()
                    .add(transactions::Column::SellerId.eq(shareholder_id))
                    .add(transactions::Column::BuyerId.eq(shareholder_id)),
            )
            .order_by_asc(transactions::Column::RecordedOn)
            .order_by_asc(transactions::Column::Id)
            .all(&self.db)
            .await?;
        self.to_log_entries(transfers).await
    }

    async fn to_log_entries(
        &self,
        transfers: Vec<transactions::Model>,
    ) -> Result<Vec<TransferLogEntry>, RegistryError> {
        if transfers.is_empty() {
            return Ok(Vec::new());
        }

        let mut party_ids: Vec<String> = transfers
            .iter()
            .flat_map(|t| [t.seller_id.clone(), t.buyer_id.clone()])
            .collect();
        party_ids.sort();
        party_ids.dedup();
        let names: HashMap<String, String> = Shareholders::find()
            .filter(shareholders::Column::Id.is_in(party_ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|row| {
                let holder = Shareholder::try_from(row)?;
                Ok((holder.id.clone(), holder.display_name()))
            })
            .collect::<Result<_, RegistryError>>()?;

        let mut cert_ids: Vec<String> = transfers.iter().map(|t| t.certificate_id.clone()).collect();
        cert_ids.sort();
        cert_ids.dedup();
        let certs: HashMap<String, certificates::Model> = Certificates::find()
            .filter(certificates::Column::Id.is_in(cert_ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|c| (c.id.clone(), c))
            .collect();

        let last_issued = Shares::find()
            .order_by_desc(crate::entities::shares::Column::Id)
            .one(&self.db)
            .await?
            .map(|s| s.id)
            .unwrap_or(0);
        let places = share_range::title_width(last_issued);

        let unknown = || "(unknown)".to_string();
        Ok(transfers
            .into_iter()
            .map(|t| {
                let title = certs
                    .get(&t.certificate_id)
                    .map(|c| ShareRange::new(c.first_share, c.last_share).title(places))
                    .unwrap_or_else(unknown);
                TransferLogEntry {
                    title,
                    seller: names.get(&t.seller_id).cloned().unwrap_or_else(unknown),
                    buyer: names.get(&t.buyer_id).cloned().unwrap_or_else(unknown),
                    certificate_id: t.certificate_id,
                    price: t.price,
                    recorded_on: t.recorded_on,
                }
            })
            .collect())
    }
}

/// The transaction that determines current ownership: latest recorded_on,
/// ties broken by insertion order (the auto-increment id).
pub fn pick_latest(transfers: &[transactions::Model]) -> Option<&transactions::Model> {
    transfers.iter().max_by_key(|t| (t.recorded_on, t.id))
}
