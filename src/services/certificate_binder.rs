//! Certificate bundling and cancellation
//!
//! The binder is the only writer of the share bound/unbound state. It is
//! essentially an interval allocator with a temporal twist: a range can
//! only be bundled once every prior binding over any of its shares has
//! been closed, and never dated before those closures.
//!
//! The rule checks are plain functions over plain values; the async
//! methods only gather state, run the checks in order, and then apply
//! the state transition in one database transaction.

use std::sync::Arc;

use chrono::NaiveDate;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use tracing::info;
use uuid::Uuid;

use crate::entities::{certificate_shares, certificates, prelude::*, shares, transactions};
use crate::error::RegistryError;
use crate::models::certificate::CertificateListEntry;
use crate::models::share_range::{self, ShareRange};
use crate::services::ownership_timeline::pick_latest;
use crate::services::range_tracker::{is_within_ranges, RangeTracker};
use crate::services::registry_cache::{RegistryCache, UnitOfWork};
use crate::services::temporal::{check_not_before, check_not_future, today};

pub struct BundleRequest {
    pub first_share: i64,
    pub last_share: i64,
    /// Initial owner of the new certificate
    pub owner_id: String,
    pub issued_on: NaiveDate,
}

pub struct CertificateBinder {
    db: DatabaseConnection,
    cache: Arc<RegistryCache>,
}

impl CertificateBinder {
    pub fn new(db: DatabaseConnection, cache: Arc<RegistryCache>) -> Self {
        Self { db, cache }
    }

    /// Bundle a contiguous range of free shares into a new certificate.
    ///
    /// Check order is fixed: range shape, range freedom, date floor,
    /// future date. An inverted range is reported as InvalidRange before
    /// any freedom or date check runs.
    pub async fn bundle(&self, req: BundleRequest) -> Result<certificates::Model, RegistryError> {
        let tracker = RangeTracker::new(self.db.clone(), self.cache.clone());

        let last_issued = tracker.last_issued_id().await?;
        check_bundle_range(req.first_share, req.last_share, last_issued)?;

        let free = tracker.free_ranges().await?;
        check_range_free(req.first_share, req.last_share, &free)?;

        let floor = self
            .bundle_floor(req.first_share, req.last_share)
            .await?;
        check_not_before(req.issued_on, floor)?;
        check_not_future(req.issued_on, today())?;

        Shareholders::find_by_id(req.owner_id.clone())
            .one(&self.db)
            .await?
            .ok_or_else(|| RegistryError::NotFound {
                entity: "shareholder",
                id: req.owner_id.clone(),
            })?;

        let certificate = certificates::ActiveModel {
            id: Set(Uuid::new_v4().simple().to_string()),
            first_share: Set(req.first_share),
            last_share: Set(req.last_share),
            share_count: Set(req.last_share - req.first_share + 1),
            owner_id: Set(req.owner_id),
            issued_on: Set(req.issued_on),
            canceled_on: Set(None),
        };

        let uow = UnitOfWork::new(self.db.clone(), self.cache.clone());
        let created = uow
            .commit(move |txn| {
                Box::pin(async move {
                    let created = certificate.insert(txn).await?;

                    let members: Vec<certificate_shares::ActiveModel> = (created.first_share
                        ..=created.last_share)
                        .map(|share_id| certificate_shares::ActiveModel {
                            share_id: Set(share_id),
                            certificate_id: Set(created.id.clone()),
                        })
                        .collect();
                    CertificateShares::insert_many(members).exec(txn).await?;

                    Shares::update_many()
                        .col_expr(shares::Column::IsBound, Expr::value(true))
                        .filter(shares::Column::Id.between(created.first_share, created.last_share))
                        .exec(txn)
                        .await?;

                    Ok(created)
                })
            })
            .await?;

        info!(
            certificate_id = %created.id,
            first_share = created.first_share,
            last_share = created.last_share,
            "bundled shares into certificate"
        );
        Ok(created)
    }

    /// Cancel a certificate and release its shares back to the free pool.
    pub async fn cancel(
        &self,
        certificate_id: &str,
        canceled_on: NaiveDate,
    ) -> Result<certificates::Model, RegistryError> {
        let certificate = self.get(certificate_id).await?;
        if certificate.canceled_on.is_some() {
            return Err(RegistryError::AlreadyCanceled {
                certificate_id: certificate.id,
            });
        }

        let latest_transfer = Transactions::find()
            .filter(transactions::Column::CertificateId.eq(certificate_id))
            .all(&self.db)
            .await?;
        let floor = pick_latest(&latest_transfer)
            .map(|t| t.recorded_on)
            .unwrap_or(certificate.issued_on);
        check_not_before(canceled_on, floor)?;
        check_not_future(canceled_on, today())?;

        let (first, last) = (certificate.first_share, certificate.last_share);
        let uow = UnitOfWork::new(self.db.clone(), self.cache.clone());
        let canceled = uow
            .commit(move |txn| {
                Box::pin(async move {
                    let mut active: certificates::ActiveModel = certificate.into();
                    active.canceled_on = Set(Some(canceled_on));
                    let canceled = active.update(txn).await?;

                    Shares::update_many()
                        .col_expr(shares::Column::IsBound, Expr::value(false))
                        .filter(shares::Column::Id.between(first, last))
                        .exec(txn)
                        .await?;

                    Ok(canceled)
                })
            })
            .await?;

        info!(
            certificate_id = %canceled.id,
            %canceled_on,
            "canceled certificate and released its shares"
        );
        Ok(canceled)
    }

    pub async fn get(&self, certificate_id: &str) -> Result<certificates::Model, RegistryError> {
        Certificates::find_by_id(certificate_id.to_owned())
            .one(&self.db)
            .await?
            .ok_or_else(|| RegistryError::NotFound {
                entity: "certificate",
                id: certificate_id.to_owned(),
            })
    }

    /// Earliest date the given range can be bundled on: the issue date of
    /// the newest share in range, pushed forward by the latest closure of
    /// any certificate that ever held one of these shares.
    async fn bundle_floor(&self, first: i64, last: i64) -> Result<NaiveDate, RegistryError> {
        if let Some(hit) = self.cache.get_bundle_floor(first, last).await {
            return Ok(hit);
        }

        // Shares are issued in increasing-id order, so the upper bound is
        // the most recently issued share in the range
        let upper = Shares::find_by_id(last)
            .one(&self.db)
            .await?
            .ok_or(RegistryError::InvalidRange { first, last })?;

        let prior_ids: Vec<String> = CertificateShares::find()
            .select_only()
            .column(certificate_shares::Column::CertificateId)
            .filter(certificate_shares::Column::ShareId.between(first, last))
            .distinct()
            .into_tuple()
            .all(&self.db)
            .await?;

        let latest_closure = if prior_ids.is_empty() {
            None
        } else {
            Certificates::find()
                .filter(certificates::Column::Id.is_in(prior_ids))
                .all(&self.db)
                .await?
                .iter()
                .filter_map(|c| c.canceled_on)
                .max()
        };

        let floor = earliest_bundle_date(upper.issued_on, latest_closure);
        self.cache.put_bundle_floor(first, last, floor).await;
        Ok(floor)
    }

    /// Live certificates ascending by first share, with padded titles,
    /// vote totals and derived current owners.
    pub async fn list_active(&self) -> Result<Vec<CertificateListEntry>, RegistryError> {
        let live = Certificates::find()
            .filter(certificates::Column::CanceledOn.is_null())
            .order_by_asc(certificates::Column::FirstShare)
            .all(&self.db)
            .await?;
        self.to_list_entries(live).await
    }

    /// Live certificates currently owned by the given shareholder.
    pub async fn list_active_for_owner(
        &self,
        shareholder_id: &str,
    ) -> Result<Vec<CertificateListEntry>, RegistryError> {
        let entries = self.list_active().await?;
        let timeline = crate::services::ownership_timeline::OwnershipTimeline::new(
            self.db.clone(),
            self.cache.clone(),
        );

        let mut owned = Vec::new();
        for entry in entries {
            let owner = timeline.current_owner(&entry.id).await?;
            if owner.id == shareholder_id {
                owned.push(entry);
            }
        }
        Ok(owned)
    }

    async fn to_list_entries(
        &self,
        certs: Vec<certificates::Model>,
    ) -> Result<Vec<CertificateListEntry>, RegistryError> {
        let tracker = RangeTracker::new(self.db.clone(), self.cache.clone());
        let places = share_range::title_width(tracker.last_issued_id().await?);

        let votes_by_class: std::collections::HashMap<String, i32> = ShareClasses::find()
            .all(&self.db)
            .await?
            .into_iter()
            .map(|c| (c.id, c.votes))
            .collect();

        let timeline = crate::services::ownership_timeline::OwnershipTimeline::new(
            self.db.clone(),
            self.cache.clone(),
        );

        let mut entries = Vec::with_capacity(certs.len());
        for cert in certs {
            let member_shares = Shares::find()
                .filter(shares::Column::Id.between(cert.first_share, cert.last_share))
                .all(&self.db)
                .await?;
            let votes: i64 = member_shares
                .iter()
                .map(|s| {
                    votes_by_class
                        .get(&s.share_class_id)
                        .copied()
                        .unwrap_or(0) as i64
                })
                .sum();

            let owner = timeline.current_owner(&cert.id).await?;
            let range = ShareRange::new(cert.first_share, cert.last_share);
            entries.push(CertificateListEntry {
                id: cert.id,
                title: range.title(places),
                first_share: cert.first_share,
                last_share: cert.last_share,
                share_count: cert.share_count,
                votes,
                owner: owner.name,
            });
        }
        Ok(entries)
    }
}

/// Range-shape check: positive bounds, not inverted, within issuance
pub fn check_bundle_range(first: i64, last: i64, last_issued: i64) -> Result<(), RegistryError> {
    if first < 1 || first > last || last > last_issued {
        return Err(RegistryError::InvalidRange { first, last });
    }
    Ok(())
}

/// Freedom check against the merged free ranges
pub fn check_range_free(
    first: i64,
    last: i64,
    free: &[ShareRange],
) -> Result<(), RegistryError> {
    if !is_within_ranges(first, last, free) {
        return Err(RegistryError::RangeNotFree { first, last });
    }
    Ok(())
}

/// The earliest date all shares in a range exist and are unbound: the
/// newest share's issue date, or the latest prior-binding closure if
/// that is later.
pub fn earliest_bundle_date(
    upper_issued_on: NaiveDate,
    latest_closure: Option<NaiveDate>,
) -> NaiveDate {
    match latest_closure {
        Some(closed) if closed > upper_issued_on => closed,
        _ => upper_issued_on,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_range_shape_rejections() {
        assert!(matches!(
            check_bundle_range(0, 5, 100),
            Err(RegistryError::InvalidRange { .. })
        ));
        assert!(matches!(
            check_bundle_range(10, 5, 100),
            Err(RegistryError::InvalidRange { .. })
        ));
        assert!(matches!(
            check_bundle_range(90, 101, 100),
            Err(RegistryError::InvalidRange { .. })
        ));
        assert!(check_bundle_range(1, 100, 100).is_ok());
        assert!(check_bundle_range(100, 100, 100).is_ok());
    }

    #[test]
    fn test_freedom_check_reports_range_not_free() {
        let free = vec![ShareRange::new(51, 100)];
        assert!(check_range_free(51, 60, &free).is_ok());
        assert!(matches!(
            check_range_free(40, 60, &free),
            Err(RegistryError::RangeNotFree { first: 40, last: 60 })
        ));
    }

    #[test]
    fn test_bundle_floor_is_max_of_issue_and_closure() {
        // no prior bindings: the share issue date alone
        assert_eq!(
            earliest_bundle_date(d(2020, 1, 1), None),
            d(2020, 1, 1)
        );
        // a later closure pushes the floor forward
        assert_eq!(
            earliest_bundle_date(d(2020, 1, 1), Some(d(2020, 6, 1))),
            d(2020, 6, 1)
        );
        // an earlier closure does not pull it back
        assert_eq!(
            earliest_bundle_date(d(2020, 1, 1), Some(d(2019, 6, 1))),
            d(2020, 1, 1)
        );
    }
}
