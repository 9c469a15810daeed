//! Bulk issuance of new shares
//!
//! A share issue appends the next N consecutive numbers to the sequence.
//! Numbers are handed out by this service, never by the database, so the
//! invariant "issued in contiguous monotonically increasing blocks, ids
//! never reused" holds by construction.

use std::sync::Arc;

use chrono::NaiveDate;
use sea_orm::{DatabaseConnection, EntityTrait, Set};
use tracing::info;

use crate::entities::{prelude::*, shares};
use crate::error::RegistryError;
use crate::models::share_range::ShareRange;
use crate::services::range_tracker::RangeTracker;
use crate::services::registry_cache::{RegistryCache, UnitOfWork};
use crate::services::temporal::{check_not_future, today};

pub struct IssueRequest {
    /// How many new shares to issue
    pub count: i64,
    pub share_class_id: String,
    pub issued_on: NaiveDate,
}

pub struct ShareIssuance {
    db: DatabaseConnection,
    cache: Arc<RegistryCache>,
}

impl ShareIssuance {
    pub fn new(db: DatabaseConnection, cache: Arc<RegistryCache>) -> Self {
        Self { db, cache }
    }

    /// Issue the next `count` share numbers in one atomic insert and
    /// return the newly covered range.
    pub async fn issue(&self, req: IssueRequest) -> Result<ShareRange, RegistryError> {
        let tracker = RangeTracker::new(self.db.clone(), self.cache.clone());
        let last_issued = tracker.last_issued_id().await?;

        if req.count < 1 {
            return Err(RegistryError::InvalidRange {
                first: last_issued + 1,
                last: last_issued + req.count,
            });
        }
        check_not_future(req.issued_on, today())?;

        ShareClasses::find_by_id(req.share_class_id.clone())
            .one(&self.db)
            .await?
            .ok_or_else(|| RegistryError::NotFound {
                entity: "share class",
                id: req.share_class_id.clone(),
            })?;

        let range = ShareRange::new(last_issued + 1, last_issued + req.count);
        let rows: Vec<shares::ActiveModel> = (range.first..=range.last)
            .map(|id| shares::ActiveModel {
                id: Set(id),
                issued_on: Set(req.issued_on),
                canceled_on: Set(None),
                is_bound: Set(false),
                share_class_id: Set(req.share_class_id.clone()),
            })
            .collect();

        let uow = UnitOfWork::new(self.db.clone(), self.cache.clone());
        uow.commit(move |txn| {
            Box::pin(async move {
                Shares::insert_many(rows).exec(txn).await?;
                Ok(())
            })
        })
        .await?;

        info!(
            first = range.first,
            last = range.last,
            issued_on = %req.issued_on,
            "issued new shares"
        );
        Ok(range)
    }
}
