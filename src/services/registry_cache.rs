//! Read-through cache and unit of work for the registry
//!
//! Reads in this core may be served stale only until the next write:
//! interval allocation cannot tolerate a stale "free" range, so every
//! successful write invalidates the whole cache instead of patching
//! entries. The cache is owned by the application state and passed to
//! services explicitly; there is no global singleton.
//!
//! `UnitOfWork::commit` is the one place where a database transaction and
//! the cache flush meet: the closure runs inside a transaction, and the
//! flush happens if and only if the transaction commits.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use moka::future::Cache;
use parking_lot::RwLock;
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use tracing::debug;

use crate::error::RegistryError;
use crate::models::certificate::OwnerRef;
use crate::models::share_range::ShareRange;

const CACHE_CAPACITY: u64 = 10_000;

pub struct RegistryCache {
    /// Single-entry cache for the free-range scan
    free_ranges: Cache<(), Vec<ShareRange>>,
    /// Current owner per certificate id
    owners: Cache<String, OwnerRef>,
    /// Latest transaction date per certificate id (None = no transactions)
    latest_transfer_dates: Cache<String, Option<NaiveDate>>,
    /// Earliest possible bundle date per requested range
    bundle_floors: Cache<(i64, i64), NaiveDate>,
    last_invalidated: RwLock<Option<Instant>>,
}

impl RegistryCache {
    pub fn new() -> Self {
        Self {
            free_ranges: Cache::builder().max_capacity(1).build(),
            owners: Cache::builder().max_capacity(CACHE_CAPACITY).build(),
            latest_transfer_dates: Cache::builder().max_capacity(CACHE_CAPACITY).build(),
            bundle_floors: Cache::builder().max_capacity(CACHE_CAPACITY).build(),
            last_invalidated: RwLock::new(None),
        }
    }

    pub async fn get_free_ranges(&self) -> Option<Vec<ShareRange>> {
        self.free_ranges.get(&()).await
    }

    pub async fn put_free_ranges(&self, ranges: Vec<ShareRange>) {
        self.free_ranges.insert((), ranges).await;
    }

    pub async fn get_owner(&self, certificate_id: &str) -> Option<OwnerRef> {
        self.owners.get(certificate_id).await
    }

    pub async fn put_owner(&self, certificate_id: &str, owner: OwnerRef) {
        self.owners.insert(certificate_id.to_owned(), owner).await;
    }

    pub async fn get_latest_transfer_date(&self, certificate_id: &str) -> Option<Option<NaiveDate>> {
        self.latest_transfer_dates.get(certificate_id).await
    }

    pub async fn put_latest_transfer_date(&self, certificate_id: &str, date: Option<NaiveDate>) {
        self.latest_transfer_dates
            .insert(certificate_id.to_owned(), date)
            .await;
    }

    pub async fn get_bundle_floor(&self, first: i64, last: i64) -> Option<NaiveDate> {
        self.bundle_floors.get(&(first, last)).await
    }

    pub async fn put_bundle_floor(&self, first: i64, last: i64, floor: NaiveDate) {
        self.bundle_floors.insert((first, last), floor).await;
    }

    /// Drop every cached value. Called after each committed write; never
    /// patch individual entries instead.
    pub fn invalidate_all(&self) {
        self.free_ranges.invalidate_all();
        self.owners.invalidate_all();
        self.latest_transfer_dates.invalidate_all();
        self.bundle_floors.invalidate_all();
        *self.last_invalidated.write() = Some(Instant::now());
        debug!("registry cache invalidated");
    }

    /// When the cache was last flushed, if ever
    pub fn last_invalidated(&self) -> Option<Instant> {
        *self.last_invalidated.read()
    }
}

impl Default for RegistryCache {
    fn default() -> Self {
        Self::new()
    }
}

pub struct UnitOfWork {
    db: DatabaseConnection,
    cache: Arc<RegistryCache>,
}

impl UnitOfWork {
    pub fn new(db: DatabaseConnection, cache: Arc<RegistryCache>) -> Self {
        Self { db, cache }
    }

    /// Run `work` inside a database transaction; on commit, invalidate
    /// the cache. A rollback leaves the cache untouched, since nothing
    /// it reflects has changed.
    pub async fn commit<F, T>(&self, work: F) -> Result<T, RegistryError>
    where
        F: for<'c> FnOnce(
                &'c DatabaseTransaction,
            )
                -> Pin<Box<dyn Future<Output = Result<T, RegistryError>> + Send + 'c>>
            + Send,
        T: Send,
    {
        let out = self.db.transaction(work).await?;
        self.cache.invalidate_all();
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalidate_all_clears_every_cache() {
        let cache = RegistryCache::new();
        cache.put_free_ranges(vec![ShareRange::new(1, 10)]).await;
        cache
            .put_owner(
                "c1",
                OwnerRef {
                    id: "a1".to_string(),
                    name: "Oy Firma Ab".to_string(),
                },
            )
            .await;
        cache.put_latest_transfer_date("c1", None).await;

        cache.invalidate_all();
        // moka applies invalidation lazily; run the pending tasks first
        cache.free_ranges.run_pending_tasks().await;
        cache.owners.run_pending_tasks().await;
        cache.latest_transfer_dates.run_pending_tasks().await;

        assert!(cache.get_free_ranges().await.is_none());
        assert!(cache.get_owner("c1").await.is_none());
        assert!(cache.get_latest_transfer_date("c1").await.is_none());
        assert!(cache.last_invalidated().is_some());
    }

    #[tokio::test]
    async fn test_absent_and_cached_none_are_distinguishable() {
        let cache = RegistryCache::new();
        assert_eq!(cache.get_latest_transfer_date("c1").await, None);

        cache.put_latest_transfer_date("c1", None).await;
        assert_eq!(cache.get_latest_transfer_date("c1").await, Some(None));
    }
}
