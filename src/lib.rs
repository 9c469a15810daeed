// src/lib.rs

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use services::certificate_binder::CertificateBinder;
use services::ownership_timeline::OwnershipTimeline;
use services::range_tracker::RangeTracker;
use services::registry_cache::RegistryCache;
use services::share_classes::ShareClassService;
use services::share_issuance::ShareIssuance;
use services::shareholder_directory::ShareholderDirectory;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub cache: Arc<RegistryCache>,
}

impl AppState {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            cache: Arc::new(RegistryCache::new()),
        }
    }

    pub fn range_tracker(&self) -> RangeTracker {
        RangeTracker::new(self.db.clone(), self.cache.clone())
    }

    pub fn certificate_binder(&self) -> CertificateBinder {
        CertificateBinder::new(self.db.clone(), self.cache.clone())
    }

    pub fn ownership_timeline(&self) -> OwnershipTimeline {
        OwnershipTimeline::new(self.db.clone(), self.cache.clone())
    }

    pub fn share_issuance(&self) -> ShareIssuance {
        ShareIssuance::new(self.db.clone(), self.cache.clone())
    }

    pub fn shareholder_directory(&self) -> ShareholderDirectory {
        ShareholderDirectory::new(self.db.clone(), self.cache.clone())
    }

    pub fn share_classes(&self) -> ShareClassService {
        ShareClassService::new(self.db.clone(), self.cache.clone())
    }
}

pub mod entities {
    pub mod prelude;

    pub mod certificate_shares;
    pub mod certificates;
    pub mod share_classes;
    pub mod shareholders;
    pub mod shares;
    pub mod transactions;
}

pub mod services {
    pub mod certificate_binder;
    pub mod ownership_timeline;
    pub mod range_tracker;
    pub mod registry_cache;
    pub mod share_classes;
    pub mod share_issuance;
    pub mod shareholder_directory;
    pub mod temporal;
}

pub mod error;
pub mod models;
