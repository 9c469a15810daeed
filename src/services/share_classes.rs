//! Share class administration and composition reporting
//!
//! Share classes quantify voting rights. Besides plain administration,
//! this service answers how a certificate's shares break down by class,
//! which is what vote totals on the list views are built from.

use std::collections::HashMap;
use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use tracing::info;
use uuid::Uuid;

use crate::entities::{certificate_shares, prelude::*, share_classes, shares};
use crate::error::RegistryError;
use crate::models::certificate::ShareCompositionRow;
use crate::services::registry_cache::{RegistryCache, UnitOfWork};

pub struct ShareClassInput {
    pub name: String,
    pub votes: i32,
    pub remarks: Option<String>,
}

/// Row of the share class list view
#[derive(Clone, Debug)]
pub struct ShareClassListEntry {
    pub id: String,
    pub name: String,
    pub votes: i32,
    pub share_count: i64,
}

pub struct ShareClassService {
    db: DatabaseConnection,
    cache: Arc<RegistryCache>,
}

impl ShareClassService {
    pub fn new(db: DatabaseConnection, cache: Arc<RegistryCache>) -> Self {
        Self { db, cache }
    }

    pub async fn create(
        &self,
        input: ShareClassInput,
    ) -> Result<share_classes::Model, RegistryError> {
        let taken = ShareClasses::find()
            .filter(share_classes::Column::Name.eq(&input.name))
            .count(&self.db)
            .await?;
        if taken > 0 {
            return Err(RegistryError::Duplicate {
                field: "share class name",
                value: input.name,
            });
        }

        let row = share_classes::ActiveModel {
            id: Set(Uuid::new_v4().simple().to_string()),
            name: Set(input.name),
            votes: Set(input.votes),
            remarks: Set(input.remarks),
        };

        let uow = UnitOfWork::new(self.db.clone(), self.cache.clone());
        let created = uow
            .commit(move |txn| Box::pin(async move { Ok(row.insert(txn).await?) }))
            .await?;

        info!(share_class_id = %created.id, name = %created.name, "created share class");
        Ok(created)
    }

    /// All classes sorted by name, with how many shares exist in each.
    pub async fn list(&self) -> Result<Vec<ShareClassListEntry>, RegistryError> {
        let classes = ShareClasses::find()
            .order_by_asc(share_classes::Column::Name)
            .all(&self.db)
            .await?;

        let mut entries = Vec::with_capacity(classes.len());
        for class in classes {
            let share_count = Shares::find()
                .filter(shares::Column::ShareClassId.eq(&class.id))
                .count(&self.db)
                .await? as i64;
            entries.push(ShareClassListEntry {
                id: class.id,
                name: class.name,
                votes: class.votes,
                share_count,
            });
        }
        Ok(entries)
    }

    pub async fn count_shares_in_class(&self, id: &str) -> Result<u64, RegistryError> {
        Ok(Shares::find()
            .filter(shares::Column::ShareClassId.eq(id))
            .count(&self.db)
            .await?)
    }

    /// Quantity and vote sum of the shares bound to a certificate, broken
    /// down by share class and sorted by class name.
    pub async fn composition_for_certificate(
        &self,
        certificate_id: &str,
    ) -> Result<Vec<ShareCompositionRow>, RegistryError> {
        let member_ids: Vec<i64> = CertificateShares::find()
            .select_only()
            .column(certificate_shares::Column::ShareId)
            .filter(certificate_shares::Column::CertificateId.eq(certificate_id))
            .into_tuple()
            .all(&self.db)
            .await?;
        if member_ids.is_empty() {
            return Ok(Vec::new());
        }

        let members = Shares::find()
            .filter(shares::Column::Id.is_in(member_ids))
            .all(&self.db)
            .await?;
        let mut counts: HashMap<String, i64> = HashMap::new();
        for share in &members {
            *counts.entry(share.share_class_id.clone()).or_insert(0) += 1;
        }

        let classes = ShareClasses::find()
            .filter(share_classes::Column::Id.is_in(counts.keys().cloned().collect::<Vec<_>>()))
            .all(&self.db)
            .await?;

        let mut rows: Vec<ShareCompositionRow> = classes
            .into_iter()
            .map(|class| {
                let count = counts.get(&class.id).copied().unwrap_or(0);
                ShareCompositionRow {
                    class_name: class.name,
                    count,
                    votes: count * class.votes as i64,
                }
            })
            .collect();
        rows.sort_by(|a, b| a.class_name.cmp(&b.class_name));
        Ok(rows)
    }
}
