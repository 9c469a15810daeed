//! Free-range view over the share number space
//!
//! Answers which share numbers are currently free (issued, not canceled,
//! not bound to a live certificate), as maximal runs of consecutive
//! integers. This is a read-only view; mutation happens through the
//! certificate binder and the issuance service.

use std::sync::Arc;

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use tracing::debug;

use crate::entities::{prelude::*, shares};
use crate::error::RegistryError;
use crate::models::share_range::ShareRange;
use crate::services::registry_cache::RegistryCache;

pub struct RangeTracker {
    db: DatabaseConnection,
    cache: Arc<RegistryCache>,
}

impl RangeTracker {
    pub fn new(db: DatabaseConnection, cache: Arc<RegistryCache>) -> Self {
        Self { db, cache }
    }

    /// All maximal runs of consecutive free share numbers, ascending.
    /// A canceled share splits a run the same way a bound one does.
    pub async fn free_ranges(&self) -> Result<Vec<ShareRange>, RegistryError> {
        if let Some(hit) = self.cache.get_free_ranges().await {
            debug!("free_ranges served from cache");
            return Ok(hit);
        }

        let ids: Vec<i64> = Shares::find()
            .select_only()
            .column(shares::Column::Id)
            .filter(shares::Column::IsBound.eq(false))
            .filter(shares::Column::CanceledOn.is_null())
            .order_by_asc(shares::Column::Id)
            .into_tuple()
            .all(&self.db)
            .await?;

        let ranges = consecutive_ranges(&ids);
        self.cache.put_free_ranges(ranges.clone()).await;
        Ok(ranges)
    }

    /// True iff some single free range covers [first, last] entirely.
    /// An inverted range is simply not free, not an error.
    pub async fn is_subrange_free(&self, first: i64, last: i64) -> Result<bool, RegistryError> {
        if first > last {
            return Ok(false);
        }
        let ranges = self.free_ranges().await?;
        Ok(is_within_ranges(first, last, &ranges))
    }

    /// Highest share number issued so far, 0 if none
    pub async fn last_issued_id(&self) -> Result<i64, RegistryError> {
        let newest = Shares::find()
            .order_by_desc(shares::Column::Id)
            .one(&self.db)
            .await?;
        Ok(newest.map(|share| share.id).unwrap_or(0))
    }
}

/// Merge a sorted sequence of ids into maximal runs of consecutive
/// integers. A gap of one or more missing numbers starts a new run.
pub fn consecutive_ranges(ids: &[i64]) -> Vec<ShareRange> {
    let mut ranges = Vec::new();
    let mut iter = ids.iter().copied();
    let Some(head) = iter.next() else {
        return ranges;
    };

    let mut first = head;
    let mut prev = head;
    for n in iter {
        if n != prev + 1 {
            ranges.push(ShareRange::new(first, prev));
            first = n;
        }
        prev = n;
    }
    ranges.push(ShareRange::new(first, prev));
    ranges
}

/// True iff [first, last] lies entirely within one of the given ranges
pub fn is_within_ranges(first: i64, last: i64, ranges: &[ShareRange]) -> bool {
    ranges.iter().any(|r| r.contains(first, last))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_yields_no_ranges() {
        assert!(consecutive_ranges(&[]).is_empty());
    }

    #[test]
    fn test_single_id_is_a_degenerate_range() {
        assert_eq!(consecutive_ranges(&[5]), vec![ShareRange::new(5, 5)]);
    }

    #[test]
    fn test_gaps_split_runs() {
        let ids = [1, 2, 3, 7, 8, 10];
        assert_eq!(
            consecutive_ranges(&ids),
            vec![
                ShareRange::new(1, 3),
                ShareRange::new(7, 8),
                ShareRange::new(10, 10),
            ]
        );
    }

    #[test]
    fn test_output_ranges_are_ascending_and_non_adjacent() {
        let ids = [2, 3, 4, 6, 9, 10, 11, 12, 20];
        let ranges = consecutive_ranges(&ids);
        for pair in ranges.windows(2) {
            // a gap of at least one id between consecutive ranges
            assert!(pair[0].last + 1 < pair[1].first);
        }
    }

    #[test]
    fn test_remerging_own_output_is_idempotent() {
        let ids = [1, 2, 3, 7, 8, 10, 15, 16, 17, 18, 40];
        let ranges = consecutive_ranges(&ids);

        let expanded: Vec<i64> = ranges.iter().flat_map(|r| r.first..=r.last).collect();
        assert_eq!(consecutive_ranges(&expanded), ranges);
    }

    #[test]
    fn test_containment_needs_a_single_covering_range() {
        let free = vec![ShareRange::new(1, 10), ShareRange::new(12, 20)];
        assert!(is_within_ranges(1, 10, &free));
        assert!(is_within_ranges(13, 17, &free));
        // spans the gap at 11 even though both endpoints are free
        assert!(!is_within_ranges(8, 14, &free));
        assert!(!is_within_ranges(21, 25, &free));
    }
}
