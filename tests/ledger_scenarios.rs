//! Scenario tests for the share range ledger
//!
//! Drives the rule functions through an in-memory table model, applying
//! them in the same order the services do, so the full choreography of
//! issue -> bundle -> transfer -> cancel -> re-bundle is exercised
//! without a database.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use shareregistry_backend::entities::transactions;
use shareregistry_backend::error::RegistryError;
use shareregistry_backend::models::share_range::ShareRange;
use shareregistry_backend::services::certificate_binder::{
    check_bundle_range, check_range_free, earliest_bundle_date,
};
use shareregistry_backend::services::ownership_timeline::pick_latest;
use shareregistry_backend::services::range_tracker::consecutive_ranges;
use shareregistry_backend::services::temporal::{check_not_before, check_not_future};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

struct ShareRow {
    id: i64,
    issued_on: NaiveDate,
    is_bound: bool,
}

struct CertRow {
    id: String,
    first_share: i64,
    last_share: i64,
    issued_on: NaiveDate,
    canceled_on: Option<NaiveDate>,
    owner_id: String,
}

/// In-memory stand-in for the four ledger tables
struct Ledger {
    shares: Vec<ShareRow>,
    certs: Vec<CertRow>,
    memberships: Vec<(i64, String)>,
    transfers: Vec<transactions::Model>,
    today: NaiveDate,
}

impl Ledger {
    fn new(today: NaiveDate) -> Self {
        Self {
            shares: Vec::new(),
            certs: Vec::new(),
            memberships: Vec::new(),
            transfers: Vec::new(),
            today,
        }
    }

    fn issue(&mut self, count: i64, issued_on: NaiveDate) {
        let last = self.last_issued();
        for id in last + 1..=last + count {
            self.shares.push(ShareRow {
                id,
                issued_on,
                is_bound: false,
            });
        }
    }

    fn last_issued(&self) -> i64 {
        self.shares.last().map(|s| s.id).unwrap_or(0)
    }

    fn free_ranges(&self) -> Vec<ShareRange> {
        let ids: Vec<i64> = self
            .shares
            .iter()
            .filter(|s| !s.is_bound)
            .map(|s| s.id)
            .collect();
        consecutive_ranges(&ids)
    }

    /// Same checks, in the same order, as CertificateBinder::bundle
    fn bundle(
        &mut self,
        first: i64,
        last: i64,
        owner: &str,
        issued_on: NaiveDate,
    ) -> Result<String, RegistryError> {
        check_bundle_range(first, last, self.last_issued())?;
        check_range_free(first, last, &self.free_ranges())?;

        let upper_issued_on = self
            .shares
            .iter()
            .find(|s| s.id == last)
            .map(|s| s.issued_on)
            .unwrap();
        let latest_closure = self
            .certs
            .iter()
            .filter(|c| {
                self.memberships
                    .iter()
                    .any(|(sid, cid)| *cid == c.id && (first..=last).contains(sid))
            })
            .filter_map(|c| c.canceled_on)
            .max();
        check_not_before(issued_on, earliest_bundle_date(upper_issued_on, latest_closure))?;
        check_not_future(issued_on, self.today)?;

        let id = format!("cert-{}", self.certs.len() + 1);
        for sid in first..=last {
            self.memberships.push((sid, id.clone()));
        }
        for share in self.shares.iter_mut().filter(|s| (first..=last).contains(&s.id)) {
            share.is_bound = true;
        }
        self.certs.push(CertRow {
            id: id.clone(),
            first_share: first,
            last_share: last,
            issued_on,
            canceled_on: None,
            owner_id: owner.to_string(),
        });
        Ok(id)
    }

    /// Same checks, in the same order, as CertificateBinder::cancel
    fn cancel(&mut self, cert_id: &str, canceled_on: NaiveDate) -> Result<(), RegistryError> {
        let cert = self.certs.iter().find(|c| c.id == cert_id).unwrap();
        if cert.canceled_on.is_some() {
            return Err(RegistryError::AlreadyCanceled {
                certificate_id: cert.id.clone(),
            });
        }

        let on_cert: Vec<transactions::Model> = self
            .transfers
            .iter()
            .filter(|t| t.certificate_id == cert_id)
            .cloned()
            .collect();
        let floor = pick_latest(&on_cert)
            .map(|t| t.recorded_on)
            .unwrap_or(cert.issued_on);
        check_not_before(canceled_on, floor)?;
        check_not_future(canceled_on, self.today)?;

        let (first, last) = (cert.first_share, cert.last_share);
        for share in self.shares.iter_mut().filter(|s| (first..=last).contains(&s.id)) {
            share.is_bound = false;
        }
        self.certs
            .iter_mut()
            .find(|c| c.id == cert_id)
            .unwrap()
            .canceled_on = Some(canceled_on);
        Ok(())
    }

    /// Same checks, in the same order, as OwnershipTimeline::record_transfer
    fn record_transfer(
        &mut self,
        cert_id: &str,
        seller: &str,
        buyer: &str,
        price: Decimal,
        recorded_on: NaiveDate,
    ) -> Result<i32, RegistryError> {
        if buyer == seller {
            return Err(RegistryError::SameParty {
                shareholder_id: buyer.to_string(),
            });
        }
        if price < Decimal::ZERO {
            return Err(RegistryError::NegativePrice { price });
        }

        let cert = self.certs.iter().find(|c| c.id == cert_id).unwrap();
        if cert.canceled_on.is_some() {
            return Err(RegistryError::CertificateCanceled {
                certificate_id: cert.id.clone(),
            });
        }

        let on_cert: Vec<transactions::Model> = self
            .transfers
            .iter()
            .filter(|t| t.certificate_id == cert_id)
            .cloned()
            .collect();
        let floor = pick_latest(&on_cert)
            .map(|t| t.recorded_on)
            .unwrap_or(cert.issued_on);
        check_not_before(recorded_on, floor)?;
        check_not_future(recorded_on, self.today)?;

        let share_count = cert.last_share - cert.first_share + 1;
        let id = self.transfers.len() as i32 + 1;
        self.transfers.push(transactions::Model {
            id,
            certificate_id: cert_id.to_string(),
            seller_id: seller.to_string(),
            buyer_id: buyer.to_string(),
            price,
            price_per_share: price / Decimal::from(share_count),
            recorded_on,
            remarks: None,
            created_at: recorded_on.and_hms_opt(0, 0, 0).unwrap(),
        });
        Ok(id)
    }

    fn current_owner(&self, cert_id: &str) -> String {
        let cert = self.certs.iter().find(|c| c.id == cert_id).unwrap();
        let on_cert: Vec<transactions::Model> = self
            .transfers
            .iter()
            .filter(|t| t.certificate_id == cert_id)
            .cloned()
            .collect();
        pick_latest(&on_cert)
            .map(|t| t.buyer_id.clone())
            .unwrap_or_else(|| cert.owner_id.clone())
    }
}

#[test]
fn test_free_ranges_partition_the_unbound_id_space() {
    let mut ledger = Ledger::new(d(2021, 1, 1));
    ledger.issue(100, d(2020, 1, 1));

    ledger.bundle(11, 20, "a", d(2020, 1, 2)).unwrap();
    ledger.bundle(41, 60, "a", d(2020, 1, 2)).unwrap();

    let free = ledger.free_ranges();
    assert_eq!(
        free,
        vec![
            ShareRange::new(1, 10),
            ShareRange::new(21, 40),
            ShareRange::new(61, 100),
        ]
    );

    // maximal, ascending, non-adjacent
    for pair in free.windows(2) {
        assert!(pair[0].last + 1 < pair[1].first);
    }

    // re-merging the output is idempotent
    let expanded: Vec<i64> = free.iter().flat_map(|r| r.first..=r.last).collect();
    assert_eq!(consecutive_ranges(&expanded), free);
}

#[test]
fn test_bind_release_rebind_round_trip() {
    let mut ledger = Ledger::new(d(2021, 1, 1));
    ledger.issue(100, d(2020, 1, 1));

    let c1 = ledger.bundle(1, 50, "a", d(2020, 1, 2)).unwrap();
    ledger.cancel(&c1, d(2020, 1, 10)).unwrap();

    // same range, date on/after the closure: succeeds
    let c2 = ledger.bundle(1, 50, "b", d(2020, 1, 10)).unwrap();
    assert_ne!(c1, c2);
    assert_eq!(ledger.current_owner(&c2), "b");
}

#[test]
fn test_bound_subrange_fails_regardless_of_dates() {
    let mut ledger = Ledger::new(d(2021, 1, 1));
    ledger.issue(100, d(2020, 1, 1));
    ledger.bundle(1, 50, "a", d(2020, 1, 2)).unwrap();

    for date in [d(2020, 1, 2), d(2020, 6, 1), d(2021, 1, 1)] {
        assert!(matches!(
            ledger.bundle(40, 60, "b", date),
            Err(RegistryError::RangeNotFree { first: 40, last: 60 })
        ));
        // fully inside the bound block as well
        assert!(matches!(
            ledger.bundle(10, 20, "b", date),
            Err(RegistryError::RangeNotFree { .. })
        ));
    }
}

#[test]
fn test_current_owner_follows_the_latest_transfer() {
    let mut ledger = Ledger::new(d(2021, 1, 1));
    ledger.issue(100, d(2020, 1, 1));
    let c1 = ledger.bundle(1, 100, "founder", d(2020, 1, 2)).unwrap();

    // zero transactions: the initial owner
    assert_eq!(ledger.current_owner(&c1), "founder");

    ledger
        .record_transfer(&c1, "founder", "alice", dec!(5000.00), d(2020, 2, 1))
        .unwrap();
    ledger
        .record_transfer(&c1, "alice", "bob", dec!(6000.00), d(2020, 3, 1))
        .unwrap();
    assert_eq!(ledger.current_owner(&c1), "bob");

    // same-date transfer: insertion order decides
    ledger
        .record_transfer(&c1, "bob", "carol", dec!(6500.00), d(2020, 3, 1))
        .unwrap();
    assert_eq!(ledger.current_owner(&c1), "carol");
}

#[test]
fn test_rebundle_date_floor_scenario() {
    // Shares 1-100 issued on 2020-01-01
    let mut ledger = Ledger::new(d(2021, 1, 1));
    ledger.issue(100, d(2020, 1, 1));

    // Bundle [1,50] on 2020-01-02: succeeds
    let c1 = ledger.bundle(1, 50, "a", d(2020, 1, 2)).unwrap();

    // Overlapping [40,60] on 2020-01-03: RangeNotFree
    assert!(matches!(
        ledger.bundle(40, 60, "b", d(2020, 1, 3)),
        Err(RegistryError::RangeNotFree { .. })
    ));

    // Cancel C1 on 2020-06-01
    ledger.cancel(&c1, d(2020, 6, 1)).unwrap();

    // Re-bundle dated before the cancellation: DateTooEarly
    let err = ledger.bundle(1, 50, "b", d(2020, 5, 1)).unwrap_err();
    match err {
        RegistryError::DateTooEarly { earliest, .. } => {
            assert_eq!(earliest, d(2020, 6, 1));
        }
        other => panic!("expected DateTooEarly, got {other:?}"),
    }

    // Re-bundle after the cancellation: succeeds
    assert!(ledger.bundle(1, 50, "b", d(2020, 6, 2)).is_ok());
}

#[test]
fn test_transfer_cannot_predate_certificate_issue() {
    let mut ledger = Ledger::new(d(2021, 1, 1));
    ledger.issue(100, d(2020, 1, 1));
    let c2 = ledger.bundle(51, 100, "a", d(2020, 1, 2)).unwrap();

    let err = ledger
        .record_transfer(&c2, "a", "b", dec!(0.00), d(2020, 1, 1))
        .unwrap_err();
    match err {
        RegistryError::DateTooEarly { earliest, .. } => {
            assert_eq!(earliest, d(2020, 1, 2));
        }
        other => panic!("expected DateTooEarly, got {other:?}"),
    }
}

#[test]
fn test_inverted_range_fails_before_any_other_check() {
    let mut ledger = Ledger::new(d(2021, 1, 1));
    ledger.issue(100, d(2020, 1, 1));
    ledger.bundle(1, 50, "a", d(2020, 1, 2)).unwrap();

    // [10,5] overlaps bound shares and the date is absurd, but the range
    // shape is checked first
    assert!(matches!(
        ledger.bundle(10, 5, "b", d(2999, 1, 1)),
        Err(RegistryError::InvalidRange { first: 10, last: 5 })
    ));
}

#[test]
fn test_cancel_guards() {
    let mut ledger = Ledger::new(d(2021, 1, 1));
    ledger.issue(100, d(2020, 1, 1));
    let c1 = ledger.bundle(1, 50, "a", d(2020, 1, 2)).unwrap();
    ledger
        .record_transfer(&c1, "a", "b", dec!(100.00), d(2020, 4, 1))
        .unwrap();

    // cannot cancel before the latest transfer
    assert!(matches!(
        ledger.cancel(&c1, d(2020, 3, 1)),
        Err(RegistryError::DateTooEarly { .. })
    ));
    // nor in the future
    assert!(matches!(
        ledger.cancel(&c1, d(2021, 6, 1)),
        Err(RegistryError::FutureDate { .. })
    ));

    ledger.cancel(&c1, d(2020, 4, 1)).unwrap();
    assert!(matches!(
        ledger.cancel(&c1, d(2020, 5, 1)),
        Err(RegistryError::AlreadyCanceled { .. })
    ));
}

#[test]
fn test_transfer_guards() {
    let mut ledger = Ledger::new(d(2021, 1, 1));
    ledger.issue(100, d(2020, 1, 1));
    let c1 = ledger.bundle(1, 50, "a", d(2020, 1, 2)).unwrap();

    assert!(matches!(
        ledger.record_transfer(&c1, "a", "a", dec!(1.00), d(2020, 2, 1)),
        Err(RegistryError::SameParty { .. })
    ));
    assert!(matches!(
        ledger.record_transfer(&c1, "a", "b", dec!(-1.00), d(2020, 2, 1)),
        Err(RegistryError::NegativePrice { .. })
    ));
    assert!(matches!(
        ledger.record_transfer(&c1, "a", "b", dec!(1.00), d(2021, 2, 1)),
        Err(RegistryError::FutureDate { .. })
    ));

    ledger.cancel(&c1, d(2020, 2, 1)).unwrap();
    assert!(matches!(
        ledger.record_transfer(&c1, "a", "b", dec!(1.00), d(2020, 3, 1)),
        Err(RegistryError::CertificateCanceled { .. })
    ));
}

#[test]
fn test_issuance_extends_the_free_space_at_the_top() {
    let mut ledger = Ledger::new(d(2021, 1, 1));
    ledger.issue(50, d(2020, 1, 1));
    ledger.bundle(1, 50, "a", d(2020, 1, 2)).unwrap();
    assert!(ledger.free_ranges().is_empty());

    // newly issued shares appear as one fresh free range
    ledger.issue(25, d(2020, 7, 1));
    assert_eq!(ledger.free_ranges(), vec![ShareRange::new(51, 75)]);

    // bundling them before their own issue date is rejected
    let err = ledger.bundle(51, 75, "a", d(2020, 6, 1)).unwrap_err();
    match err {
        RegistryError::DateTooEarly { earliest, .. } => {
            assert_eq!(earliest, d(2020, 7, 1));
        }
        other => panic!("expected DateTooEarly, got {other:?}"),
    }
    assert!(ledger.bundle(51, 75, "a", d(2020, 7, 1)).is_ok());
}
