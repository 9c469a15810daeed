//! Shared date guards for the ledger services
//!
//! Every mutating operation in the registry is constrained the same way:
//! its date must not precede some floor set by earlier events and must
//! not lie in the future. The floor check always runs first, so a caller
//! giving a date that is both too early and in the future sees
//! DateTooEarly.

use chrono::{NaiveDate, Utc};

use crate::error::RegistryError;

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Fails with DateTooEarly when `given` precedes `earliest`
pub fn check_not_before(given: NaiveDate, earliest: NaiveDate) -> Result<(), RegistryError> {
    if given < earliest {
        return Err(RegistryError::DateTooEarly { given, earliest });
    }
    Ok(())
}

/// Fails with FutureDate when `given` is after `today`
pub fn check_not_future(given: NaiveDate, today: NaiveDate) -> Result<(), RegistryError> {
    if given > today {
        return Err(RegistryError::FutureDate { given });
    }
    Ok(())
}
