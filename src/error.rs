//! Typed failure kinds for the registry core
//!
//! Every business-rule violation is deterministic given the same inputs
//! and database state, so callers can map each kind to a message without
//! any retry logic. Storage failures are a separate kind and are never
//! swallowed.

use chrono::NaiveDate;
use sea_orm::{DbErr, TransactionError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    /// The share range is malformed or runs past the issued shares
    #[error("share range {first}-{last} is not valid")]
    InvalidRange { first: i64, last: i64 },

    /// One or more shares in the range belong to a live certificate
    #[error("one or more shares in {first}-{last} are already bound to a certificate")]
    RangeNotFree { first: i64, last: i64 },

    /// The date precedes a floor set by earlier events
    #[error("{given} is too early; earliest possible date is {earliest}")]
    DateTooEarly { given: NaiveDate, earliest: NaiveDate },

    #[error("{given} is in the future")]
    FutureDate { given: NaiveDate },

    /// Cancel was called on a certificate that is already canceled
    #[error("certificate {certificate_id} has already been canceled")]
    AlreadyCanceled { certificate_id: String },

    /// A transfer was attempted on a canceled certificate
    #[error("certificate {certificate_id} is canceled")]
    CertificateCanceled { certificate_id: String },

    #[error("buyer and seller cannot be the same shareholder ({shareholder_id})")]
    SameParty { shareholder_id: String },

    #[error("transaction price {price} is negative")]
    NegativePrice { price: rust_decimal::Decimal },

    #[error("{entity} {id} does not exist")]
    NotFound { entity: &'static str, id: String },

    #[error("{field} '{value}' is already in use")]
    Duplicate { field: &'static str, value: String },

    /// Value is neither a DDMMYY date of birth nor a full Finnish HETU
    #[error("'{value}' is not a valid national identification number")]
    InvalidNin { value: String },

    #[error("storage error: {0}")]
    Storage(#[from] DbErr),
}

impl From<TransactionError<RegistryError>> for RegistryError {
    fn from(err: TransactionError<RegistryError>) -> Self {
        match err {
            TransactionError::Connection(e) => RegistryError::Storage(e),
            TransactionError::Transaction(e) => e,
        }
    }
}
