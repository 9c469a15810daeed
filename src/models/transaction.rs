//! Report rows for transaction views

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Row of the transaction log views: one ownership transfer with resolved
/// party names and the certificate's padded range title
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransferLogEntry {
    pub certificate_id: String,
    pub title: String,
    pub price: Decimal,
    pub recorded_on: NaiveDate,
    pub seller: String,
    pub buyer: String,
}
