//! Report rows for certificate views

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum CertificateStatus {
    Valid,
    Canceled,
}

impl CertificateStatus {
    pub fn of(canceled_on: Option<NaiveDate>) -> Self {
        if canceled_on.is_none() {
            CertificateStatus::Valid
        } else {
            CertificateStatus::Canceled
        }
    }
}

/// Current owner of a certificate, as derived from the transaction log
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerRef {
    pub id: String,
    pub name: String,
}

/// Row of the certificate list view: live certificates with their padded
/// range title, vote total and current owner
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CertificateListEntry {
    pub id: String,
    pub title: String,
    pub first_share: i64,
    pub last_share: i64,
    pub share_count: i64,
    pub votes: i64,
    pub owner: String,
}

/// Per-class breakdown of the shares bound to one certificate
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShareCompositionRow {
    pub class_name: String,
    pub count: i64,
    pub votes: i64,
}
