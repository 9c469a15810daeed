pub use super::certificate_shares::Entity as CertificateShares;
pub use super::certificates::Entity as Certificates;
pub use super::share_classes::Entity as ShareClasses;
pub use super::shareholders::Entity as Shareholders;
pub use super::shares::Entity as Shares;
pub use super::transactions::Entity as Transactions;
