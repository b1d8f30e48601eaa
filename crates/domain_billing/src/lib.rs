//! Billing Domain - Case charges, service catalog and payments
//!
//! This crate holds the billing vocabulary of the mortuary core. It does
//! not compute balances: totals are maintained by the record store after
//! every charge or payment mutation.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_billing::{derive_initial_charges, ServiceCatalogEntry};
//!
//! let charges = derive_initial_charges(&catalog, case_id, admission_date, actor);
//! store.insert_charges(&charges).await?;
//! ```

pub mod charge;
pub mod catalog;
pub mod payment;
pub mod receipt;
pub mod error;

pub use charge::{Charge, ChargeType};
pub use catalog::{derive_initial_charges, PricingModel, ServiceCatalogEntry, INITIAL_CHARGE_RULES};
pub use payment::{Allocation, Payment, PaymentMethod};
pub use receipt::{ReceiptNumber, ReceiptType};
pub use error::BillingError;
