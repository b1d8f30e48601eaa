//! Case Domain - Admissions, charges, payments and discharge
//!
//! This crate holds the case-management core of the mortuary system:
//!
//! - **Admission**: register a deceased person in custody and bill the
//!   branch's embalming and cold-room services
//! - **Charge ledger**: add and delete billable line items
//! - **Payments**: record payments under issued receipt numbers, void them
//! - **Discharge**: close a case with a discharge receipt
//! - **Administration**: branches, service catalog, receipt lookup and a
//!   branch dashboard
//!
//! Persistence, receipt numbering and view invalidation are ports (see
//! [`ports`] and [`invalidation`]). Case totals are maintained by the
//! record store; handlers only read them.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_case::{AdmissionRequest, CasePorts, CaseServices, RequestContext};
//!
//! let services = CaseServices::new(ports);
//! let result = services.admission.admit(&ctx, request).await?;
//! if let Some(warning) = result.charge_warning {
//!     tracing::warn!(%warning, "admitted without initial charges");
//! }
//! ```

pub mod case;
pub mod branch;
pub mod context;
pub mod validation;
pub mod ports;
pub mod invalidation;
pub mod handlers;
pub mod error;

pub use case::{
    Case, CaseDetailsUpdate, CaseQuery, CaseStatus, CaseType, DeceasedInfo, DischargeUpdate,
    FinancialSnapshot, Gender, RelativeInfo,
};
pub use branch::Branch;
pub use context::{BranchScope, RequestContext, Role};
pub use validation::{parse_age, parse_amount};
pub use ports::{ReceiptNumbering, RecordStore};
pub use invalidation::{BroadcastInvalidator, StaleView, TracingInvalidator, ViewInvalidator};
pub use handlers::{
    AddChargeRequest, AdmissionHandler, AdmissionRequest, AdmissionResult, BillingSettings,
    BranchSettings, BranchSummary, CasePorts, CaseRegistry, CaseServices, ChargeLedger,
    CreateBranchRequest, Dashboard, DischargeHandler, DischargePreview, DischargeReceipt,
    DischargeRequest, FoundReceipt, PaymentReceipt, PaymentRecorder, ReceiptLookup,
    RecordPaymentRequest, UpsertServiceRequest,
};
pub use error::CaseError;
