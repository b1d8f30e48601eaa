//! Case handlers
//!
//! Each handler is a thin sequence of awaited port calls. Handlers hold
//! no locks and never retry; serialisation (unique tags, unique receipt
//! numbers, financial recompute) is provided by the ports.

pub mod admission;
pub mod ledger;
pub mod payments;
pub mod discharge;
pub mod registry;
pub mod settings;
pub mod receipts;
pub mod dashboard;

use std::sync::Arc;
use tracing::error;

use core_kernel::{Currency, PortError, Timezone};

use crate::error::CaseError;
use crate::invalidation::{StaleView, ViewInvalidator};
use crate::ports::{ReceiptNumbering, RecordStore};

pub use admission::{AdmissionHandler, AdmissionRequest, AdmissionResult};
pub use ledger::{AddChargeRequest, ChargeLedger};
pub use payments::{PaymentReceipt, PaymentRecorder, RecordPaymentRequest};
pub use discharge::{DischargeHandler, DischargePreview, DischargeReceipt, DischargeRequest};
pub use registry::CaseRegistry;
pub use settings::{BranchSettings, CreateBranchRequest, UpsertServiceRequest};
pub use receipts::{FoundReceipt, ReceiptLookup};
pub use dashboard::{BranchSummary, Dashboard};

/// Organisation-wide billing settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BillingSettings {
    /// Currency every amount is recorded in
    pub currency: Currency,
    /// Calendar used for "today"
    pub timezone: Timezone,
}

/// The collaborators every handler needs
#[derive(Clone)]
pub struct CasePorts {
    pub store: Arc<dyn RecordStore>,
    pub numbering: Arc<dyn ReceiptNumbering>,
    pub invalidator: Arc<dyn ViewInvalidator>,
    pub settings: BillingSettings,
}

impl CasePorts {
    pub fn new(
        store: Arc<dyn RecordStore>,
        numbering: Arc<dyn ReceiptNumbering>,
        invalidator: Arc<dyn ViewInvalidator>,
        settings: BillingSettings,
    ) -> Self {
        Self {
            store,
            numbering,
            invalidator,
            settings,
        }
    }

    pub(crate) fn invalidate(&self, views: &[StaleView]) {
        self.invalidator.invalidate(views);
    }
}

/// All handlers, sharing one set of ports
#[derive(Clone)]
pub struct CaseServices {
    pub admission: AdmissionHandler,
    pub ledger: ChargeLedger,
    pub payments: PaymentRecorder,
    pub discharge: DischargeHandler,
    pub registry: CaseRegistry,
    pub settings: BranchSettings,
    pub receipts: ReceiptLookup,
    pub dashboard: Dashboard,
}

impl CaseServices {
    pub fn new(ports: CasePorts) -> Self {
        Self {
            admission: AdmissionHandler::new(ports.clone()),
            ledger: ChargeLedger::new(ports.clone()),
            payments: PaymentRecorder::new(ports.clone()),
            discharge: DischargeHandler::new(ports.clone()),
            registry: CaseRegistry::new(ports.clone()),
            settings: BranchSettings::new(ports.clone()),
            receipts: ReceiptLookup::new(ports.clone()),
            dashboard: Dashboard::new(ports),
        }
    }
}

/// Translates a port failure, logging anything that is not a plain
/// constraint or lookup failure.
pub(crate) fn store_error(operation: &'static str) -> impl Fn(PortError) -> CaseError {
    move |err| {
        let mapped = CaseError::from(err);
        if let CaseError::Persistence(message) = &mapped {
            error!(operation, error = %message, "Store operation failed");
        }
        mapped
    }
}
