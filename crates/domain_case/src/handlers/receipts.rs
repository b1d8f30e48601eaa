//! Receipt lookup
//!
//! A receipt number is either a payment receipt or a discharge clearance.
//! Payments are searched first.

use serde::Serialize;

use core_kernel::BranchId;
use domain_billing::{Payment, ReceiptNumber};

use crate::case::Case;
use crate::context::RequestContext;
use crate::error::CaseError;

use super::{store_error, CasePorts};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FoundReceipt {
    Payment {
        payment: Payment,
        case: Option<Case>,
    },
    Discharge {
        case: Case,
    },
}

#[derive(Clone)]
pub struct ReceiptLookup {
    ports: CasePorts,
}

impl ReceiptLookup {
    pub fn new(ports: CasePorts) -> Self {
        Self { ports }
    }

    pub async fn find_receipt(
        &self,
        _ctx: &RequestContext,
        branch_id: BranchId,
        receipt_no: &str,
    ) -> Result<FoundReceipt, CaseError> {
        let receipt_no = ReceiptNumber::new(receipt_no.trim())?;
        let store = &self.ports.store;

        if let Some(payment) = store
            .find_payment_by_receipt(branch_id, &receipt_no)
            .await
            .map_err(store_error("find_payment_by_receipt"))?
        {
            let case = store
                .get_case(branch_id, payment.case_id)
                .await
                .map_err(store_error("get_case"))?;
            return Ok(FoundReceipt::Payment { payment, case });
        }

        store
            .find_case_by_discharge_receipt(branch_id, &receipt_no)
            .await
            .map_err(store_error("find_case_by_discharge_receipt"))?
            .map(|case| FoundReceipt::Discharge { case })
            .ok_or_else(|| CaseError::not_found(format!("Receipt not found: {}", receipt_no)))
    }
}
