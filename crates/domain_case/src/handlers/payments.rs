//! Payment recorder
//!
//! Records payments under externally issued receipt numbers and voids
//! them again.

use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

use core_kernel::{BranchId, CaseId, Money, PaymentId};
use domain_billing::{Allocation, Payment, PaymentMethod, ReceiptNumber, ReceiptType};

use crate::case::Case;
use crate::context::RequestContext;
use crate::error::CaseError;
use crate::invalidation::StaleView;

use super::{store_error, CasePorts};

/// Input for recording a payment
#[derive(Debug, Clone)]
pub struct RecordPaymentRequest {
    pub branch_id: BranchId,
    pub case_id: CaseId,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub allocation: Allocation,
    pub note: Option<String>,
}

/// Result of a recorded payment
#[derive(Debug, Clone)]
pub struct PaymentReceipt {
    pub receipt_no: ReceiptNumber,
    pub payment: Payment,
    /// Balance after the store's recompute
    pub balance: Money,
    pub case: Case,
}

#[derive(Clone)]
pub struct PaymentRecorder {
    ports: CasePorts,
}

impl PaymentRecorder {
    pub fn new(ports: CasePorts) -> Self {
        Self { ports }
    }

    /// Records a payment against a case.
    ///
    /// The amount is checked before anything else, so a rejected amount
    /// never consumes a receipt number.
    ///
    /// # Errors
    ///
    /// - `Validation` unless `amount > 0`
    /// - `NotFound` if the case is not in the branch
    /// - `Persistence` if numbering or the store fails
    #[instrument(skip(self, ctx, request), fields(actor = %ctx.actor, case_id = %request.case_id, amount = %request.amount))]
    pub async fn record_payment(
        &self,
        ctx: &RequestContext,
        request: RecordPaymentRequest,
    ) -> Result<PaymentReceipt, CaseError> {
        if request.amount <= Decimal::ZERO {
            return Err(CaseError::validation_field(
                "Amount must be greater than zero",
                "amount",
            ));
        }

        let case = self
            .ports
            .store
            .get_case(request.branch_id, request.case_id)
            .await
            .map_err(store_error("get_case"))?
            .ok_or_else(|| CaseError::not_found(format!("Case not found: {}", request.case_id)))?;

        let receipt_no = self
            .ports
            .numbering
            .next_number(request.branch_id, ReceiptType::Payment)
            .await
            .map_err(store_error("next_receipt_number"))?;

        let payment = Payment::new(
            request.branch_id,
            request.case_id,
            Money::new(request.amount, self.ports.settings.currency),
            request.method,
            request.allocation,
            receipt_no.clone(),
            ctx.actor,
        )?
        .with_note(request.note);

        let payment = self
            .ports
            .store
            .insert_payment(&payment)
            .await
            .map_err(store_error("insert_payment"))?;

        info!(
            payment_id = %payment.id,
            receipt_no = %receipt_no,
            method = %payment.method,
            "Payment recorded"
        );

        let case = match self.ports.store.get_case(request.branch_id, request.case_id).await {
            Ok(Some(refreshed)) => refreshed,
            Ok(None) | Err(_) => {
                warn!(case_id = %request.case_id, "Could not re-read case after payment");
                case
            }
        };

        self.ports.invalidate(&[
            StaleView::PaymentList { branch_id: request.branch_id },
            StaleView::CaseList { branch_id: request.branch_id },
            StaleView::CaseDetail {
                branch_id: request.branch_id,
                case_id: request.case_id,
            },
            StaleView::Dashboard { branch_id: request.branch_id },
        ]);

        Ok(PaymentReceipt {
            receipt_no,
            payment,
            balance: case.financials.balance,
            case,
        })
    }

    /// Voids (deletes) a payment of the given branch.
    ///
    /// A payment belonging to another branch is reported as `NotFound` and
    /// left untouched.
    #[instrument(skip(self, ctx), fields(actor = %ctx.actor))]
    pub async fn void_payment(
        &self,
        ctx: &RequestContext,
        payment_id: PaymentId,
        branch_id: BranchId,
    ) -> Result<(), CaseError> {
        let case_id = self
            .ports
            .store
            .delete_payment(branch_id, payment_id)
            .await
            .map_err(store_error("delete_payment"))?;

        info!(%payment_id, %branch_id, %case_id, "Payment voided");

        self.ports.invalidate(&[
            StaleView::PaymentList { branch_id },
            StaleView::CaseList { branch_id },
            StaleView::CaseDetail { branch_id, case_id },
            StaleView::Dashboard { branch_id },
        ]);
        Ok(())
    }

    /// Payments of a branch, newest first
    pub async fn list_payments(
        &self,
        _ctx: &RequestContext,
        branch_id: BranchId,
    ) -> Result<Vec<Payment>, CaseError> {
        self.ports
            .store
            .list_payments(branch_id)
            .await
            .map_err(store_error("list_payments"))
    }
}
