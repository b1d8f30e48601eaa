//! Discharge handler
//!
//! Closes a case: `IN_CUSTODY --discharge--> DISCHARGED`. The storage-day
//! count computed here is a preview; the store's value is authoritative
//! and is re-read after the update.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, instrument, warn};

use core_kernel::{storage_days_between, BranchId, CaseId, Money};
use domain_billing::{ReceiptNumber, ReceiptType};

use crate::case::{Case, CaseStatus, DischargeUpdate};
use crate::context::RequestContext;
use crate::error::CaseError;
use crate::invalidation::StaleView;

use super::{store_error, CasePorts};

/// Figures shown before a discharge is confirmed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DischargePreview {
    pub case_id: CaseId,
    pub discharge_date: NaiveDate,
    pub storage_days: u32,
    pub total_bill: Money,
    pub total_paid: Money,
    pub balance: Money,
    pub balance_outstanding: bool,
}

/// Input for a discharge
#[derive(Debug, Clone)]
pub struct DischargeRequest {
    pub branch_id: BranchId,
    pub case_id: CaseId,
    /// Defaults to today in the branch timezone
    pub discharge_date: Option<NaiveDate>,
    /// Staff acknowledgement; also overrides an outstanding balance
    pub confirm_payment: bool,
}

/// Result of a discharge
#[derive(Debug, Clone)]
pub struct DischargeReceipt {
    pub receipt_no: ReceiptNumber,
    /// Locally computed, advisory
    pub storage_days_preview: u32,
    /// Balance still owed at the time of discharge, if any
    pub outstanding_balance: Option<Money>,
    /// The case as re-read after the update
    pub case: Case,
}

#[derive(Clone)]
pub struct DischargeHandler {
    ports: CasePorts,
}

impl DischargeHandler {
    pub fn new(ports: CasePorts) -> Self {
        Self { ports }
    }

    /// Storage days and balance for a prospective discharge. Read-only.
    #[instrument(skip(self, _ctx))]
    pub async fn preview_discharge(
        &self,
        _ctx: &RequestContext,
        branch_id: BranchId,
        case_id: CaseId,
        discharge_date: Option<NaiveDate>,
    ) -> Result<DischargePreview, CaseError> {
        let case = self.load_case(branch_id, case_id).await?;
        let discharge_date = discharge_date.unwrap_or_else(|| self.ports.settings.timezone.today());
        let f = case.financials;

        Ok(DischargePreview {
            case_id,
            discharge_date,
            storage_days: storage_days_between(case.admission_date, discharge_date),
            total_bill: f.total_bill,
            total_paid: f.total_paid,
            balance: f.balance,
            balance_outstanding: f.has_outstanding_balance(),
        })
    }

    /// Discharges a case.
    ///
    /// # Errors
    ///
    /// - `ConfirmationRequired` if `confirm_payment` is false
    /// - `NotFound` if the case is not in the branch
    /// - `InvalidState` unless the case is `IN_CUSTODY`
    /// - `Persistence` if numbering or the update fails
    #[instrument(skip(self, ctx, request), fields(actor = %ctx.actor, case_id = %request.case_id))]
    pub async fn discharge(
        &self,
        ctx: &RequestContext,
        request: DischargeRequest,
    ) -> Result<DischargeReceipt, CaseError> {
        if !request.confirm_payment {
            return Err(CaseError::ConfirmationRequired(
                "Please confirm that payment has been settled before discharge".to_string(),
            ));
        }

        let case = self.load_case(request.branch_id, request.case_id).await?;
        case.ensure_transition(CaseStatus::Discharged, "discharge")?;

        let discharge_date = request
            .discharge_date
            .unwrap_or_else(|| self.ports.settings.timezone.today());
        let storage_days_preview = storage_days_between(case.admission_date, discharge_date);

        let outstanding_balance = if case.financials.has_outstanding_balance() {
            warn!(
                case_id = %case.id,
                balance = %case.financials.balance,
                "Discharging with outstanding balance"
            );
            Some(case.financials.balance)
        } else {
            None
        };

        let receipt_no = self
            .ports
            .numbering
            .next_number(request.branch_id, ReceiptType::Discharge)
            .await
            .map_err(store_error("next_receipt_number"))?;

        let discharged = self
            .ports
            .store
            .mark_discharged(
                request.branch_id,
                request.case_id,
                &DischargeUpdate {
                    discharge_date,
                    receipt_no: receipt_no.clone(),
                },
            )
            .await;

        let updated = match discharged {
            Ok(case) => case,
            // Another discharge committed between the read and the update.
            Err(err) if err.is_conflict() => {
                let current = self.load_case(request.branch_id, request.case_id).await?;
                warn!(
                    case_id = %request.case_id,
                    unused_receipt_no = %receipt_no,
                    status = %current.status,
                    "Case left custody during discharge"
                );
                return Err(CaseError::InvalidState {
                    from: current.status,
                    action: "discharge".to_string(),
                });
            }
            Err(err) => return Err(store_error("mark_discharged")(err)),
        };

        info!(
            case_id = %request.case_id,
            receipt_no = %receipt_no,
            storage_days = storage_days_preview,
            "Case discharged"
        );

        let case = match self.ports.store.get_case(request.branch_id, request.case_id).await {
            Ok(Some(fresh)) => fresh,
            _ => updated,
        };

        self.ports.invalidate(&[
            StaleView::CaseDetail {
                branch_id: request.branch_id,
                case_id: request.case_id,
            },
            StaleView::CaseList { branch_id: request.branch_id },
            StaleView::Dashboard { branch_id: request.branch_id },
        ]);

        Ok(DischargeReceipt {
            receipt_no,
            storage_days_preview,
            outstanding_balance,
            case,
        })
    }

    async fn load_case(&self, branch_id: BranchId, case_id: CaseId) -> Result<Case, CaseError> {
        self.ports
            .store
            .get_case(branch_id, case_id)
            .await
            .map_err(store_error("get_case"))?
            .ok_or_else(|| CaseError::not_found(format!("Case not found: {}", case_id)))
    }
}
