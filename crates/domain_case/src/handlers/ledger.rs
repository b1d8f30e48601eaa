//! Charge ledger
//!
//! Staff-entered charges against a case. Totals are recomputed by the
//! store after every insert or delete.

use rust_decimal::Decimal;
use tracing::{info, instrument};

use core_kernel::{BranchId, CaseId, ChargeId, Money};
use domain_billing::{Charge, ChargeType};

use crate::context::RequestContext;
use crate::error::CaseError;
use crate::invalidation::StaleView;

use super::{store_error, CasePorts};

/// Input for a manual charge
#[derive(Debug, Clone)]
pub struct AddChargeRequest {
    pub case_id: CaseId,
    pub branch_id: BranchId,
    pub description: String,
    pub amount: Decimal,
    /// `OTHER` when not given
    pub charge_type: Option<ChargeType>,
}

#[derive(Clone)]
pub struct ChargeLedger {
    ports: CasePorts,
}

impl ChargeLedger {
    pub fn new(ports: CasePorts) -> Self {
        Self { ports }
    }

    /// Adds a manual charge dated today (branch timezone).
    #[instrument(skip(self, ctx, request), fields(actor = %ctx.actor, case_id = %request.case_id))]
    pub async fn add_charge(
        &self,
        ctx: &RequestContext,
        request: AddChargeRequest,
    ) -> Result<Charge, CaseError> {
        let charge = Charge::manual(
            request.case_id,
            request.branch_id,
            request.description,
            Money::new(request.amount, self.ports.settings.currency),
            request.charge_type.unwrap_or_default(),
            self.ports.settings.timezone.today(),
            ctx.actor,
        )?;

        self.ports
            .store
            .get_case(request.branch_id, request.case_id)
            .await
            .map_err(store_error("get_case"))?
            .ok_or_else(|| CaseError::not_found(format!("Case not found: {}", request.case_id)))?;

        let mut inserted = self
            .ports
            .store
            .insert_charges(std::slice::from_ref(&charge))
            .await
            .map_err(store_error("insert_charges"))?;
        let charge = inserted.pop().unwrap_or(charge);

        info!(charge_id = %charge.id, amount = %charge.amount, charge_type = %charge.charge_type, "Charge added");

        self.ports.invalidate(&[StaleView::CaseDetail {
            branch_id: request.branch_id,
            case_id: request.case_id,
        }]);

        Ok(charge)
    }

    /// Deletes a charge of the given case and branch. The owning case is
    /// never touched apart from the store's recompute.
    #[instrument(skip(self, ctx), fields(actor = %ctx.actor))]
    pub async fn delete_charge(
        &self,
        ctx: &RequestContext,
        charge_id: ChargeId,
        case_id: CaseId,
        branch_id: BranchId,
    ) -> Result<(), CaseError> {
        self.ports
            .store
            .delete_charge(branch_id, case_id, charge_id)
            .await
            .map_err(store_error("delete_charge"))?;

        info!(%charge_id, %case_id, "Charge deleted");

        self.ports.invalidate(&[
            StaleView::CaseDetail { branch_id, case_id },
            StaleView::CaseList { branch_id },
            StaleView::Dashboard { branch_id },
        ]);
        Ok(())
    }

    /// Charges of a case in applied/creation order
    pub async fn list_charges(
        &self,
        _ctx: &RequestContext,
        branch_id: BranchId,
        case_id: CaseId,
    ) -> Result<Vec<Charge>, CaseError> {
        self.ports
            .store
            .list_charges(branch_id, case_id)
            .await
            .map_err(store_error("list_charges"))
    }
}
