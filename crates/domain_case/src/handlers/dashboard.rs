//! Branch dashboard
//!
//! Reporting only. Figures are summed from the store-maintained case
//! snapshots, never recomputed from charges.

use serde::Serialize;

use core_kernel::{BranchId, Money};

use crate::case::{CaseQuery, CaseStatus};
use crate::context::RequestContext;
use crate::error::CaseError;

use super::{store_error, CasePorts};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchSummary {
    pub branch_id: BranchId,
    pub total_cases: usize,
    pub in_custody: usize,
    pub discharged: usize,
    pub total_billed: Money,
    pub storage_fees: Money,
    /// Sum of positive balances
    pub outstanding_balance: Money,
}

#[derive(Clone)]
pub struct Dashboard {
    ports: CasePorts,
}

impl Dashboard {
    pub fn new(ports: CasePorts) -> Self {
        Self { ports }
    }

    pub async fn branch_summary(
        &self,
        _ctx: &RequestContext,
        branch_id: BranchId,
    ) -> Result<BranchSummary, CaseError> {
        let cases = self
            .ports
            .store
            .list_cases(branch_id, CaseQuery::default())
            .await
            .map_err(store_error("list_cases"))?;

        let zero = Money::zero(self.ports.settings.currency);
        let mut summary = BranchSummary {
            branch_id,
            total_cases: cases.len(),
            in_custody: 0,
            discharged: 0,
            total_billed: zero,
            storage_fees: zero,
            outstanding_balance: zero,
        };

        for case in &cases {
            match case.status {
                CaseStatus::InCustody => summary.in_custody += 1,
                CaseStatus::Discharged => summary.discharged += 1,
                _ => {}
            }
            let f = &case.financials;
            summary.total_billed = summary.total_billed.checked_add(&f.total_bill)?;
            summary.storage_fees = summary.storage_fees.checked_add(&f.storage_fee)?;
            if f.has_outstanding_balance() {
                summary.outstanding_balance = summary.outstanding_balance.checked_add(&f.balance)?;
            }
        }

        Ok(summary)
    }
}
