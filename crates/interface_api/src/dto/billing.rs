//! Charge, payment, discharge and catalog DTOs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use core_kernel::{BranchId, CaseId, Money, ServiceId};
use domain_billing::{Allocation, ChargeType, Payment, PaymentMethod, PricingModel, ReceiptNumber};
use domain_case::{
    AddChargeRequest, Case, CaseError, DischargeReceipt, DischargeRequest, PaymentReceipt,
    RecordPaymentRequest, UpsertServiceRequest,
};

use super::AmountInput;

#[derive(Debug, Deserialize)]
pub struct AddChargeBody {
    #[serde(default)]
    pub description: String,
    pub amount: AmountInput,
    pub charge_type: Option<ChargeType>,
}

impl AddChargeBody {
    pub fn into_request(self, branch_id: BranchId, case_id: CaseId) -> Result<AddChargeRequest, CaseError> {
        Ok(AddChargeRequest {
            case_id,
            branch_id,
            description: self.description,
            amount: self.amount.resolve()?,
            charge_type: self.charge_type,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct RecordPaymentBody {
    pub case_id: CaseId,
    pub amount: AmountInput,
    #[serde(default)]
    pub method: PaymentMethod,
    #[serde(default)]
    pub allocation: Allocation,
    pub note: Option<String>,
}

impl RecordPaymentBody {
    pub fn into_request(self, branch_id: BranchId) -> Result<RecordPaymentRequest, CaseError> {
        Ok(RecordPaymentRequest {
            branch_id,
            case_id: self.case_id,
            amount: self.amount.resolve()?,
            method: self.method,
            allocation: self.allocation,
            note: self.note,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub receipt_no: ReceiptNumber,
    pub payment: Payment,
    pub balance: Money,
    pub case: Case,
}

impl From<PaymentReceipt> for PaymentResponse {
    fn from(receipt: PaymentReceipt) -> Self {
        Self {
            receipt_no: receipt.receipt_no,
            payment: receipt.payment,
            balance: receipt.balance,
            case: receipt.case,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DischargeQuery {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DischargeBody {
    pub discharge_date: Option<NaiveDate>,
    pub confirm_payment: bool,
}

impl DischargeBody {
    pub fn into_request(self, branch_id: BranchId, case_id: CaseId) -> DischargeRequest {
        DischargeRequest {
            branch_id,
            case_id,
            discharge_date: self.discharge_date,
            confirm_payment: self.confirm_payment,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DischargeResponse {
    pub receipt_no: ReceiptNumber,
    pub storage_days_preview: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outstanding_balance: Option<Money>,
    pub case: Case,
}

impl From<DischargeReceipt> for DischargeResponse {
    fn from(receipt: DischargeReceipt) -> Self {
        Self {
            receipt_no: receipt.receipt_no,
            storage_days_preview: receipt.storage_days_preview,
            outstanding_balance: receipt.outstanding_balance,
            case: receipt.case,
        }
    }
}

fn active_by_default() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct UpsertServiceBody {
    pub id: Option<ServiceId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub pricing_model: PricingModel,
    pub unit_price: AmountInput,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
}

impl UpsertServiceBody {
    pub fn into_request(self, branch_id: BranchId) -> Result<UpsertServiceRequest, CaseError> {
        Ok(UpsertServiceRequest {
            id: self.id,
            branch_id,
            name: self.name,
            pricing_model: self.pricing_model,
            unit_price: self.unit_price.resolve().map_err(|e| match e {
                CaseError::Validation { message, .. } => CaseError::validation_field(message, "unit_price"),
                other => other,
            })?,
            is_active: self.is_active,
        })
    }
}
