//! Payment recording
//!
//! This module defines payments received against a case balance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{BranchId, CaseId, Money, PaymentId, UserId};

use crate::error::BillingError;
use crate::receipt::ReceiptNumber;

/// Payment method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Cash at the counter
    #[default]
    Cash,
    /// Mobile money
    Momo,
    /// Card
    Card,
    /// Bank transfer or deposit
    Bank,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "CASH",
            PaymentMethod::Momo => "MOMO",
            PaymentMethod::Card => "CARD",
            PaymentMethod::Bank => "BANK",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CASH" => Ok(PaymentMethod::Cash),
            "MOMO" => Ok(PaymentMethod::Momo),
            "CARD" => Ok(PaymentMethod::Card),
            "BANK" => Ok(PaymentMethod::Bank),
            other => Err(BillingError::unknown("payment method", other)),
        }
    }
}

/// What part of the bill a payment is meant for. Informational only; the
/// balance is always reduced as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Allocation {
    Embalming,
    Coldroom,
    Storage,
    #[default]
    General,
}

impl Allocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Allocation::Embalming => "EMBALMING",
            Allocation::Coldroom => "COLDROOM",
            Allocation::Storage => "STORAGE",
            Allocation::General => "GENERAL",
        }
    }
}

impl fmt::Display for Allocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Allocation {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EMBALMING" => Ok(Allocation::Embalming),
            "COLDROOM" => Ok(Allocation::Coldroom),
            "STORAGE" => Ok(Allocation::Storage),
            "GENERAL" => Ok(Allocation::General),
            other => Err(BillingError::unknown("allocation", other)),
        }
    }
}

/// A payment record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    /// Unique identifier
    pub id: PaymentId,
    pub branch_id: BranchId,
    pub case_id: CaseId,
    /// Payment amount, always positive
    pub amount: Money,
    pub method: PaymentMethod,
    pub allocation: Allocation,
    /// Externally issued, unique and immutable
    pub receipt_no: ReceiptNumber,
    /// Staff member who took the payment
    pub received_by: UserId,
    pub note: Option<String>,
    pub paid_on: DateTime<Utc>,
}

impl Payment {
    /// Creates a new payment
    ///
    /// # Errors
    ///
    /// Returns `NonPositiveAmount` unless `amount > 0`.
    pub fn new(
        branch_id: BranchId,
        case_id: CaseId,
        amount: Money,
        method: PaymentMethod,
        allocation: Allocation,
        receipt_no: ReceiptNumber,
        received_by: UserId,
    ) -> Result<Self, BillingError> {
        if !amount.is_positive() {
            return Err(BillingError::NonPositiveAmount(amount.amount()));
        }

        Ok(Self {
            id: PaymentId::new_v7(),
            branch_id,
            case_id,
            amount,
            method,
            allocation,
            receipt_no,
            received_by,
            note: None,
            paid_on: Utc::now(),
        })
    }

    /// Attaches a free-text note; blank notes are dropped
    pub fn with_note(mut self, note: Option<String>) -> Self {
        self.note = note
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        self
    }
}
