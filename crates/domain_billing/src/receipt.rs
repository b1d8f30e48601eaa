//! Receipt types and receipt numbers
//!
//! Receipt numbers are issued by an external numbering service, one
//! sequence per branch and receipt type. Each sequence carries its
//! branch's code in the prefix, so numbers are unique across branches.
//! The billing domain only knows their shape.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BillingError;

/// Kinds of receipt a branch can issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReceiptType {
    Payment,
    Discharge,
    Embalming,
    Coldroom,
}

impl ReceiptType {
    /// Stored value
    pub fn as_str(&self) -> &'static str {
        match self {
            ReceiptType::Payment => "PAYMENT",
            ReceiptType::Discharge => "DISCHARGE",
            ReceiptType::Embalming => "EMBALMING",
            ReceiptType::Coldroom => "COLDROOM",
        }
    }

    /// Prefix of this type's sequence in the branch with the given code,
    /// e.g. `ACC-PAY`
    pub fn branch_prefix(&self, branch_code: &str) -> String {
        format!("{}-{}", branch_code, self.default_prefix())
    }

    /// Type part of a sequence prefix
    pub fn default_prefix(&self) -> &'static str {
        match self {
            ReceiptType::Payment => "PAY",
            ReceiptType::Discharge => "DIS",
            ReceiptType::Embalming => "EMB",
            ReceiptType::Coldroom => "CLD",
        }
    }
}

impl fmt::Display for ReceiptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReceiptType {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PAYMENT" => Ok(ReceiptType::Payment),
            "DISCHARGE" => Ok(ReceiptType::Discharge),
            "EMBALMING" => Ok(ReceiptType::Embalming),
            "COLDROOM" => Ok(ReceiptType::Coldroom),
            other => Err(BillingError::unknown("receipt type", other)),
        }
    }
}

/// An opaque, externally issued receipt number such as `ACC-PAY-000001`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReceiptNumber(String);

impl ReceiptNumber {
    /// Wraps an issued number. Blank numbers are rejected.
    pub fn new(value: impl Into<String>) -> Result<Self, BillingError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(BillingError::MissingField { field: "receipt_no" });
        }
        Ok(Self(value))
    }

    /// Formats a sequence value as `<prefix>-<6 digit number>`
    pub fn format(prefix: &str, sequence: i64) -> Self {
        Self(format!("{}-{:06}", prefix, sequence))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ReceiptNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ReceiptNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
