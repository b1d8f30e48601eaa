//! Billing domain errors

use core_kernel::MoneyError;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur in the billing domain
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BillingError {
    /// A required field was blank
    #[error("{field} is required")]
    MissingField { field: &'static str },

    /// Amount must be strictly positive
    #[error("Amount must be greater than zero, got {0}")]
    NonPositiveAmount(Decimal),

    /// Amount text could not be parsed
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Enumerated value not recognised
    #[error("Unknown {kind}: {value}")]
    UnknownVariant { kind: &'static str, value: String },

    /// Monetary arithmetic failed
    #[error(transparent)]
    Money(#[from] MoneyError),
}

impl BillingError {
    pub(crate) fn unknown(kind: &'static str, value: &str) -> Self {
        BillingError::UnknownVariant {
            kind,
            value: value.to_string(),
        }
    }

    /// The input field the error refers to, when there is one
    pub fn field(&self) -> Option<&'static str> {
        match self {
            BillingError::MissingField { field } => Some(field),
            BillingError::NonPositiveAmount(_) | BillingError::InvalidAmount(_) => Some("amount"),
            _ => None,
        }
    }
}
