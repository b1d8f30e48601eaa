//! Case domain errors
//!
//! Every handler returns `Result<_, CaseError>`. Store failures arrive as
//! `PortError` and are translated here.

use thiserror::Error;

use core_kernel::{MoneyError, PortError};
use domain_billing::BillingError;

use crate::case::CaseStatus;

/// Errors that can occur in the case domain
#[derive(Debug, Error)]
pub enum CaseError {
    /// Missing or malformed input
    #[error("{message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// A uniqueness rule was violated
    #[error("{0}")]
    Duplicate(String),

    /// The target is still referenced elsewhere
    #[error("{0}")]
    ReferenceViolation(String),

    /// The operation target does not exist
    #[error("{0}")]
    NotFound(String),

    /// An explicit acknowledgement was not given
    #[error("{0}")]
    ConfirmationRequired(String),

    /// The case is not in a state that allows the action
    #[error("Cannot {action} a case that is {from}")]
    InvalidState {
        from: CaseStatus,
        action: String,
    },

    /// Any other store or numbering failure, with the raw message
    #[error("{0}")]
    Persistence(String),
}

impl CaseError {
    pub fn validation(message: impl Into<String>) -> Self {
        CaseError::Validation {
            message: message.into(),
            field: None,
        }
    }

    pub fn validation_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        CaseError::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        CaseError::NotFound(message.into())
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            CaseError::Validation { .. } => "VALIDATION_ERROR",
            CaseError::Duplicate(_) => "DUPLICATE",
            CaseError::ReferenceViolation(_) => "REFERENCE_VIOLATION",
            CaseError::NotFound(_) => "NOT_FOUND",
            CaseError::ConfirmationRequired(_) => "CONFIRMATION_REQUIRED",
            CaseError::InvalidState { .. } => "INVALID_STATE",
            CaseError::Persistence(_) => "PERSISTENCE_ERROR",
        }
    }

    /// Rewrites a duplicate error with a friendlier message
    pub(crate) fn on_duplicate(self, message: &str) -> Self {
        match self {
            CaseError::Duplicate(_) => CaseError::Duplicate(message.to_string()),
            other => other,
        }
    }
}

impl From<PortError> for CaseError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::Duplicate { message, .. } => CaseError::Duplicate(message),
            PortError::ReferenceViolation { .. } => {
                CaseError::ReferenceViolation("Cannot delete, still referenced".to_string())
            }
            PortError::NotFound { entity_type, id } => {
                CaseError::NotFound(format!("{} not found: {}", entity_type, id))
            }
            PortError::Validation { message, field } => CaseError::Validation { message, field },
            other => CaseError::Persistence(other.to_string()),
        }
    }
}

impl From<BillingError> for CaseError {
    fn from(err: BillingError) -> Self {
        let field = err.field().map(str::to_string);
        CaseError::Validation {
            message: err.to_string(),
            field,
        }
    }
}

impl From<MoneyError> for CaseError {
    fn from(err: MoneyError) -> Self {
        CaseError::validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_error_mapping() {
        assert!(matches!(
            CaseError::from(PortError::duplicate("tag_no")),
            CaseError::Duplicate(_)
        ));
        match CaseError::from(PortError::reference_violation("fk_cases_branch")) {
            CaseError::ReferenceViolation(msg) => assert_eq!(msg, "Cannot delete, still referenced"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            CaseError::from(PortError::not_found("Case", "CASE-1")),
            CaseError::NotFound(_)
        ));
        match CaseError::from(PortError::connection("pool timed out")) {
            CaseError::Persistence(msg) => assert!(msg.contains("pool timed out")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_billing_error_keeps_field() {
        let err = CaseError::from(BillingError::MissingField { field: "description" });
        match err {
            CaseError::Validation { field, .. } => assert_eq!(field.as_deref(), Some("description")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_on_duplicate_rewrites_only_duplicates() {
        let err = CaseError::Duplicate("raw constraint".into()).on_duplicate("Tag number already exists");
        assert_eq!(err.to_string(), "Tag number already exists");

        let err = CaseError::not_found("x").on_duplicate("Tag number already exists");
        assert!(matches!(err, CaseError::NotFound(_)));
    }

    #[test]
    fn test_invalid_state_message() {
        let err = CaseError::InvalidState {
            from: CaseStatus::Discharged,
            action: "discharge".to_string(),
        };
        assert_eq!(err.to_string(), "Cannot discharge a case that is DISCHARGED");
        assert_eq!(err.code(), "INVALID_STATE");
    }
}
