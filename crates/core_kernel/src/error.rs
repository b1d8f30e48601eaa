//! Kernel-level errors
//!
//! Wraps the failures of the kernel's value types so that startup code
//! can report them through one type.

use thiserror::Error;

use crate::money::MoneyError;
use crate::temporal::TemporalError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Money error: {0}")]
    Money(#[from] MoneyError),

    #[error("Temporal error: {0}")]
    Temporal(#[from] TemporalError),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(#[from] uuid::Error),

    /// A setting is missing or unusable
    #[error("Configuration error: {setting}: {reason}")]
    Configuration { setting: String, reason: String },
}

impl CoreError {
    pub fn configuration(setting: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::Configuration {
            setting: setting.into(),
            reason: reason.into(),
        }
    }
}
