//! Input validation helpers
//!
//! Form input arrives as loosely typed text. These helpers turn it into
//! typed values or a field-level `CaseError::Validation`.

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::CaseError;

/// Collects missing required text fields so that a single error can name
/// all of them.
#[derive(Debug, Default)]
pub struct RequiredFields {
    missing: Vec<&'static str>,
}

impl RequiredFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the trimmed value, recording the field as missing if blank
    pub fn text(&mut self, field: &'static str, value: &str) -> String {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.missing.push(field);
        }
        trimmed.to_string()
    }

    /// Records a field that must be present but is not text
    pub fn present<T>(&mut self, field: &'static str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.missing.push(field);
        }
        value
    }

    pub fn missing(&self) -> &[&'static str] {
        &self.missing
    }

    /// Fails if any field was missing
    pub fn finish(self) -> Result<(), CaseError> {
        match self.missing.first() {
            None => Ok(()),
            Some(first) => Err(CaseError::validation_field(
                format!("Missing required fields: {}", self.missing.join(", ")),
                *first,
            )),
        }
    }
}

/// Blank optional text becomes `None`
pub fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Parses an optional age.
///
/// Empty input means "not supplied". Anything else must be a whole,
/// non-negative number.
pub fn parse_age(raw: &str) -> Result<Option<u32>, CaseError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<u32>()
        .map(Some)
        .map_err(|_| CaseError::validation_field("Age must be a non-negative whole number", "age"))
}

/// Parses a monetary amount entered as text.
///
/// Non-numeric input is rejected. Sign checks are left to the caller.
pub fn parse_amount(raw: &str) -> Result<Decimal, CaseError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(CaseError::validation_field("Amount is required", "amount"));
    }
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|_| CaseError::validation_field(format!("Invalid amount: {}", raw), "amount"))
}
