//! Request/response data transfer objects
//!
//! Request bodies are converted into the domain's request types; the
//! branch and case ids always come from the path.

pub mod branch;
pub mod case;
pub mod billing;

use rust_decimal::Decimal;
use serde::Deserialize;

use domain_case::{parse_age, parse_amount, CaseError};

/// An age sent either as a JSON number or as form text
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AgeInput {
    Whole(i64),
    Text(String),
}

impl AgeInput {
    pub fn resolve(self) -> Result<Option<i64>, CaseError> {
        match self {
            AgeInput::Whole(age) => Ok(Some(age)),
            AgeInput::Text(raw) => Ok(parse_age(&raw)?.map(i64::from)),
        }
    }
}

/// An amount sent either as a JSON number or as form text
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
    Number(Decimal),
    Text(String),
}

impl AmountInput {
    pub fn resolve(self) -> Result<Decimal, CaseError> {
        match self {
            AmountInput::Number(amount) => Ok(amount),
            AmountInput::Text(raw) => parse_amount(&raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_age_input_accepts_number_and_text() {
        let number: AgeInput = serde_json::from_value(json!(54)).unwrap();
        assert_eq!(number.resolve().unwrap(), Some(54));

        let text: AgeInput = serde_json::from_value(json!(" 71 ")).unwrap();
        assert_eq!(text.resolve().unwrap(), Some(71));

        let blank: AgeInput = serde_json::from_value(json!("")).unwrap();
        assert_eq!(blank.resolve().unwrap(), None);

        let junk: AgeInput = serde_json::from_value(json!("old")).unwrap();
        assert!(matches!(junk.resolve(), Err(CaseError::Validation { .. })));
    }

    #[test]
    fn test_amount_input_rejects_non_numeric_text() {
        let number: AmountInput = serde_json::from_value(json!(120.5)).unwrap();
        assert_eq!(number.resolve().unwrap(), dec!(120.5));

        let junk: AmountInput = serde_json::from_value(json!("twelve")).unwrap();
        match junk.resolve() {
            Err(CaseError::Validation { field, .. }) => assert_eq!(field.as_deref(), Some("amount")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
