//! Custom Test Assertions
//!
//! Provides specialized assertion helpers for domain types that give
//! more meaningful error messages than standard assertions.

use rust_decimal::Decimal;

use core_kernel::Money;
use domain_case::{Case, CaseError};

/// Asserts that a Money value has exactly the expected amount
pub fn assert_money_eq(actual: &Money, expected: Decimal) {
    assert_eq!(
        actual.amount(),
        expected,
        "Money mismatch: actual={}, expected={} {}",
        actual,
        actual.currency().symbol(),
        expected
    );
}

/// Asserts that a Money value is positive
pub fn assert_money_positive(money: &Money) {
    assert!(
        money.is_positive(),
        "Expected positive money, got {}",
        money
    );
}

/// Asserts that a Money value is zero
pub fn assert_money_zero(money: &Money) {
    assert!(money.is_zero(), "Expected zero money, got {}", money);
}

/// Asserts the case snapshot satisfies `balance = total_bill - total_paid`
pub fn assert_financials_consistent(case: &Case) {
    let f = &case.financials;
    assert!(
        f.is_consistent(),
        "Inconsistent financials on {}: bill={}, paid={}, balance={}",
        case.id,
        f.total_bill,
        f.total_paid,
        f.balance
    );
}

/// Asserts a validation error, optionally naming the field
pub fn assert_validation_error<T: std::fmt::Debug>(result: Result<T, CaseError>, expected_field: Option<&str>) {
    match result {
        Err(CaseError::Validation { field, message }) => {
            if let Some(expected) = expected_field {
                assert_eq!(
                    field.as_deref(),
                    Some(expected),
                    "Validation error on wrong field: {}",
                    message
                );
            }
        }
        other => panic!("Expected validation error, got {:?}", other),
    }
}

/// Asserts a duplicate error with the given message
pub fn assert_duplicate_error<T: std::fmt::Debug>(result: Result<T, CaseError>, expected_message: &str) {
    match result {
        Err(CaseError::Duplicate(message)) => assert_eq!(message, expected_message),
        other => panic!("Expected duplicate error, got {:?}", other),
    }
}

/// Asserts a not-found error
pub fn assert_not_found<T: std::fmt::Debug>(result: Result<T, CaseError>) {
    assert!(
        matches!(result, Err(CaseError::NotFound(_))),
        "Expected not found, got {:?}",
        result
    );
}
