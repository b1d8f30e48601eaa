//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating random test data
//! that maintains domain invariants.

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use rust_decimal::Decimal;

use core_kernel::{Currency, Money};
use domain_billing::{Allocation, ChargeType, PaymentMethod};

/// Strategy for generating valid positive amounts in minor units
pub fn positive_amount_minor_strategy() -> impl Strategy<Value = i64> {
    1i64..100_000_000i64
}

/// Strategy for generating positive GHS amounts
pub fn positive_ghs_strategy() -> impl Strategy<Value = Money> {
    positive_amount_minor_strategy().prop_map(|minor| Money::from_minor(minor, Currency::GHS))
}

/// Strategy for generating amounts that a payment must reject
pub fn non_positive_decimal_strategy() -> impl Strategy<Value = Decimal> {
    (-100_000_000i64..=0i64).prop_map(|minor| Decimal::new(minor, 2))
}

/// Strategy for calendar dates between 1970 and ~2080
pub fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (0i64..40_000).prop_map(|offset| {
        NaiveDate::from_ymd_opt(1970, 1, 1).unwrap() + Duration::days(offset)
    })
}

/// Strategy for body tag numbers
pub fn tag_strategy() -> impl Strategy<Value = String> {
    "TAG-[0-9]{1,6}"
}

/// Strategy for text that is blank after trimming
pub fn blank_text_strategy() -> impl Strategy<Value = String> {
    "[ \t]{0,5}"
}

pub fn charge_type_strategy() -> impl Strategy<Value = ChargeType> {
    prop_oneof![
        Just(ChargeType::Embalming),
        Just(ChargeType::Coldroom),
        Just(ChargeType::Storage),
        Just(ChargeType::Other),
    ]
}

pub fn payment_method_strategy() -> impl Strategy<Value = PaymentMethod> {
    prop_oneof![
        Just(PaymentMethod::Cash),
        Just(PaymentMethod::Momo),
        Just(PaymentMethod::Card),
        Just(PaymentMethod::Bank),
    ]
}

pub fn allocation_strategy() -> impl Strategy<Value = Allocation> {
    prop_oneof![
        Just(Allocation::Embalming),
        Just(Allocation::Coldroom),
        Just(Allocation::Storage),
        Just(Allocation::General),
    ]
}
