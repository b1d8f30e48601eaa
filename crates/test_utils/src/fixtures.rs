//! Pre-built Test Fixtures
//!
//! Provides ready-to-use test data for common entities across the mortuary
//! system. These fixtures are designed to be consistent and predictable.

use chrono::{NaiveDate, NaiveTime};
use fake::faker::name::en::Name;
use fake::faker::phone_number::en::PhoneNumber;
use fake::Fake;
use once_cell::sync::Lazy;
use rust_decimal_macros::dec;

use core_kernel::{BranchId, Currency, Money, Timezone};
use domain_billing::{PricingModel, ServiceCatalogEntry};
use domain_case::Branch;

/// Timezone used by every fixture
pub static FIXTURE_TIMEZONE: Lazy<Timezone> = Lazy::new(Timezone::default);

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    pub fn ghs(amount: rust_decimal::Decimal) -> Money {
        Money::new(amount, Currency::GHS)
    }

    /// Standard embalming price
    pub fn embalming_price() -> Money {
        Self::ghs(dec!(500.00))
    }

    /// Standard cold-room daily rate
    pub fn coldroom_rate() -> Money {
        Self::ghs(dec!(30.00))
    }

    pub fn ghs_zero() -> Money {
        Money::zero(Currency::GHS)
    }

    /// A USD amount for currency mismatch tests
    pub fn usd_100() -> Money {
        Money::new(dec!(100.00), Currency::USD)
    }
}

/// Fixture for calendar data
pub struct DateFixtures;

impl DateFixtures {
    /// Standard admission date (Jan 1, 2024)
    pub fn admission_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    pub fn admission_time() -> NaiveTime {
        NaiveTime::from_hms_opt(14, 30, 0).unwrap()
    }

    /// Ten days after admission
    pub fn discharge_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 11).unwrap()
    }
}

/// Fixture for branches
pub struct BranchFixtures;

impl BranchFixtures {
    pub fn accra() -> Branch {
        Branch::new("Accra Central", "ACC", Some("Ring Road".to_string()), None).unwrap()
    }

    pub fn kumasi() -> Branch {
        Branch::new("Kumasi", "KSI", None, None).unwrap()
    }

    pub fn with_code(code: &str) -> Branch {
        Branch::new(&format!("Branch {}", code), code, None, None).unwrap()
    }
}

/// Fixture for service catalogs
pub struct CatalogFixtures;

impl CatalogFixtures {
    /// Embalming 500.00 FLAT and Coldroom 30.00 PER_DAY
    pub fn standard(branch_id: BranchId) -> Vec<ServiceCatalogEntry> {
        vec![
            ServiceCatalogEntry::new(
                branch_id,
                "Embalming",
                PricingModel::Flat,
                MoneyFixtures::embalming_price(),
            )
            .unwrap(),
            ServiceCatalogEntry::new(
                branch_id,
                "Coldroom",
                PricingModel::PerDay,
                MoneyFixtures::coldroom_rate(),
            )
            .unwrap(),
        ]
    }

    /// Services that match neither initial-charge keyword
    pub fn unrelated(branch_id: BranchId) -> Vec<ServiceCatalogEntry> {
        vec![
            ServiceCatalogEntry::new(branch_id, "Hearse hire", PricingModel::Manual, MoneyFixtures::ghs(dec!(250)))
                .unwrap(),
            ServiceCatalogEntry::new(branch_id, "Body dressing", PricingModel::Flat, MoneyFixtures::ghs(dec!(120)))
                .unwrap(),
        ]
    }
}

/// Fixture for people
pub struct PersonFixtures;

impl PersonFixtures {
    pub fn deceased_name() -> String {
        Name().fake()
    }

    pub fn relative_name() -> String {
        Name().fake()
    }

    pub fn phone() -> String {
        PhoneNumber().fake()
    }
}
