//! Case charges
//!
//! A charge is a billable line item against a case. Charges are immutable
//! once recorded; corrections are made by deleting and re-adding.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{BranchId, CaseId, ChargeId, Money, ServiceId, UserId};

use crate::catalog::ServiceCatalogEntry;
use crate::error::BillingError;

/// Classification of a charge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChargeType {
    Embalming,
    Coldroom,
    Storage,
    #[default]
    Other,
}

impl ChargeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChargeType::Embalming => "EMBALMING",
            ChargeType::Coldroom => "COLDROOM",
            ChargeType::Storage => "STORAGE",
            ChargeType::Other => "OTHER",
        }
    }
}

impl fmt::Display for ChargeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChargeType {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EMBALMING" => Ok(ChargeType::Embalming),
            "COLDROOM" => Ok(ChargeType::Coldroom),
            "STORAGE" => Ok(ChargeType::Storage),
            "OTHER" => Ok(ChargeType::Other),
            other => Err(BillingError::unknown("charge type", other)),
        }
    }
}

/// A billable line item on a case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Charge {
    pub id: ChargeId,
    pub case_id: CaseId,
    pub branch_id: BranchId,
    /// Catalog entry the charge was priced from, if any
    pub service_id: Option<ServiceId>,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Money,
    /// Always `quantity × unit_price`
    pub amount: Money,
    pub charge_type: ChargeType,
    pub applied_on: NaiveDate,
    /// True for charges derived from the catalog at admission
    pub auto_generated: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<UserId>,
}

impl Charge {
    /// Creates a staff-entered charge with quantity 1.
    ///
    /// The description must not be blank. Zero and negative amounts are
    /// accepted (waivers and corrections are entered this way).
    pub fn manual(
        case_id: CaseId,
        branch_id: BranchId,
        description: impl Into<String>,
        amount: Money,
        charge_type: ChargeType,
        applied_on: NaiveDate,
        created_by: UserId,
    ) -> Result<Self, BillingError> {
        let description = description.into().trim().to_string();
        if description.is_empty() {
            return Err(BillingError::MissingField { field: "description" });
        }

        Ok(Self {
            id: ChargeId::new_v7(),
            case_id,
            branch_id,
            service_id: None,
            description,
            quantity: Decimal::ONE,
            unit_price: amount,
            amount,
            charge_type,
            applied_on,
            auto_generated: false,
            created_at: Utc::now(),
            created_by: Some(created_by),
        })
    }

    /// Creates an automatic charge priced from a catalog entry.
    pub fn from_service(
        case_id: CaseId,
        service: &ServiceCatalogEntry,
        charge_type: ChargeType,
        applied_on: NaiveDate,
        created_by: UserId,
    ) -> Self {
        Self {
            id: ChargeId::new_v7(),
            case_id,
            branch_id: service.branch_id,
            service_id: Some(service.id),
            description: service.name.clone(),
            quantity: Decimal::ONE,
            unit_price: service.unit_price,
            amount: service.unit_price,
            charge_type,
            applied_on,
            auto_generated: true,
            created_at: Utc::now(),
            created_by: Some(created_by),
        }
    }

    /// Sets the quantity and recomputes the amount
    pub fn with_quantity(mut self, quantity: Decimal) -> Self {
        self.quantity = quantity;
        self.amount = self.unit_price * quantity;
        self
    }

    /// True if `amount == quantity × unit_price`
    pub fn is_consistent(&self) -> bool {
        self.amount == self.unit_price * self.quantity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn test_manual_charge() {
        let charge = Charge::manual(
            CaseId::new(),
            BranchId::new(),
            "  Transport  ",
            Money::new(dec!(120), Currency::GHS),
            ChargeType::Other,
            today(),
            UserId::new(),
        )
        .unwrap();

        assert_eq!(charge.description, "Transport");
        assert_eq!(charge.quantity, Decimal::ONE);
        assert_eq!(charge.amount, charge.unit_price);
        assert!(!charge.auto_generated);
        assert!(charge.service_id.is_none());
        assert!(charge.is_consistent());
    }

    #[test]
    fn test_manual_charge_requires_description() {
        let result = Charge::manual(
            CaseId::new(),
            BranchId::new(),
            "   ",
            Money::new(dec!(10), Currency::GHS),
            ChargeType::Other,
            today(),
            UserId::new(),
        );
        assert_eq!(
            result.unwrap_err(),
            BillingError::MissingField { field: "description" }
        );
    }

    #[test]
    fn test_with_quantity_keeps_amount_consistent() {
        let charge = Charge::manual(
            CaseId::new(),
            BranchId::new(),
            "Storage",
            Money::new(dec!(30), Currency::GHS),
            ChargeType::Storage,
            today(),
            UserId::new(),
        )
        .unwrap()
        .with_quantity(dec!(4));

        assert_eq!(charge.amount.amount(), dec!(120));
        assert!(charge.is_consistent());
    }

    #[test]
    fn test_charge_type_default_and_wire_names() {
        assert_eq!(ChargeType::default(), ChargeType::Other);
        assert_eq!(
            serde_json::to_string(&ChargeType::Coldroom).unwrap(),
            "\"COLDROOM\""
        );
        assert_eq!("STORAGE".parse::<ChargeType>().unwrap(), ChargeType::Storage);
        assert!("storage".parse::<ChargeType>().is_err());
    }
}
