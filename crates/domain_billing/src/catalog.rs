//! Branch service catalog and initial-charge derivation
//!
//! Each branch keeps its own price list. When a case is admitted, the
//! embalming and cold-room entries of that list become the case's first
//! charges.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use core_kernel::{BranchId, CaseId, Money, ServiceId, UserId};

use crate::charge::{Charge, ChargeType};
use crate::error::BillingError;

/// How a catalog service is priced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PricingModel {
    #[default]
    Flat,
    PerDay,
    Manual,
}

impl PricingModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PricingModel::Flat => "FLAT",
            PricingModel::PerDay => "PER_DAY",
            PricingModel::Manual => "MANUAL",
        }
    }
}

impl fmt::Display for PricingModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PricingModel {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FLAT" => Ok(PricingModel::Flat),
            "PER_DAY" => Ok(PricingModel::PerDay),
            "MANUAL" => Ok(PricingModel::Manual),
            other => Err(BillingError::unknown("pricing model", other)),
        }
    }
}

/// A priced service offered by a branch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCatalogEntry {
    pub id: ServiceId,
    pub branch_id: BranchId,
    pub name: String,
    pub pricing_model: PricingModel,
    pub unit_price: Money,
    pub is_active: bool,
}

impl ServiceCatalogEntry {
    /// Creates an active catalog entry. Name must be non-blank and the
    /// price strictly positive.
    pub fn new(
        branch_id: BranchId,
        name: impl Into<String>,
        pricing_model: PricingModel,
        unit_price: Money,
    ) -> Result<Self, BillingError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(BillingError::MissingField { field: "name" });
        }
        if !unit_price.is_positive() {
            return Err(BillingError::NonPositiveAmount(unit_price.amount()));
        }

        Ok(Self {
            id: ServiceId::new_v7(),
            branch_id,
            name,
            pricing_model,
            unit_price,
            is_active: true,
        })
    }

    /// Keeps the id of an existing entry (used for updates)
    pub fn with_id(mut self, id: ServiceId) -> Self {
        self.id = id;
        self
    }

    pub fn deactivated(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Case-insensitive substring match on the service name
    pub fn name_contains(&self, keyword: &str) -> bool {
        self.name.to_lowercase().contains(keyword)
    }
}

/// Charge types that are derived from the catalog at admission, with the
/// lower-case keyword each one looks for in service names.
pub const INITIAL_CHARGE_RULES: [(ChargeType, &str); 2] = [
    (ChargeType::Embalming, "embalm"),
    (ChargeType::Coldroom, "cold"),
];

/// Derives the initial charges for a newly admitted case.
///
/// For every rule the first active entry (in the given order) whose name
/// contains the keyword produces one charge of quantity 1, dated on the
/// admission date. Rules without a matching entry produce nothing.
pub fn derive_initial_charges(
    catalog: &[ServiceCatalogEntry],
    case_id: CaseId,
    admission_date: NaiveDate,
    created_by: UserId,
) -> Vec<Charge> {
    INITIAL_CHARGE_RULES
        .iter()
        .filter_map(|(charge_type, keyword)| {
            let entry = catalog
                .iter()
                .filter(|s| s.is_active)
                .find(|s| s.name_contains(keyword));

            match entry {
                Some(service) => Some(Charge::from_service(
                    case_id,
                    service,
                    *charge_type,
                    admission_date,
                    created_by,
                )),
                None => {
                    debug!(%case_id, charge_type = %charge_type, "No catalog entry for initial charge");
                    None
                }
            }
        })
        .collect()
}
