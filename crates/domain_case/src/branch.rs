//! Branches
//!
//! A branch is one independently operated mortuary location and the
//! tenant boundary for cases, charges, payments and the service catalog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::BranchId;

use crate::error::CaseError;
use crate::validation::RequiredFields;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub id: BranchId,
    pub name: String,
    /// Short code, unique across the organisation
    pub code: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Branch {
    /// Creates an active branch. Name and code are required.
    pub fn new(
        name: &str,
        code: &str,
        address: Option<String>,
        phone: Option<String>,
    ) -> Result<Self, CaseError> {
        let mut required = RequiredFields::new();
        let name = required.text("name", name);
        let code = required.text("code", code);
        required.finish()?;

        Ok(Self {
            id: BranchId::new_v7(),
            name,
            code: code.to_uppercase(),
            address: address.filter(|a| !a.trim().is_empty()),
            phone: phone.filter(|p| !p.trim().is_empty()),
            is_active: true,
            created_at: Utc::now(),
        })
    }
}
