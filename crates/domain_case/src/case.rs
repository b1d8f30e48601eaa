//! Case aggregate
//!
//! A case is one admission of a deceased person at a branch together with
//! its billing snapshot. The snapshot is written by the record store only;
//! this module never computes it.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{BranchId, CaseId, Currency, Money, StayPeriod, UserId};
use domain_billing::ReceiptNumber;

use crate::error::CaseError;

/// Lifecycle status of a case
///
/// ```text
/// IN_CUSTODY ──discharge──▶ DISCHARGED
///     │
///     ├──────cancel──────▶ CANCELLED
///     └──────archive─────▶ ARCHIVED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaseStatus {
    InCustody,
    Discharged,
    Cancelled,
    Archived,
}

impl CaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStatus::InCustody => "IN_CUSTODY",
            CaseStatus::Discharged => "DISCHARGED",
            CaseStatus::Cancelled => "CANCELLED",
            CaseStatus::Archived => "ARCHIVED",
        }
    }

    /// Only `IN_CUSTODY` may move, and only forward
    pub fn can_transition_to(&self, target: CaseStatus) -> bool {
        matches!(
            (self, target),
            (CaseStatus::InCustody, CaseStatus::Discharged)
                | (CaseStatus::InCustody, CaseStatus::Cancelled)
                | (CaseStatus::InCustody, CaseStatus::Archived)
        )
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, CaseStatus::InCustody)
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaseStatus {
    type Err = CaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IN_CUSTODY" => Ok(CaseStatus::InCustody),
            "DISCHARGED" => Ok(CaseStatus::Discharged),
            "CANCELLED" => Ok(CaseStatus::Cancelled),
            "ARCHIVED" => Ok(CaseStatus::Archived),
            other => Err(CaseError::validation_field(
                format!("Unknown case status: {}", other),
                "status",
            )),
        }
    }
}

/// Recorded gender of the deceased
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    #[serde(rename = "Other/Unknown")]
    OtherUnknown,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::OtherUnknown => "Other/Unknown",
        }
    }
}

impl FromStr for Gender {
    type Err = CaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Male" => Ok(Gender::Male),
            "Female" => Ok(Gender::Female),
            "Other/Unknown" => Ok(Gender::OtherUnknown),
            other => Err(CaseError::validation_field(
                format!("Unknown gender: {}", other),
                "gender",
            )),
        }
    }
}

/// Service level of the case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CaseType {
    #[default]
    Normal,
    #[serde(rename = "VIP")]
    Vip,
}

impl CaseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseType::Normal => "Normal",
            CaseType::Vip => "VIP",
        }
    }
}

impl FromStr for CaseType {
    type Err = CaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Normal" => Ok(CaseType::Normal),
            "VIP" => Ok(CaseType::Vip),
            other => Err(CaseError::validation_field(
                format!("Unknown case type: {}", other),
                "type",
            )),
        }
    }
}

/// Details of the deceased person
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeceasedInfo {
    pub name: String,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    /// Place of death or pickup location
    pub place: Option<String>,
}

/// The next of kin responsible for the case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelativeInfo {
    pub name: String,
    pub contact: String,
    pub alt_contact: Option<String>,
}

/// Store-maintained billing totals of a case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialSnapshot {
    pub embalming_fee: Money,
    pub coldroom_fee: Money,
    pub storage_fee: Money,
    pub total_bill: Money,
    pub total_paid: Money,
    pub balance: Money,
}

impl FinancialSnapshot {
    pub fn zero(currency: Currency) -> Self {
        let zero = Money::zero(currency);
        Self {
            embalming_fee: zero,
            coldroom_fee: zero,
            storage_fee: zero,
            total_bill: zero,
            total_paid: zero,
            balance: zero,
        }
    }

    /// True if there is money still owed
    pub fn has_outstanding_balance(&self) -> bool {
        self.balance.is_positive()
    }

    /// `balance == total_bill - total_paid`
    pub fn is_consistent(&self) -> bool {
        self.total_bill
            .checked_sub(&self.total_paid)
            .map(|b| b == self.balance)
            .unwrap_or(false)
    }
}

/// A deceased-person admission record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub id: CaseId,
    pub branch_id: BranchId,
    /// Body tag, unique within the branch
    pub tag_no: String,
    pub deceased: DeceasedInfo,
    pub relative: RelativeInfo,
    pub admission_date: NaiveDate,
    pub admission_time: Option<NaiveTime>,
    pub case_type: CaseType,
    pub status: CaseStatus,
    pub discharge_date: Option<NaiveDate>,
    pub discharge_receipt_no: Option<ReceiptNumber>,
    /// Authoritative storage-day count as maintained by the store
    pub storage_days: Option<u32>,
    pub notes: Option<String>,
    pub financials: FinancialSnapshot,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<UserId>,
}

impl Case {
    /// Builds a freshly admitted case. Status is always `IN_CUSTODY`.
    #[allow(clippy::too_many_arguments)]
    pub fn admitted(
        branch_id: BranchId,
        tag_no: impl Into<String>,
        deceased: DeceasedInfo,
        relative: RelativeInfo,
        admission_date: NaiveDate,
        admission_time: Option<NaiveTime>,
        case_type: CaseType,
        currency: Currency,
        created_by: UserId,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: CaseId::new_v7(),
            branch_id,
            tag_no: tag_no.into(),
            deceased,
            relative,
            admission_date,
            admission_time,
            case_type,
            status: CaseStatus::InCustody,
            discharge_date: None,
            discharge_receipt_no: None,
            storage_days: None,
            notes: None,
            financials: FinancialSnapshot::zero(currency),
            created_at: now,
            updated_at: now,
            created_by: Some(created_by),
        }
    }

    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }

    pub fn is_in_custody(&self) -> bool {
        self.status == CaseStatus::InCustody
    }

    /// Custody window of the case
    pub fn stay(&self) -> StayPeriod {
        StayPeriod {
            admitted_on: self.admission_date,
            released_on: self.discharge_date,
        }
    }

    /// Fails with `InvalidState` unless the case may move to `target`
    pub fn ensure_transition(&self, target: CaseStatus, action: &str) -> Result<(), CaseError> {
        if self.status.can_transition_to(target) {
            Ok(())
        } else {
            Err(CaseError::InvalidState {
                from: self.status,
                action: action.to_string(),
            })
        }
    }

    /// Applies an edit of the descriptive fields. Status and financials
    /// are never touched.
    pub fn apply_details(&mut self, update: &CaseDetailsUpdate) {
        if let Some(tag_no) = &update.tag_no {
            self.tag_no = tag_no.clone();
        }
        if let Some(deceased) = &update.deceased {
            self.deceased = deceased.clone();
        }
        if let Some(relative) = &update.relative {
            self.relative = relative.clone();
        }
        if let Some(date) = update.admission_date {
            self.admission_date = date;
        }
        if let Some(time) = update.admission_time {
            self.admission_time = Some(time);
        }
        if let Some(case_type) = update.case_type {
            self.case_type = case_type;
        }
        if let Some(notes) = &update.notes {
            self.notes = Some(notes.clone()).filter(|n| !n.trim().is_empty());
        }
        self.updated_at = Utc::now();
    }
}

/// Partial edit of a case's descriptive fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseDetailsUpdate {
    pub tag_no: Option<String>,
    pub deceased: Option<DeceasedInfo>,
    pub relative: Option<RelativeInfo>,
    pub admission_date: Option<NaiveDate>,
    pub admission_time: Option<NaiveTime>,
    pub case_type: Option<CaseType>,
    /// `Some("")` clears the notes
    pub notes: Option<String>,
}

impl CaseDetailsUpdate {
    pub fn is_empty(&self) -> bool {
        self == &CaseDetailsUpdate::default()
    }
}

/// Store update written when a case is discharged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DischargeUpdate {
    pub discharge_date: NaiveDate,
    pub receipt_no: ReceiptNumber,
}

/// Filter for case listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaseQuery {
    pub status: Option<CaseStatus>,
    pub limit: Option<u32>,
}

impl CaseQuery {
    pub fn with_status(status: CaseStatus) -> Self {
        Self {
            status: Some(status),
            limit: None,
        }
    }

    pub fn matches(&self, case: &Case) -> bool {
        self.status.map_or(true, |s| case.status == s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_case() -> Case {
        Case::admitted(
            BranchId::new(),
            "TAG-100",
            DeceasedInfo {
                name: "John Doe".to_string(),
                age: Some(64),
                gender: Some(Gender::Male),
                place: None,
            },
            RelativeInfo {
                name: "Jane Doe".to_string(),
                contact: "0244000000".to_string(),
                alt_contact: None,
            },
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            None,
            CaseType::Normal,
            Currency::GHS,
            UserId::new(),
        )
    }

    #[test]
    fn test_admitted_case_is_in_custody() {
        let case = sample_case();
        assert_eq!(case.status, CaseStatus::InCustody);
        assert!(case.discharge_receipt_no.is_none());
        assert!(case.financials.total_bill.is_zero());
        assert!(case.financials.is_consistent());
    }

    #[test]
    fn test_status_transitions() {
        assert!(CaseStatus::InCustody.can_transition_to(CaseStatus::Discharged));
        assert!(!CaseStatus::Discharged.can_transition_to(CaseStatus::Discharged));
        assert!(!CaseStatus::Discharged.can_transition_to(CaseStatus::InCustody));
        assert!(!CaseStatus::Cancelled.can_transition_to(CaseStatus::Discharged));
        assert!(CaseStatus::Archived.is_terminal());
        assert!(!CaseStatus::InCustody.is_terminal());
    }

    #[test]
    fn test_ensure_transition_reports_state() {
        let mut case = sample_case();
        case.status = CaseStatus::Discharged;

        match case.ensure_transition(CaseStatus::Discharged, "discharge") {
            Err(CaseError::InvalidState { from, action }) => {
                assert_eq!(from, CaseStatus::Discharged);
                assert_eq!(action, "discharge");
            }
            other => panic!("expected InvalidState, got {:?}", other),
        }
    }

    #[test]
    fn test_apply_details_leaves_status_and_financials() {
        let mut case = sample_case();
        case.financials.total_bill = Money::new(dec!(530), Currency::GHS);
        case.financials.balance = Money::new(dec!(530), Currency::GHS);

        case.apply_details(&CaseDetailsUpdate {
            tag_no: Some("TAG-101".to_string()),
            notes: Some("Family requested viewing".to_string()),
            ..Default::default()
        });

        assert_eq!(case.tag_no, "TAG-101");
        assert_eq!(case.notes.as_deref(), Some("Family requested viewing"));
        assert_eq!(case.status, CaseStatus::InCustody);
        assert_eq!(case.financials.total_bill.amount(), dec!(530));

        case.apply_details(&CaseDetailsUpdate {
            notes: Some(String::new()),
            ..Default::default()
        });
        assert!(case.notes.is_none());
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(serde_json::to_string(&CaseStatus::InCustody).unwrap(), "\"IN_CUSTODY\"");
        assert_eq!(serde_json::to_string(&Gender::OtherUnknown).unwrap(), "\"Other/Unknown\"");
        assert_eq!(serde_json::to_string(&CaseType::Vip).unwrap(), "\"VIP\"");
        assert_eq!("DISCHARGED".parse::<CaseStatus>().unwrap(), CaseStatus::Discharged);
    }

    #[test]
    fn test_query_matches() {
        let case = sample_case();
        assert!(CaseQuery::default().matches(&case));
        assert!(CaseQuery::with_status(CaseStatus::InCustody).matches(&case));
        assert!(!CaseQuery::with_status(CaseStatus::Discharged).matches(&case));
    }
}
