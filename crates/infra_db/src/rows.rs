//! Row types and their conversion into domain values
//!
//! Enum-like columns are stored as their wire names and parsed back with
//! the domain `FromStr` impls. Amounts are `NUMERIC` columns read as
//! `Decimal` and tagged with the store's configured currency.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use core_kernel::{Currency, Money};
use domain_billing::{
    Allocation, Charge, ChargeType, Payment, PaymentMethod, PricingModel, ReceiptNumber,
    ServiceCatalogEntry,
};
use domain_case::{
    Branch, Case, CaseStatus, CaseType, DeceasedInfo, FinancialSnapshot, Gender, RelativeInfo,
};

use crate::error::DatabaseError;

fn parse<T>(column: &'static str, value: &str) -> Result<T, DatabaseError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| DatabaseError::decode(format!("{}: {}", column, e)))
}

fn receipt(value: String) -> Result<ReceiptNumber, DatabaseError> {
    ReceiptNumber::new(value).map_err(DatabaseError::decode)
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BranchRow {
    pub branch_id: Uuid,
    pub name: String,
    pub code: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<BranchRow> for Branch {
    fn from(row: BranchRow) -> Self {
        Branch {
            id: row.branch_id.into(),
            name: row.name,
            code: row.code,
            address: row.address,
            phone: row.phone,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ServiceRow {
    pub service_id: Uuid,
    pub branch_id: Uuid,
    pub name: String,
    pub pricing_model: String,
    pub unit_price: Decimal,
    pub is_active: bool,
}

impl ServiceRow {
    pub fn into_domain(self, currency: Currency) -> Result<ServiceCatalogEntry, DatabaseError> {
        Ok(ServiceCatalogEntry {
            id: self.service_id.into(),
            branch_id: self.branch_id.into(),
            name: self.name,
            pricing_model: parse::<PricingModel>("pricing_model", &self.pricing_model)?,
            unit_price: Money::new(self.unit_price, currency),
            is_active: self.is_active,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CaseRow {
    pub case_id: Uuid,
    pub branch_id: Uuid,
    pub tag_no: String,
    pub name_of_deceased: String,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub place: Option<String>,
    pub relative_name: String,
    pub relative_contact: String,
    pub relative_contact_alt: Option<String>,
    pub admission_date: NaiveDate,
    pub admission_time: Option<NaiveTime>,
    pub case_type: String,
    pub status: String,
    pub discharge_date: Option<NaiveDate>,
    pub discharge_receipt_no: Option<String>,
    pub storage_days: Option<i32>,
    pub notes: Option<String>,
    pub embalming_fee: Decimal,
    pub coldroom_fee: Decimal,
    pub storage_fee: Decimal,
    pub total_bill: Decimal,
    pub total_paid: Decimal,
    pub balance: Decimal,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CaseRow {
    pub fn into_domain(self, currency: Currency) -> Result<Case, DatabaseError> {
        let money = |amount: Decimal| Money::new(amount, currency);
        let non_negative = |column: &'static str, value: Option<i32>| {
            value
                .map(u32::try_from)
                .transpose()
                .map_err(|e| DatabaseError::decode(format!("{}: {}", column, e)))
        };

        Ok(Case {
            id: self.case_id.into(),
            branch_id: self.branch_id.into(),
            tag_no: self.tag_no,
            deceased: DeceasedInfo {
                name: self.name_of_deceased,
                age: non_negative("age", self.age)?,
                gender: self
                    .gender
                    .as_deref()
                    .map(|g| parse::<Gender>("gender", g))
                    .transpose()?,
                place: self.place,
            },
            relative: RelativeInfo {
                name: self.relative_name,
                contact: self.relative_contact,
                alt_contact: self.relative_contact_alt,
            },
            admission_date: self.admission_date,
            admission_time: self.admission_time,
            case_type: parse::<CaseType>("case_type", &self.case_type)?,
            status: parse::<CaseStatus>("status", &self.status)?,
            discharge_date: self.discharge_date,
            discharge_receipt_no: self.discharge_receipt_no.map(receipt).transpose()?,
            storage_days: non_negative("storage_days", self.storage_days)?,
            notes: self.notes,
            financials: FinancialSnapshot {
                embalming_fee: money(self.embalming_fee),
                coldroom_fee: money(self.coldroom_fee),
                storage_fee: money(self.storage_fee),
                total_bill: money(self.total_bill),
                total_paid: money(self.total_paid),
                balance: money(self.balance),
            },
            created_at: self.created_at,
            updated_at: self.updated_at,
            created_by: self.created_by.map(Into::into),
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ChargeRow {
    pub charge_id: Uuid,
    pub case_id: Uuid,
    pub branch_id: Uuid,
    pub service_id: Option<Uuid>,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub amount: Decimal,
    pub charge_type: String,
    pub applied_on: NaiveDate,
    pub auto_generated: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl ChargeRow {
    pub fn into_domain(self, currency: Currency) -> Result<Charge, DatabaseError> {
        Ok(Charge {
            id: self.charge_id.into(),
            case_id: self.case_id.into(),
            branch_id: self.branch_id.into(),
            service_id: self.service_id.map(Into::into),
            description: self.description,
            quantity: self.quantity,
            unit_price: Money::new(self.unit_price, currency),
            amount: Money::new(self.amount, currency),
            charge_type: parse::<ChargeType>("charge_type", &self.charge_type)?,
            applied_on: self.applied_on,
            auto_generated: self.auto_generated,
            created_at: self.created_at,
            created_by: self.created_by.map(Into::into),
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PaymentRow {
    pub payment_id: Uuid,
    pub branch_id: Uuid,
    pub case_id: Uuid,
    pub amount: Decimal,
    pub method: String,
    pub allocation: String,
    pub receipt_no: String,
    pub received_by: Uuid,
    pub note: Option<String>,
    pub paid_on: DateTime<Utc>,
}

impl PaymentRow {
    pub fn into_domain(self, currency: Currency) -> Result<Payment, DatabaseError> {
        Ok(Payment {
            id: self.payment_id.into(),
            branch_id: self.branch_id.into(),
            case_id: self.case_id.into(),
            amount: Money::new(self.amount, currency),
            method: parse::<PaymentMethod>("method", &self.method)?,
            allocation: parse::<Allocation>("allocation", &self.allocation)?,
            receipt_no: receipt(self.receipt_no)?,
            received_by: self.received_by.into(),
            note: self.note,
            paid_on: self.paid_on,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn case_row() -> CaseRow {
        CaseRow {
            case_id: Uuid::new_v4(),
            branch_id: Uuid::new_v4(),
            tag_no: "TAG-7".to_string(),
            name_of_deceased: "Ama Mensah".to_string(),
            age: Some(81),
            gender: Some("Female".to_string()),
            place: None,
            relative_name: "Kofi Mensah".to_string(),
            relative_contact: "0244000000".to_string(),
            relative_contact_alt: None,
            admission_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            admission_time: None,
            case_type: "VIP".to_string(),
            status: "DISCHARGED".to_string(),
            discharge_date: NaiveDate::from_ymd_opt(2024, 3, 5),
            discharge_receipt_no: Some("DIS-000004".to_string()),
            storage_days: Some(4),
            notes: None,
            embalming_fee: dec!(500),
            coldroom_fee: dec!(30),
            storage_fee: dec!(0),
            total_bill: dec!(530),
            total_paid: dec!(200),
            balance: dec!(330),
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_case_row_conversion() {
        let case = case_row().into_domain(Currency::GHS).unwrap();

        assert_eq!(case.status, CaseStatus::Discharged);
        assert_eq!(case.case_type, CaseType::Vip);
        assert_eq!(case.deceased.gender, Some(Gender::Female));
        assert_eq!(case.storage_days, Some(4));
        assert_eq!(case.financials.balance, Money::new(dec!(330), Currency::GHS));
        assert!(case.financials.is_consistent());
        assert_eq!(case.discharge_receipt_no.unwrap().as_str(), "DIS-000004");
    }

    #[test]
    fn test_unknown_status_is_decode_error() {
        let mut row = case_row();
        row.status = "BURIED".to_string();

        let err = row.into_domain(Currency::GHS).unwrap_err();
        assert!(matches!(err, DatabaseError::Decode(_)));
    }

    #[test]
    fn test_negative_age_is_decode_error() {
        let mut row = case_row();
        row.age = Some(-1);

        assert!(row.into_domain(Currency::GHS).is_err());
    }

    #[test]
    fn test_payment_row_conversion() {
        let row = PaymentRow {
            payment_id: Uuid::new_v4(),
            branch_id: Uuid::new_v4(),
            case_id: Uuid::new_v4(),
            amount: dec!(200.00),
            method: "MOMO".to_string(),
            allocation: "EMBALMING".to_string(),
            receipt_no: "PAY-000010".to_string(),
            received_by: Uuid::new_v4(),
            note: None,
            paid_on: Utc::now(),
        };

        let payment = row.into_domain(Currency::GHS).unwrap();
        assert_eq!(payment.method, PaymentMethod::Momo);
        assert_eq!(payment.allocation, Allocation::Embalming);
        assert_eq!(payment.receipt_no.as_str(), "PAY-000010");
    }
}
