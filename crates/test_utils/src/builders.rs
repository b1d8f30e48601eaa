//! Test Data Builders
//!
//! Provides builder patterns for constructing test data with sensible
//! defaults. Tests specify only the relevant fields.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{BranchId, CaseId};
use domain_billing::{Allocation, PaymentMethod};
use domain_case::{AdmissionRequest, CaseType, DischargeRequest, Gender, RecordPaymentRequest};

use crate::fixtures::{DateFixtures, PersonFixtures};

/// Builder for admission requests
pub struct AdmissionRequestBuilder {
    request: AdmissionRequest,
}

impl AdmissionRequestBuilder {
    /// A complete, valid request for the given branch
    pub fn new(branch_id: BranchId) -> Self {
        Self {
            request: AdmissionRequest {
                branch_id: Some(branch_id),
                tag_no: "TAG-100".to_string(),
                deceased_name: "John Doe".to_string(),
                age: Some(67),
                gender: Some(Gender::Male),
                place: Some("Korle Bu".to_string()),
                relative_name: PersonFixtures::relative_name(),
                relative_contact: PersonFixtures::phone(),
                relative_alt_contact: None,
                admission_date: Some(DateFixtures::admission_date()),
                admission_time: Some(DateFixtures::admission_time()),
                case_type: CaseType::Normal,
                notes: None,
            },
        }
    }

    pub fn with_tag(mut self, tag_no: impl Into<String>) -> Self {
        self.request.tag_no = tag_no.into();
        self
    }

    pub fn with_deceased_name(mut self, name: impl Into<String>) -> Self {
        self.request.deceased_name = name.into();
        self
    }

    pub fn with_relative(mut self, name: impl Into<String>, contact: impl Into<String>) -> Self {
        self.request.relative_name = name.into();
        self.request.relative_contact = contact.into();
        self
    }

    pub fn with_age(mut self, age: Option<i64>) -> Self {
        self.request.age = age;
        self
    }

    pub fn with_admission_date(mut self, date: NaiveDate) -> Self {
        self.request.admission_date = Some(date);
        self
    }

    pub fn without_branch(mut self) -> Self {
        self.request.branch_id = None;
        self
    }

    pub fn vip(mut self) -> Self {
        self.request.case_type = CaseType::Vip;
        self
    }

    pub fn build(self) -> AdmissionRequest {
        self.request
    }
}

/// Builder for payment requests
pub struct PaymentRequestBuilder {
    request: RecordPaymentRequest,
}

impl PaymentRequestBuilder {
    /// A 200.00 cash payment with general allocation
    pub fn new(branch_id: BranchId, case_id: CaseId) -> Self {
        Self {
            request: RecordPaymentRequest {
                branch_id,
                case_id,
                amount: dec!(200.00),
                method: PaymentMethod::Cash,
                allocation: Allocation::General,
                note: None,
            },
        }
    }

    pub fn with_amount(mut self, amount: Decimal) -> Self {
        self.request.amount = amount;
        self
    }

    pub fn with_method(mut self, method: PaymentMethod) -> Self {
        self.request.method = method;
        self
    }

    pub fn with_allocation(mut self, allocation: Allocation) -> Self {
        self.request.allocation = allocation;
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.request.note = Some(note.into());
        self
    }

    pub fn build(self) -> RecordPaymentRequest {
        self.request
    }
}

/// Builder for discharge requests
pub struct DischargeRequestBuilder {
    request: DischargeRequest,
}

impl DischargeRequestBuilder {
    /// A confirmed discharge on the fixture discharge date
    pub fn new(branch_id: BranchId, case_id: CaseId) -> Self {
        Self {
            request: DischargeRequest {
                branch_id,
                case_id,
                discharge_date: Some(DateFixtures::discharge_date()),
                confirm_payment: true,
            },
        }
    }

    pub fn unconfirmed(mut self) -> Self {
        self.request.confirm_payment = false;
        self
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.request.discharge_date = Some(date);
        self
    }

    pub fn build(self) -> DischargeRequest {
        self.request
    }
}
