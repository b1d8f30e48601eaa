//! Case DTOs

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use core_kernel::{BranchId, CaseId};
use domain_billing::Charge;
use domain_case::{AdmissionRequest, AdmissionResult, Case, CaseError, CaseQuery, CaseStatus, CaseType, Gender};

use super::AgeInput;

/// Admission form
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AdmitCaseBody {
    pub tag_no: String,
    pub name_of_deceased: String,
    pub age: Option<AgeInput>,
    pub gender: Option<Gender>,
    pub place: Option<String>,
    pub relative_name: String,
    pub relative_contact: String,
    pub relative_contact_alt: Option<String>,
    pub admission_date: Option<NaiveDate>,
    pub admission_time: Option<NaiveTime>,
    #[serde(rename = "type")]
    pub case_type: CaseType,
    pub notes: Option<String>,
}

impl AdmitCaseBody {
    pub fn into_request(self, branch_id: BranchId) -> Result<AdmissionRequest, CaseError> {
        let age = match self.age {
            Some(age) => age.resolve()?,
            None => None,
        };

        Ok(AdmissionRequest {
            branch_id: Some(branch_id),
            tag_no: self.tag_no,
            deceased_name: self.name_of_deceased,
            age,
            gender: self.gender,
            place: self.place,
            relative_name: self.relative_name,
            relative_contact: self.relative_contact,
            relative_alt_contact: self.relative_contact_alt,
            admission_date: self.admission_date,
            admission_time: self.admission_time,
            case_type: self.case_type,
            notes: self.notes,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct AdmissionResponse {
    pub case_id: CaseId,
    pub charges_generated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charge_warning: Option<String>,
    pub initial_charges: Vec<Charge>,
    pub case: Case,
}

impl From<AdmissionResult> for AdmissionResponse {
    fn from(result: AdmissionResult) -> Self {
        Self {
            case_id: result.case_id,
            charges_generated: result.charges_generated,
            charge_warning: result.charge_warning,
            initial_charges: result.initial_charges,
            case: result.case,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListCasesQuery {
    pub status: Option<CaseStatus>,
    pub limit: Option<u32>,
}

impl From<ListCasesQuery> for CaseQuery {
    fn from(query: ListCasesQuery) -> Self {
        CaseQuery {
            status: query.status,
            limit: query.limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_admission_body_maps_form_fields() {
        let body: AdmitCaseBody = serde_json::from_value(json!({
            "tag_no": "TAG-9",
            "name_of_deceased": "Yaw Boateng",
            "age": "63",
            "gender": "Male",
            "relative_name": "Akua Boateng",
            "relative_contact": "0200000000",
            "type": "VIP"
        }))
        .unwrap();

        let branch = BranchId::new();
        let request = body.into_request(branch).unwrap();

        assert_eq!(request.branch_id, Some(branch));
        assert_eq!(request.deceased_name, "Yaw Boateng");
        assert_eq!(request.age, Some(63));
        assert_eq!(request.gender, Some(Gender::Male));
        assert_eq!(request.case_type, CaseType::Vip);
    }

    #[test]
    fn test_missing_fields_are_left_for_domain_validation() {
        let body: AdmitCaseBody = serde_json::from_value(json!({})).unwrap();
        let request = body.into_request(BranchId::new()).unwrap();

        assert!(request.tag_no.is_empty());
        assert_eq!(request.case_type, CaseType::Normal);
    }
}
