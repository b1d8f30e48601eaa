//! Admission handler
//!
//! Registers a new case in custody and, best-effort, bills the branch's
//! embalming and cold-room services as initial charges.

use chrono::{NaiveDate, NaiveTime};
use tracing::{info, instrument, warn};

use core_kernel::{BranchId, CaseId};
use domain_billing::{derive_initial_charges, Charge};

use crate::case::{Case, CaseType, DeceasedInfo, Gender, RelativeInfo};
use crate::context::RequestContext;
use crate::error::CaseError;
use crate::invalidation::StaleView;
use crate::validation::{optional_text, RequiredFields};

use super::{store_error, CasePorts};

/// Input for admitting a case
#[derive(Debug, Clone, Default)]
pub struct AdmissionRequest {
    pub branch_id: Option<BranchId>,
    pub tag_no: String,
    pub deceased_name: String,
    /// Must be non-negative when present
    pub age: Option<i64>,
    pub gender: Option<Gender>,
    pub place: Option<String>,
    pub relative_name: String,
    pub relative_contact: String,
    pub relative_alt_contact: Option<String>,
    /// Defaults to today in the branch timezone
    pub admission_date: Option<NaiveDate>,
    pub admission_time: Option<NaiveTime>,
    pub case_type: CaseType,
    pub notes: Option<String>,
}

/// Outcome of an admission
///
/// The case is persisted whenever this is returned. Initial-charge
/// generation is a separate step whose failure is reported here.
#[derive(Debug, Clone)]
pub struct AdmissionResult {
    pub case_id: CaseId,
    /// True iff at least one initial charge was persisted
    pub charges_generated: bool,
    pub charge_warning: Option<String>,
    pub initial_charges: Vec<Charge>,
    /// The case as stored after initial charges
    pub case: Case,
}

#[derive(Clone)]
pub struct AdmissionHandler {
    ports: CasePorts,
}

impl AdmissionHandler {
    pub fn new(ports: CasePorts) -> Self {
        Self { ports }
    }

    /// Admits a case.
    ///
    /// # Errors
    ///
    /// - `Validation` for missing required fields or a negative age
    /// - `Duplicate` if the tag is already used in the branch
    /// - `Persistence` for any other store failure while saving the case
    #[instrument(skip(self, ctx, request), fields(actor = %ctx.actor, tag_no = %request.tag_no))]
    pub async fn admit(
        &self,
        ctx: &RequestContext,
        request: AdmissionRequest,
    ) -> Result<AdmissionResult, CaseError> {
        let mut required = RequiredFields::new();
        let branch_id = required.present("branch_id", request.branch_id);
        let tag_no = required.text("tag_no", &request.tag_no);
        let deceased_name = required.text("name_of_deceased", &request.deceased_name);
        let relative_name = required.text("relative_name", &request.relative_name);
        let relative_contact = required.text("relative_contact", &request.relative_contact);
        required.finish()?;

        let branch_id = branch_id
            .ok_or_else(|| CaseError::validation_field("Missing required fields: branch_id", "branch_id"))?;
        let age = validate_age(request.age)?;

        let admission_date = request
            .admission_date
            .unwrap_or_else(|| self.ports.settings.timezone.today());

        let case = Case::admitted(
            branch_id,
            tag_no,
            DeceasedInfo {
                name: deceased_name,
                age,
                gender: request.gender,
                place: optional_text(request.place.as_deref()),
            },
            RelativeInfo {
                name: relative_name,
                contact: relative_contact,
                alt_contact: optional_text(request.relative_alt_contact.as_deref()),
            },
            admission_date,
            request.admission_time,
            request.case_type,
            self.ports.settings.currency,
            ctx.actor,
        )
        .with_notes(optional_text(request.notes.as_deref()));

        let case = self
            .ports
            .store
            .insert_case(&case)
            .await
            .map_err(store_error("insert_case"))
            .map_err(|e| e.on_duplicate("Tag number already exists"))?;

        info!(case_id = %case.id, branch_id = %branch_id, "Case admitted");

        let (initial_charges, charge_warning) = match self.generate_initial_charges(ctx, &case).await {
            Ok(charges) => (charges, None),
            Err(err) => {
                warn!(case_id = %case.id, error = %err, "Initial charges not generated");
                (
                    Vec::new(),
                    Some(format!("Case admitted but initial charges could not be added: {}", err)),
                )
            }
        };

        let case = match self.ports.store.get_case(branch_id, case.id).await {
            Ok(Some(stored)) => stored,
            _ => case,
        };

        self.ports.invalidate(&[
            StaleView::CaseList { branch_id },
            StaleView::Dashboard { branch_id },
        ]);

        Ok(AdmissionResult {
            case_id: case.id,
            charges_generated: !initial_charges.is_empty(),
            charge_warning,
            initial_charges,
            case,
        })
    }

    async fn generate_initial_charges(
        &self,
        ctx: &RequestContext,
        case: &Case,
    ) -> Result<Vec<Charge>, CaseError> {
        let catalog = self
            .ports
            .store
            .list_services(case.branch_id, true)
            .await
            .map_err(CaseError::from)?;

        let charges = derive_initial_charges(&catalog, case.id, case.admission_date, ctx.actor);
        if charges.is_empty() {
            return Ok(charges);
        }

        let inserted = self
            .ports
            .store
            .insert_charges(&charges)
            .await
            .map_err(CaseError::from)?;

        info!(case_id = %case.id, count = inserted.len(), "Initial charges added");
        Ok(inserted)
    }
}

fn validate_age(age: Option<i64>) -> Result<Option<u32>, CaseError> {
    match age {
        None => Ok(None),
        Some(years) => u32::try_from(years)
            .map(Some)
            .map_err(|_| CaseError::validation_field("Age must be a non-negative whole number", "age")),
    }
}
