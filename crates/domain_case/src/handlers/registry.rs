//! Case lookup and detail edits

use tracing::{info, instrument};

use core_kernel::{BranchId, CaseId};

use crate::case::{Case, CaseDetailsUpdate, CaseQuery};
use crate::context::RequestContext;
use crate::error::CaseError;
use crate::invalidation::StaleView;
use crate::validation::RequiredFields;

use super::{store_error, CasePorts};

#[derive(Clone)]
pub struct CaseRegistry {
    ports: CasePorts,
}

impl CaseRegistry {
    pub fn new(ports: CasePorts) -> Self {
        Self { ports }
    }

    pub async fn get_case(
        &self,
        _ctx: &RequestContext,
        branch_id: BranchId,
        case_id: CaseId,
    ) -> Result<Case, CaseError> {
        self.ports
            .store
            .get_case(branch_id, case_id)
            .await
            .map_err(store_error("get_case"))?
            .ok_or_else(|| CaseError::not_found(format!("Case not found: {}", case_id)))
    }

    pub async fn list_cases(
        &self,
        _ctx: &RequestContext,
        branch_id: BranchId,
        query: CaseQuery,
    ) -> Result<Vec<Case>, CaseError> {
        self.ports
            .store
            .list_cases(branch_id, query)
            .await
            .map_err(store_error("list_cases"))
    }

    /// Edits the descriptive fields of a case, scoped by branch.
    ///
    /// Fields that are present must not be blank where the admission form
    /// requires them. A tag already used in the branch is a `Duplicate`.
    #[instrument(skip(self, ctx, update), fields(actor = %ctx.actor))]
    pub async fn update_case_details(
        &self,
        ctx: &RequestContext,
        branch_id: BranchId,
        case_id: CaseId,
        mut update: CaseDetailsUpdate,
    ) -> Result<Case, CaseError> {
        if update.is_empty() {
            return Err(CaseError::validation("Nothing to update"));
        }

        let mut required = RequiredFields::new();
        if let Some(tag_no) = update.tag_no.as_mut() {
            *tag_no = required.text("tag_no", tag_no);
        }
        if let Some(deceased) = update.deceased.as_mut() {
            deceased.name = required.text("name_of_deceased", &deceased.name);
        }
        if let Some(relative) = update.relative.as_mut() {
            relative.name = required.text("relative_name", &relative.name);
            relative.contact = required.text("relative_contact", &relative.contact);
        }
        required.finish()?;

        let case = self
            .ports
            .store
            .update_case_details(branch_id, case_id, &update)
            .await
            .map_err(store_error("update_case_details"))
            .map_err(|e| e.on_duplicate("Tag number already exists"))?;

        info!(%case_id, "Case details updated");

        self.ports.invalidate(&[
            StaleView::CaseDetail { branch_id, case_id },
            StaleView::CaseList { branch_id },
        ]);
        Ok(case)
    }
}
