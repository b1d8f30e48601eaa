//! Branch and service catalog administration

use rust_decimal::Decimal;
use tracing::{info, instrument};

use core_kernel::{BranchId, Money, ServiceId};
use domain_billing::{PricingModel, ServiceCatalogEntry};

use crate::branch::Branch;
use crate::context::RequestContext;
use crate::error::CaseError;
use crate::invalidation::StaleView;

use super::{store_error, CasePorts};

#[derive(Debug, Clone, Default)]
pub struct CreateBranchRequest {
    pub name: String,
    pub code: String,
    pub address: Option<String>,
    pub phone: Option<String>,
}

/// Creates a catalog entry, or replaces one when `id` is set
#[derive(Debug, Clone)]
pub struct UpsertServiceRequest {
    pub id: Option<ServiceId>,
    pub branch_id: BranchId,
    pub name: String,
    pub pricing_model: PricingModel,
    pub unit_price: Decimal,
    pub is_active: bool,
}

#[derive(Clone)]
pub struct BranchSettings {
    ports: CasePorts,
}

impl BranchSettings {
    pub fn new(ports: CasePorts) -> Self {
        Self { ports }
    }

    #[instrument(skip(self, ctx, request), fields(actor = %ctx.actor, code = %request.code))]
    pub async fn create_branch(
        &self,
        ctx: &RequestContext,
        request: CreateBranchRequest,
    ) -> Result<Branch, CaseError> {
        let branch = Branch::new(&request.name, &request.code, request.address, request.phone)?;

        let branch = self
            .ports
            .store
            .insert_branch(&branch)
            .await
            .map_err(store_error("insert_branch"))
            .map_err(|e| e.on_duplicate("Branch code already exists"))?;

        info!(branch_id = %branch.id, "Branch created");
        self.ports.invalidate(&[StaleView::BranchList]);
        Ok(branch)
    }

    /// Deletes a branch. Fails with `ReferenceViolation` while any case
    /// still belongs to it.
    #[instrument(skip(self, ctx), fields(actor = %ctx.actor))]
    pub async fn delete_branch(
        &self,
        ctx: &RequestContext,
        branch_id: BranchId,
    ) -> Result<(), CaseError> {
        self.ports
            .store
            .delete_branch(branch_id)
            .await
            .map_err(store_error("delete_branch"))?;

        info!(%branch_id, "Branch deleted");
        self.ports.invalidate(&[StaleView::BranchList]);
        Ok(())
    }

    pub async fn list_branches(&self, ctx: &RequestContext) -> Result<Vec<Branch>, CaseError> {
        let branches = self
            .ports
            .store
            .list_branches()
            .await
            .map_err(store_error("list_branches"))?;
        Ok(branches
            .into_iter()
            .filter(|b| ctx.can_access(b.id))
            .collect())
    }

    #[instrument(skip(self, ctx, request), fields(actor = %ctx.actor, branch_id = %request.branch_id))]
    pub async fn upsert_service(
        &self,
        ctx: &RequestContext,
        request: UpsertServiceRequest,
    ) -> Result<ServiceCatalogEntry, CaseError> {
        let mut entry = ServiceCatalogEntry::new(
            request.branch_id,
            request.name,
            request.pricing_model,
            Money::new(request.unit_price, self.ports.settings.currency),
        )?;
        if let Some(id) = request.id {
            entry = entry.with_id(id);
        }
        if !request.is_active {
            entry = entry.deactivated();
        }

        let entry = self
            .ports
            .store
            .upsert_service(&entry)
            .await
            .map_err(store_error("upsert_service"))?;

        info!(service_id = %entry.id, name = %entry.name, "Service saved");
        self.ports.invalidate(&[StaleView::Settings { branch_id: request.branch_id }]);
        Ok(entry)
    }

    #[instrument(skip(self, ctx), fields(actor = %ctx.actor))]
    pub async fn delete_service(
        &self,
        ctx: &RequestContext,
        branch_id: BranchId,
        service_id: ServiceId,
    ) -> Result<(), CaseError> {
        self.ports
            .store
            .delete_service(branch_id, service_id)
            .await
            .map_err(store_error("delete_service"))?;

        info!(%service_id, "Service deleted");
        self.ports.invalidate(&[StaleView::Settings { branch_id }]);
        Ok(())
    }

    /// Every catalog entry of the branch, active or not
    pub async fn list_services(
        &self,
        _ctx: &RequestContext,
        branch_id: BranchId,
    ) -> Result<Vec<ServiceCatalogEntry>, CaseError> {
        self.ports
            .store
            .list_services(branch_id, false)
            .await
            .map_err(store_error("list_services"))
    }
}
