//! Handler Test Harness
//!
//! Wires the in-memory ports to a full set of case handlers, with one
//! branch already registered.

use std::sync::Arc;

use core_kernel::{Currency, UserId};
use domain_billing::ServiceCatalogEntry;
use domain_case::ports::mock::{InMemoryReceiptNumbering, InMemoryRecordStore, RecordingInvalidator};
use domain_case::{
    AdmissionResult, BillingSettings, Branch, CasePorts, CaseServices, RequestContext,
};

use crate::builders::AdmissionRequestBuilder;
use crate::fixtures::{BranchFixtures, CatalogFixtures, FIXTURE_TIMEZONE};

pub struct TestHarness {
    pub store: Arc<InMemoryRecordStore>,
    pub numbering: Arc<InMemoryReceiptNumbering>,
    pub invalidator: Arc<RecordingInvalidator>,
    pub services: CaseServices,
    pub branch: Branch,
    /// Staff context scoped to `branch`
    pub ctx: RequestContext,
}

impl TestHarness {
    /// Branch with the standard Embalming/Coldroom catalog
    pub async fn new() -> Self {
        let branch = BranchFixtures::accra();
        let catalog = CatalogFixtures::standard(branch.id);
        Self::build(branch, catalog).await
    }

    /// Branch whose catalog matches no initial charge
    pub async fn without_matching_catalog() -> Self {
        let branch = BranchFixtures::accra();
        let catalog = CatalogFixtures::unrelated(branch.id);
        Self::build(branch, catalog).await
    }

    pub async fn build(branch: Branch, catalog: Vec<ServiceCatalogEntry>) -> Self {
        let store = Arc::new(
            InMemoryRecordStore::new(Currency::GHS)
                .with_branch(branch.clone())
                .await
                .with_services(catalog)
                .await,
        );
        let numbering = Arc::new(InMemoryReceiptNumbering::new(store.clone()));
        let invalidator = Arc::new(RecordingInvalidator::new());

        let ports = CasePorts::new(
            store.clone(),
            numbering.clone(),
            invalidator.clone(),
            BillingSettings {
                currency: Currency::GHS,
                timezone: *FIXTURE_TIMEZONE,
            },
        );

        let ctx = RequestContext::staff(UserId::new(), branch.id);

        Self {
            store,
            numbering,
            invalidator,
            services: CaseServices::new(ports),
            branch,
            ctx,
        }
    }

    /// Administrator context
    pub fn admin_ctx(&self) -> RequestContext {
        RequestContext::admin(UserId::new())
    }

    /// Admits a valid case with the given tag
    pub async fn admit(&self, tag_no: &str) -> AdmissionResult {
        self.services
            .admission
            .admit(
                &self.ctx,
                AdmissionRequestBuilder::new(self.branch.id).with_tag(tag_no).build(),
            )
            .await
            .expect("admission should succeed")
    }
}
