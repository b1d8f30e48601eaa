//! Case Domain Ports
//!
//! This module defines the port interfaces the case handlers depend on,
//! enabling swappable implementations (PostgreSQL, in-memory mock).
//!
//! # Architecture
//!
//! - **`RecordStore`**: persistence of branches, catalog entries, cases,
//!   charges and payments. The store owns the financial recompute: after
//!   any charge or payment mutation it refreshes the owning case's totals.
//! - **`ReceiptNumbering`**: hands out unique, strictly increasing receipt
//!   numbers per branch and receipt type.
//! - **`ViewInvalidator`**: see [`crate::invalidation`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_case::ports::{RecordStore, ReceiptNumbering};
//! use std::sync::Arc;
//!
//! let ports = CasePorts::new(
//!     Arc::new(PgRecordStore::new(pool.clone(), settings.currency)),
//!     Arc::new(PgReceiptNumbering::new(pool)),
//!     Arc::new(TracingInvalidator),
//!     settings,
//! );
//! ```

use async_trait::async_trait;

use core_kernel::{
    BranchId, CaseId, ChargeId, DomainPort, HealthCheckable, PaymentId, PortError, ServiceId,
};
use domain_billing::{Charge, Payment, ReceiptNumber, ReceiptType, ServiceCatalogEntry};

use crate::branch::Branch;
use crate::case::{Case, CaseDetailsUpdate, CaseQuery, DischargeUpdate};

/// Persistence port for the case domain
///
/// All methods return `Result<T, PortError>`. Uniqueness violations must be
/// reported as `PortError::Duplicate` and referential violations as
/// `PortError::ReferenceViolation` so handlers can tell them apart.
#[async_trait]
pub trait RecordStore: DomainPort + HealthCheckable {
    // ========================================================================
    // Branches
    // ========================================================================

    /// Inserts a branch; a taken code is a `Duplicate`
    async fn insert_branch(&self, branch: &Branch) -> Result<Branch, PortError>;

    /// All branches ordered by name
    async fn list_branches(&self) -> Result<Vec<Branch>, PortError>;

    /// Deletes a branch; `ReferenceViolation` while anything references it
    async fn delete_branch(&self, branch_id: BranchId) -> Result<(), PortError>;

    // ========================================================================
    // Service catalog
    // ========================================================================

    /// Catalog entries of a branch in store order
    async fn list_services(
        &self,
        branch_id: BranchId,
        active_only: bool,
    ) -> Result<Vec<ServiceCatalogEntry>, PortError>;

    /// Inserts or replaces a catalog entry by id
    async fn upsert_service(
        &self,
        entry: &ServiceCatalogEntry,
    ) -> Result<ServiceCatalogEntry, PortError>;

    async fn delete_service(
        &self,
        branch_id: BranchId,
        service_id: ServiceId,
    ) -> Result<(), PortError>;

    // ========================================================================
    // Cases
    // ========================================================================

    /// Inserts a case; a tag already used in the branch is a `Duplicate`
    async fn insert_case(&self, case: &Case) -> Result<Case, PortError>;

    async fn get_case(
        &self,
        branch_id: BranchId,
        case_id: CaseId,
    ) -> Result<Option<Case>, PortError>;

    /// Cases of a branch, newest admission first
    async fn list_cases(
        &self,
        branch_id: BranchId,
        query: CaseQuery,
    ) -> Result<Vec<Case>, PortError>;

    /// Edits descriptive fields only
    async fn update_case_details(
        &self,
        branch_id: BranchId,
        case_id: CaseId,
        update: &CaseDetailsUpdate,
    ) -> Result<Case, PortError>;

    /// Moves the case to `DISCHARGED` with the given date and receipt
    async fn mark_discharged(
        &self,
        branch_id: BranchId,
        case_id: CaseId,
        update: &DischargeUpdate,
    ) -> Result<Case, PortError>;

    async fn find_case_by_discharge_receipt(
        &self,
        branch_id: BranchId,
        receipt_no: &ReceiptNumber,
    ) -> Result<Option<Case>, PortError>;

    // ========================================================================
    // Charges
    // ========================================================================

    /// Inserts all charges in one call and recomputes the owning cases
    async fn insert_charges(&self, charges: &[Charge]) -> Result<Vec<Charge>, PortError>;

    /// Charges of a case in applied/creation order
    async fn list_charges(
        &self,
        branch_id: BranchId,
        case_id: CaseId,
    ) -> Result<Vec<Charge>, PortError>;

    /// Deletes a charge of the given case and branch and recomputes the
    /// case; a charge outside that case is `NotFound`
    async fn delete_charge(
        &self,
        branch_id: BranchId,
        case_id: CaseId,
        charge_id: ChargeId,
    ) -> Result<(), PortError>;

    // ========================================================================
    // Payments
    // ========================================================================

    /// Inserts a payment and recomputes the owning case
    async fn insert_payment(&self, payment: &Payment) -> Result<Payment, PortError>;

    /// Payments of a branch, newest first
    async fn list_payments(&self, branch_id: BranchId) -> Result<Vec<Payment>, PortError>;

    /// Deletes a payment of the given branch, recomputes the owning case
    /// and returns that case's id
    async fn delete_payment(
        &self,
        branch_id: BranchId,
        payment_id: PaymentId,
    ) -> Result<CaseId, PortError>;

    async fn find_payment_by_receipt(
        &self,
        branch_id: BranchId,
        receipt_no: &ReceiptNumber,
    ) -> Result<Option<Payment>, PortError>;
}

/// Receipt numbering port
///
/// Each call returns a number never returned before for the same branch
/// and receipt type, and greater than every earlier one.
#[async_trait]
pub trait ReceiptNumbering: DomainPort {
    async fn next_number(
        &self,
        branch_id: BranchId,
        receipt_type: ReceiptType,
    ) -> Result<ReceiptNumber, PortError>;
}

/// Mock implementations for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex as StdMutex};
    use tokio::sync::{Mutex, RwLock};
    use chrono::Utc;

    use core_kernel::{storage_days_between, Currency, HealthCheckResult, Money};
    use domain_billing::ChargeType;

    use crate::case::CaseStatus;
    use crate::invalidation::{StaleView, ViewInvalidator};

    /// Store operations that can be made to fail
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum StoreOperation {
        ListServices,
        InsertCharges,
        InsertCase,
        InsertPayment,
        MarkDischarged,
        GetCase,
    }

    #[derive(Debug, Default)]
    struct MockState {
        branches: Vec<Branch>,
        services: Vec<ServiceCatalogEntry>,
        cases: HashMap<CaseId, Case>,
        case_order: Vec<CaseId>,
        charges: Vec<Charge>,
        payments: Vec<Payment>,
    }

    impl MockState {
        fn branch_exists(&self, branch_id: BranchId) -> bool {
            self.branches.iter().any(|b| b.id == branch_id)
        }

        /// Mirrors the platform's recompute procedure
        fn recompute(&mut self, case_id: CaseId, currency: Currency) {
            let fee = |ty: ChargeType, charges: &[Charge]| {
                charges
                    .iter()
                    .filter(|c| c.case_id == case_id && c.charge_type == ty)
                    .fold(Money::zero(currency), |acc, c| acc + c.amount)
            };
            let total_bill = self
                .charges
                .iter()
                .filter(|c| c.case_id == case_id)
                .fold(Money::zero(currency), |acc, c| acc + c.amount);
            let total_paid = self
                .payments
                .iter()
                .filter(|p| p.case_id == case_id)
                .fold(Money::zero(currency), |acc, p| acc + p.amount);

            let embalming_fee = fee(ChargeType::Embalming, &self.charges);
            let coldroom_fee = fee(ChargeType::Coldroom, &self.charges);
            let storage_fee = fee(ChargeType::Storage, &self.charges);

            if let Some(case) = self.cases.get_mut(&case_id) {
                let f = &mut case.financials;
                f.embalming_fee = embalming_fee;
                f.coldroom_fee = coldroom_fee;
                f.storage_fee = storage_fee;
                f.total_bill = total_bill;
                f.total_paid = total_paid;
                f.balance = total_bill - total_paid;
                case.updated_at = Utc::now();
            }
        }
    }

    /// In-memory mock implementation of RecordStore
    #[derive(Debug)]
    pub struct InMemoryRecordStore {
        state: Arc<RwLock<MockState>>,
        failing: Arc<RwLock<HashSet<StoreOperation>>>,
        currency: Currency,
    }

    impl Default for InMemoryRecordStore {
        fn default() -> Self {
            Self::new(Currency::GHS)
        }
    }

    impl InMemoryRecordStore {
        /// Creates a new, empty store
        pub fn new(currency: Currency) -> Self {
            Self {
                state: Arc::new(RwLock::new(MockState::default())),
                failing: Arc::new(RwLock::new(HashSet::new())),
                currency,
            }
        }

        /// Pre-populates with a branch for testing
        pub async fn with_branch(self, branch: Branch) -> Self {
            self.state.write().await.branches.push(branch);
            self
        }

        /// Pre-populates catalog entries in the given order
        pub async fn with_services(self, services: Vec<ServiceCatalogEntry>) -> Self {
            self.state.write().await.services.extend(services);
            self
        }

        /// Makes every later call of `op` fail with a connection error
        pub async fn fail_on(&self, op: StoreOperation) {
            self.failing.write().await.insert(op);
        }

        pub async fn clear_failures(&self) {
            self.failing.write().await.clear();
        }

        /// Code of a stored branch
        pub async fn branch_code(&self, branch_id: BranchId) -> Option<String> {
            self.state
                .read()
                .await
                .branches
                .iter()
                .find(|b| b.id == branch_id)
                .map(|b| b.code.clone())
        }

        /// Number of cases held, across all branches
        pub async fn case_count(&self) -> usize {
            self.state.read().await.cases.len()
        }

        /// All charges of a case, regardless of branch
        pub async fn charges_of(&self, case_id: CaseId) -> Vec<Charge> {
            self.state
                .read()
                .await
                .charges
                .iter()
                .filter(|c| c.case_id == case_id)
                .cloned()
                .collect()
        }

        async fn check(&self, op: StoreOperation) -> Result<(), PortError> {
            if self.failing.read().await.contains(&op) {
                return Err(PortError::connection(format!("injected failure: {:?}", op)));
            }
            Ok(())
        }
    }

    impl DomainPort for InMemoryRecordStore {}

    #[async_trait]
    impl HealthCheckable for InMemoryRecordStore {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("mock-record-store", 0)
        }
    }

    #[async_trait]
    impl RecordStore for InMemoryRecordStore {
        async fn insert_branch(&self, branch: &Branch) -> Result<Branch, PortError> {
            let mut state = self.state.write().await;
            if state.branches.iter().any(|b| b.code == branch.code) {
                return Err(PortError::duplicate(format!("branch code {}", branch.code)));
            }
            state.branches.push(branch.clone());
            Ok(branch.clone())
        }

        async fn list_branches(&self) -> Result<Vec<Branch>, PortError> {
            let mut branches = self.state.read().await.branches.clone();
            branches.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(branches)
        }

        async fn delete_branch(&self, branch_id: BranchId) -> Result<(), PortError> {
            let mut state = self.state.write().await;
            if !state.branch_exists(branch_id) {
                return Err(PortError::not_found("Branch", branch_id));
            }
            let referenced = state.cases.values().any(|c| c.branch_id == branch_id)
                || state.services.iter().any(|s| s.branch_id == branch_id)
                || state.payments.iter().any(|p| p.branch_id == branch_id);
            if referenced {
                return Err(PortError::reference_violation(format!(
                    "branch {} is still referenced",
                    branch_id
                )));
            }
            state.branches.retain(|b| b.id != branch_id);
            Ok(())
        }

        async fn list_services(
            &self,
            branch_id: BranchId,
            active_only: bool,
        ) -> Result<Vec<ServiceCatalogEntry>, PortError> {
            self.check(StoreOperation::ListServices).await?;
            Ok(self
                .state
                .read()
                .await
                .services
                .iter()
                .filter(|s| s.branch_id == branch_id && (!active_only || s.is_active))
                .cloned()
                .collect())
        }

        async fn upsert_service(
            &self,
            entry: &ServiceCatalogEntry,
        ) -> Result<ServiceCatalogEntry, PortError> {
            let mut state = self.state.write().await;
            if !state.branch_exists(entry.branch_id) {
                return Err(PortError::reference_violation("unknown branch"));
            }
            match state.services.iter_mut().find(|s| s.id == entry.id) {
                Some(existing) if existing.branch_id != entry.branch_id => {
                    return Err(PortError::not_found("Service", entry.id));
                }
                Some(existing) => *existing = entry.clone(),
                None => state.services.push(entry.clone()),
            }
            Ok(entry.clone())
        }

        async fn delete_service(
            &self,
            branch_id: BranchId,
            service_id: ServiceId,
        ) -> Result<(), PortError> {
            let mut state = self.state.write().await;
            if !state
                .services
                .iter()
                .any(|s| s.id == service_id && s.branch_id == branch_id)
            {
                return Err(PortError::not_found("Service", service_id));
            }
            if state.charges.iter().any(|c| c.service_id == Some(service_id)) {
                return Err(PortError::reference_violation(format!(
                    "service {} is referenced by charges",
                    service_id
                )));
            }
            state.services.retain(|s| s.id != service_id);
            Ok(())
        }

        async fn insert_case(&self, case: &Case) -> Result<Case, PortError> {
            self.check(StoreOperation::InsertCase).await?;
            let mut state = self.state.write().await;
            if !state.branch_exists(case.branch_id) {
                return Err(PortError::reference_violation("unknown branch"));
            }
            if state
                .cases
                .values()
                .any(|c| c.branch_id == case.branch_id && c.tag_no == case.tag_no)
            {
                return Err(PortError::duplicate(format!("tag_no {}", case.tag_no)));
            }
            state.cases.insert(case.id, case.clone());
            state.case_order.push(case.id);
            Ok(case.clone())
        }

        async fn get_case(
            &self,
            branch_id: BranchId,
            case_id: CaseId,
        ) -> Result<Option<Case>, PortError> {
            self.check(StoreOperation::GetCase).await?;
            Ok(self
                .state
                .read()
                .await
                .cases
                .get(&case_id)
                .filter(|c| c.branch_id == branch_id)
                .cloned())
        }

        async fn list_cases(
            &self,
            branch_id: BranchId,
            query: CaseQuery,
        ) -> Result<Vec<Case>, PortError> {
            let state = self.state.read().await;
            let limit = query.limit.map_or(usize::MAX, |l| l as usize);
            Ok(state
                .case_order
                .iter()
                .rev()
                .filter_map(|id| state.cases.get(id))
                .filter(|c| c.branch_id == branch_id && query.matches(c))
                .take(limit)
                .cloned()
                .collect())
        }

        async fn update_case_details(
            &self,
            branch_id: BranchId,
            case_id: CaseId,
            update: &CaseDetailsUpdate,
        ) -> Result<Case, PortError> {
            let mut state = self.state.write().await;
            if let Some(tag_no) = &update.tag_no {
                if state.cases.values().any(|c| {
                    c.branch_id == branch_id && c.id != case_id && &c.tag_no == tag_no
                }) {
                    return Err(PortError::duplicate(format!("tag_no {}", tag_no)));
                }
            }
            let case = state
                .cases
                .get_mut(&case_id)
                .filter(|c| c.branch_id == branch_id)
                .ok_or_else(|| PortError::not_found("Case", case_id))?;
            case.apply_details(update);
            Ok(case.clone())
        }

        async fn mark_discharged(
            &self,
            branch_id: BranchId,
            case_id: CaseId,
            update: &DischargeUpdate,
        ) -> Result<Case, PortError> {
            self.check(StoreOperation::MarkDischarged).await?;
            let mut state = self.state.write().await;
            let case = state
                .cases
                .get_mut(&case_id)
                .filter(|c| c.branch_id == branch_id)
                .ok_or_else(|| PortError::not_found("Case", case_id))?;
            if case.status != CaseStatus::InCustody {
                return Err(PortError::conflict(format!("case {} is {}", case_id, case.status)));
            }
            case.status = CaseStatus::Discharged;
            case.discharge_date = Some(update.discharge_date);
            case.discharge_receipt_no = Some(update.receipt_no.clone());
            case.storage_days = Some(storage_days_between(case.admission_date, update.discharge_date));
            case.updated_at = Utc::now();
            Ok(case.clone())
        }

        async fn find_case_by_discharge_receipt(
            &self,
            branch_id: BranchId,
            receipt_no: &ReceiptNumber,
        ) -> Result<Option<Case>, PortError> {
            Ok(self
                .state
                .read()
                .await
                .cases
                .values()
                .find(|c| {
                    c.branch_id == branch_id && c.discharge_receipt_no.as_ref() == Some(receipt_no)
                })
                .cloned())
        }

        async fn insert_charges(&self, charges: &[Charge]) -> Result<Vec<Charge>, PortError> {
            self.check(StoreOperation::InsertCharges).await?;
            let mut state = self.state.write().await;
            for charge in charges {
                let owner_ok = state
                    .cases
                    .get(&charge.case_id)
                    .map_or(false, |c| c.branch_id == charge.branch_id);
                if !owner_ok {
                    return Err(PortError::reference_violation(format!(
                        "case {} does not exist",
                        charge.case_id
                    )));
                }
            }
            state.charges.extend(charges.iter().cloned());
            let owners: HashSet<CaseId> = charges.iter().map(|c| c.case_id).collect();
            for case_id in owners {
                state.recompute(case_id, self.currency);
            }
            Ok(charges.to_vec())
        }

        async fn list_charges(
            &self,
            branch_id: BranchId,
            case_id: CaseId,
        ) -> Result<Vec<Charge>, PortError> {
            let mut charges: Vec<Charge> = self
                .state
                .read()
                .await
                .charges
                .iter()
                .filter(|c| c.branch_id == branch_id && c.case_id == case_id)
                .cloned()
                .collect();
            charges.sort_by_key(|c| (c.applied_on, c.created_at));
            Ok(charges)
        }

        async fn delete_charge(
            &self,
            branch_id: BranchId,
            case_id: CaseId,
            charge_id: ChargeId,
        ) -> Result<(), PortError> {
            let mut state = self.state.write().await;
            let position = state
                .charges
                .iter()
                .position(|c| c.id == charge_id && c.case_id == case_id && c.branch_id == branch_id)
                .ok_or_else(|| PortError::not_found("Charge", charge_id))?;
            let removed = state.charges.remove(position);
            state.recompute(removed.case_id, self.currency);
            Ok(())
        }

        async fn insert_payment(&self, payment: &Payment) -> Result<Payment, PortError> {
            self.check(StoreOperation::InsertPayment).await?;
            let mut state = self.state.write().await;
            let owner_ok = state
                .cases
                .get(&payment.case_id)
                .map_or(false, |c| c.branch_id == payment.branch_id);
            if !owner_ok {
                return Err(PortError::reference_violation(format!(
                    "case {} does not exist",
                    payment.case_id
                )));
            }
            if state.payments.iter().any(|p| p.receipt_no == payment.receipt_no) {
                return Err(PortError::duplicate(format!("receipt_no {}", payment.receipt_no)));
            }
            state.payments.push(payment.clone());
            state.recompute(payment.case_id, self.currency);
            Ok(payment.clone())
        }

        async fn list_payments(&self, branch_id: BranchId) -> Result<Vec<Payment>, PortError> {
            let state = self.state.read().await;
            let mut payments: Vec<Payment> = state
                .payments
                .iter()
                .rev()
                .filter(|p| p.branch_id == branch_id)
                .cloned()
                .collect();
            payments.sort_by(|a, b| b.paid_on.cmp(&a.paid_on));
            Ok(payments)
        }

        async fn delete_payment(
            &self,
            branch_id: BranchId,
            payment_id: PaymentId,
        ) -> Result<CaseId, PortError> {
            let mut state = self.state.write().await;
            let position = state
                .payments
                .iter()
                .position(|p| p.id == payment_id && p.branch_id == branch_id)
                .ok_or_else(|| PortError::not_found("Payment", payment_id))?;
            let removed = state.payments.remove(position);
            state.recompute(removed.case_id, self.currency);
            Ok(removed.case_id)
        }

        async fn find_payment_by_receipt(
            &self,
            branch_id: BranchId,
            receipt_no: &ReceiptNumber,
        ) -> Result<Option<Payment>, PortError> {
            Ok(self
                .state
                .read()
                .await
                .payments
                .iter()
                .find(|p| p.branch_id == branch_id && &p.receipt_no == receipt_no)
                .cloned())
        }
    }

    /// In-memory receipt numbering, one counter per branch and type
    ///
    /// Reads branch codes from the store it numbers for, like the
    /// database sequence does.
    #[derive(Debug)]
    pub struct InMemoryReceiptNumbering {
        store: Arc<InMemoryRecordStore>,
        sequences: Mutex<HashMap<(BranchId, ReceiptType), i64>>,
        requests: Mutex<Vec<(BranchId, ReceiptType)>>,
        calls: AtomicUsize,
    }

    impl InMemoryReceiptNumbering {
        pub fn new(store: Arc<InMemoryRecordStore>) -> Self {
            Self {
                store,
                sequences: Mutex::new(HashMap::new()),
                requests: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
            }
        }

        /// Number of times a receipt number was requested
        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        /// Every request made so far, in order
        pub async fn requests(&self) -> Vec<(BranchId, ReceiptType)> {
            self.requests.lock().await.clone()
        }
    }

    impl DomainPort for InMemoryReceiptNumbering {}

    #[async_trait]
    impl ReceiptNumbering for InMemoryReceiptNumbering {
        async fn next_number(
            &self,
            branch_id: BranchId,
            receipt_type: ReceiptType,
        ) -> Result<ReceiptNumber, PortError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().await.push((branch_id, receipt_type));

            let code = self
                .store
                .branch_code(branch_id)
                .await
                .ok_or_else(|| PortError::not_found("Branch", branch_id))?;

            let mut sequences = self.sequences.lock().await;
            let next = sequences.entry((branch_id, receipt_type)).or_insert(0);
            *next += 1;
            Ok(ReceiptNumber::format(&receipt_type.branch_prefix(&code), *next))
        }
    }

    /// Records every stale view it is told about
    #[derive(Debug, Default)]
    pub struct RecordingInvalidator {
        views: StdMutex<Vec<StaleView>>,
    }

    impl RecordingInvalidator {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn views(&self) -> Vec<StaleView> {
            self.views
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .clone()
        }

        pub fn contains(&self, view: &StaleView) -> bool {
            self.views().contains(view)
        }

        pub fn clear(&self) {
            self.views
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .clear();
        }
    }

    impl ViewInvalidator for RecordingInvalidator {
        fn invalidate(&self, views: &[StaleView]) {
            self.views
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .extend_from_slice(views);
        }
    }
}
