//! PostgreSQL Record Store
//!
//! Implements the case domain's `RecordStore` port over the schema in
//! `migrations/`. Every charge or payment mutation runs in one transaction
//! together with `update_case_financials`, so the case snapshot is never
//! observed stale after a successful call.

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{
    BranchId, CaseId, ChargeId, Currency, DomainPort, HealthCheckResult, HealthCheckable,
    PaymentId, PortError, ServiceId,
};
use domain_billing::{Charge, Payment, ReceiptNumber, ServiceCatalogEntry};
use domain_case::{Branch, Case, CaseDetailsUpdate, CaseQuery, DischargeUpdate, RecordStore};

use crate::error::DatabaseError;
use crate::rows::{BranchRow, CaseRow, ChargeRow, PaymentRow, ServiceRow};

/// PostgreSQL-backed implementation of the `RecordStore` port
///
/// Amounts are stored as `NUMERIC` without a currency column; every value
/// read back is tagged with the currency the store was created with.
#[derive(Debug, Clone)]
pub struct PgRecordStore {
    pool: PgPool,
    currency: Currency,
}

impl PgRecordStore {
    pub fn new(pool: PgPool, currency: Currency) -> Self {
        Self { pool, currency }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_case(
        &self,
        conn: &mut PgConnection,
        branch_id: BranchId,
        case_id: CaseId,
    ) -> Result<Option<Case>, DatabaseError> {
        sqlx::query_as::<_, CaseRow>("SELECT * FROM cases WHERE case_id = $1 AND branch_id = $2")
            .bind(Uuid::from(case_id))
            .bind(Uuid::from(branch_id))
            .fetch_optional(conn)
            .await?
            .map(|row| row.into_domain(self.currency))
            .transpose()
    }
}

/// Refreshes the owning case's fee breakdown and totals
async fn recompute(conn: &mut PgConnection, case_id: Uuid) -> Result<(), DatabaseError> {
    sqlx::query("SELECT update_case_financials($1)")
        .bind(case_id)
        .execute(conn)
        .await?;
    Ok(())
}

fn to_i32(field: &'static str, value: Option<u32>) -> Result<Option<i32>, PortError> {
    value
        .map(i32::try_from)
        .transpose()
        .map_err(|_| PortError::validation_field(format!("{} is out of range", field), field))
}

impl DomainPort for PgRecordStore {}

#[async_trait]
impl HealthCheckable for PgRecordStore {
    /// Performs a simple SELECT 1 to verify the pool is operational
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();

        let result = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await;

        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(_) => HealthCheckResult::healthy("postgres-record-store", latency_ms),
            Err(e) => HealthCheckResult::unhealthy(
                "postgres-record-store",
                latency_ms,
                format!("Database error: {}", e),
            ),
        }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    #[instrument(skip(self, branch), fields(code = %branch.code))]
    async fn insert_branch(&self, branch: &Branch) -> Result<Branch, PortError> {
        debug!("Inserting branch");

        let row = sqlx::query_as::<_, BranchRow>(
            r#"
            INSERT INTO branches (branch_id, name, code, address, phone, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::from(branch.id))
        .bind(&branch.name)
        .bind(&branch.code)
        .bind(&branch.address)
        .bind(&branch.phone)
        .bind(branch.is_active)
        .bind(branch.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        Ok(row.into())
    }

    async fn list_branches(&self) -> Result<Vec<Branch>, PortError> {
        let rows = sqlx::query_as::<_, BranchRow>("SELECT * FROM branches ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::from)?;

        Ok(rows.into_iter().map(Branch::from).collect())
    }

    #[instrument(skip(self), fields(branch_id = %branch_id))]
    async fn delete_branch(&self, branch_id: BranchId) -> Result<(), PortError> {
        debug!("Deleting branch");

        let result = sqlx::query("DELETE FROM branches WHERE branch_id = $1")
            .bind(Uuid::from(branch_id))
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from)?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Branch", branch_id).into());
        }
        Ok(())
    }

    async fn list_services(
        &self,
        branch_id: BranchId,
        active_only: bool,
    ) -> Result<Vec<ServiceCatalogEntry>, PortError> {
        let rows = sqlx::query_as::<_, ServiceRow>(
            r#"
            SELECT * FROM service_catalog
            WHERE branch_id = $1 AND (NOT $2 OR is_active)
            ORDER BY created_at, name
            "#,
        )
        .bind(Uuid::from(branch_id))
        .bind(active_only)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        rows.into_iter()
            .map(|row| row.into_domain(self.currency).map_err(PortError::from))
            .collect()
    }

    #[instrument(skip(self, entry), fields(service_id = %entry.id))]
    async fn upsert_service(
        &self,
        entry: &ServiceCatalogEntry,
    ) -> Result<ServiceCatalogEntry, PortError> {
        debug!("Upserting catalog entry");

        let row = sqlx::query_as::<_, ServiceRow>(
            r#"
            INSERT INTO service_catalog (service_id, branch_id, name, pricing_model, unit_price, is_active)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (service_id) DO UPDATE SET
                name = EXCLUDED.name,
                pricing_model = EXCLUDED.pricing_model,
                unit_price = EXCLUDED.unit_price,
                is_active = EXCLUDED.is_active
            WHERE service_catalog.branch_id = EXCLUDED.branch_id
            RETURNING *
            "#,
        )
        .bind(Uuid::from(entry.id))
        .bind(Uuid::from(entry.branch_id))
        .bind(&entry.name)
        .bind(entry.pricing_model.as_str())
        .bind(entry.unit_price.amount())
        .bind(entry.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?
        .ok_or_else(|| DatabaseError::not_found("Service", entry.id))?;

        Ok(row.into_domain(self.currency)?)
    }

    #[instrument(skip(self), fields(service_id = %service_id))]
    async fn delete_service(
        &self,
        branch_id: BranchId,
        service_id: ServiceId,
    ) -> Result<(), PortError> {
        let result = sqlx::query("DELETE FROM service_catalog WHERE service_id = $1 AND branch_id = $2")
            .bind(Uuid::from(service_id))
            .bind(Uuid::from(branch_id))
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from)?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Service", service_id).into());
        }
        Ok(())
    }

    #[instrument(skip(self, case), fields(case_id = %case.id, tag_no = %case.tag_no))]
    async fn insert_case(&self, case: &Case) -> Result<Case, PortError> {
        debug!("Inserting case");

        let row = sqlx::query_as::<_, CaseRow>(
            r#"
            INSERT INTO cases (
                case_id, branch_id, tag_no, name_of_deceased, age, gender, place,
                relative_name, relative_contact, relative_contact_alt,
                admission_date, admission_time, case_type, status, notes,
                created_by, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            RETURNING *
            "#,
        )
        .bind(Uuid::from(case.id))
        .bind(Uuid::from(case.branch_id))
        .bind(&case.tag_no)
        .bind(&case.deceased.name)
        .bind(to_i32("age", case.deceased.age)?)
        .bind(case.deceased.gender.map(|g| g.as_str()))
        .bind(&case.deceased.place)
        .bind(&case.relative.name)
        .bind(&case.relative.contact)
        .bind(&case.relative.alt_contact)
        .bind(case.admission_date)
        .bind(case.admission_time)
        .bind(case.case_type.as_str())
        .bind(case.status.as_str())
        .bind(&case.notes)
        .bind(case.created_by.map(Uuid::from))
        .bind(case.created_at)
        .bind(case.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        Ok(row.into_domain(self.currency)?)
    }

    async fn get_case(
        &self,
        branch_id: BranchId,
        case_id: CaseId,
    ) -> Result<Option<Case>, PortError> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        Ok(self.fetch_case(&mut conn, branch_id, case_id).await?)
    }

    async fn list_cases(
        &self,
        branch_id: BranchId,
        query: CaseQuery,
    ) -> Result<Vec<Case>, PortError> {
        let rows = sqlx::query_as::<_, CaseRow>(
            r#"
            SELECT * FROM cases
            WHERE branch_id = $1 AND ($2::text IS NULL OR status = $2)
            ORDER BY admission_date DESC, created_at DESC
            LIMIT $3
            "#,
        )
        .bind(Uuid::from(branch_id))
        .bind(query.status.map(|s| s.as_str()))
        .bind(query.limit.map(i64::from))
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        rows.into_iter()
            .map(|row| row.into_domain(self.currency).map_err(PortError::from))
            .collect()
    }

    #[instrument(skip(self, update), fields(case_id = %case_id))]
    async fn update_case_details(
        &self,
        branch_id: BranchId,
        case_id: CaseId,
        update: &CaseDetailsUpdate,
    ) -> Result<Case, PortError> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from)?;

        let mut case = self
            .fetch_case(&mut tx, branch_id, case_id)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Case", case_id))?;
        case.apply_details(update);

        let row = sqlx::query_as::<_, CaseRow>(
            r#"
            UPDATE cases SET
                tag_no = $3, name_of_deceased = $4, age = $5, gender = $6, place = $7,
                relative_name = $8, relative_contact = $9, relative_contact_alt = $10,
                admission_date = $11, admission_time = $12, case_type = $13, notes = $14,
                updated_at = now()
            WHERE case_id = $1 AND branch_id = $2
            RETURNING *
            "#,
        )
        .bind(Uuid::from(case_id))
        .bind(Uuid::from(branch_id))
        .bind(&case.tag_no)
        .bind(&case.deceased.name)
        .bind(to_i32("age", case.deceased.age)?)
        .bind(case.deceased.gender.map(|g| g.as_str()))
        .bind(&case.deceased.place)
        .bind(&case.relative.name)
        .bind(&case.relative.contact)
        .bind(&case.relative.alt_contact)
        .bind(case.admission_date)
        .bind(case.admission_time)
        .bind(case.case_type.as_str())
        .bind(&case.notes)
        .fetch_one(&mut *tx)
        .await
        .map_err(DatabaseError::from)?;

        tx.commit().await.map_err(DatabaseError::from)?;
        Ok(row.into_domain(self.currency)?)
    }

    #[instrument(skip(self, update), fields(case_id = %case_id, receipt_no = %update.receipt_no))]
    async fn mark_discharged(
        &self,
        branch_id: BranchId,
        case_id: CaseId,
        update: &DischargeUpdate,
    ) -> Result<Case, PortError> {
        debug!("Marking case discharged");

        let row = sqlx::query_as::<_, CaseRow>(
            r#"
            UPDATE cases SET
                status = 'DISCHARGED',
                discharge_date = $3,
                discharge_receipt_no = $4,
                storage_days = ABS($3::date - admission_date),
                updated_at = now()
            WHERE case_id = $1 AND branch_id = $2 AND status = 'IN_CUSTODY'
            RETURNING *
            "#,
        )
        .bind(Uuid::from(case_id))
        .bind(Uuid::from(branch_id))
        .bind(update.discharge_date)
        .bind(update.receipt_no.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        if let Some(row) = row {
            return Ok(row.into_domain(self.currency)?);
        }

        // Nothing updated: either the case is missing or it already left custody.
        let status: Option<String> = sqlx::query_scalar::<_, String>(
            "SELECT status FROM cases WHERE case_id = $1 AND branch_id = $2",
        )
        .bind(Uuid::from(case_id))
        .bind(Uuid::from(branch_id))
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        match status {
            Some(status) => Err(PortError::conflict(format!("case {} is {}", case_id, status))),
            None => Err(DatabaseError::not_found("Case", case_id).into()),
        }
    }

    async fn find_case_by_discharge_receipt(
        &self,
        branch_id: BranchId,
        receipt_no: &ReceiptNumber,
    ) -> Result<Option<Case>, PortError> {
        let row = sqlx::query_as::<_, CaseRow>(
            "SELECT * FROM cases WHERE branch_id = $1 AND discharge_receipt_no = $2",
        )
        .bind(Uuid::from(branch_id))
        .bind(receipt_no.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        Ok(row.map(|r| r.into_domain(self.currency)).transpose()?)
    }

    #[instrument(skip(self, charges), fields(count = charges.len()))]
    async fn insert_charges(&self, charges: &[Charge]) -> Result<Vec<Charge>, PortError> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from)?;
        let mut inserted = Vec::with_capacity(charges.len());
        let mut touched: Vec<Uuid> = Vec::new();

        for charge in charges {
            let row = sqlx::query_as::<_, ChargeRow>(
                r#"
                INSERT INTO charges (
                    charge_id, case_id, branch_id, service_id, description, quantity,
                    unit_price, amount, charge_type, applied_on, auto_generated,
                    created_by, created_at
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
                RETURNING *
                "#,
            )
            .bind(Uuid::from(charge.id))
            .bind(Uuid::from(charge.case_id))
            .bind(Uuid::from(charge.branch_id))
            .bind(charge.service_id.map(Uuid::from))
            .bind(&charge.description)
            .bind(charge.quantity)
            .bind(charge.unit_price.amount())
            .bind(charge.amount.amount())
            .bind(charge.charge_type.as_str())
            .bind(charge.applied_on)
            .bind(charge.auto_generated)
            .bind(charge.created_by.map(Uuid::from))
            .bind(charge.created_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(DatabaseError::from)?;

            if !touched.contains(&row.case_id) {
                touched.push(row.case_id);
            }
            inserted.push(row.into_domain(self.currency)?);
        }

        for case_id in touched {
            recompute(&mut tx, case_id).await?;
        }

        tx.commit().await.map_err(DatabaseError::from)?;
        Ok(inserted)
    }

    async fn list_charges(
        &self,
        branch_id: BranchId,
        case_id: CaseId,
    ) -> Result<Vec<Charge>, PortError> {
        let rows = sqlx::query_as::<_, ChargeRow>(
            r#"
            SELECT * FROM charges
            WHERE case_id = $1 AND branch_id = $2
            ORDER BY applied_on, created_at
            "#,
        )
        .bind(Uuid::from(case_id))
        .bind(Uuid::from(branch_id))
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        rows.into_iter()
            .map(|row| row.into_domain(self.currency).map_err(PortError::from))
            .collect()
    }

    #[instrument(skip(self), fields(branch_id = %branch_id, case_id = %case_id, charge_id = %charge_id))]
    async fn delete_charge(
        &self,
        branch_id: BranchId,
        case_id: CaseId,
        charge_id: ChargeId,
    ) -> Result<(), PortError> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from)?;

        let case_id: Uuid = sqlx::query_scalar::<_, Uuid>(
            "DELETE FROM charges WHERE charge_id = $1 AND case_id = $2 AND branch_id = $3 RETURNING case_id",
        )
        .bind(Uuid::from(charge_id))
        .bind(Uuid::from(case_id))
        .bind(Uuid::from(branch_id))
        .fetch_optional(&mut *tx)
        .await
        .map_err(DatabaseError::from)?
        .ok_or_else(|| DatabaseError::not_found("Charge", charge_id))?;

        recompute(&mut tx, case_id).await?;
        tx.commit().await.map_err(DatabaseError::from)?;
        Ok(())
    }

    #[instrument(skip(self, payment), fields(payment_id = %payment.id, receipt_no = %payment.receipt_no))]
    async fn insert_payment(&self, payment: &Payment) -> Result<Payment, PortError> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from)?;

        let owned: Option<Uuid> = sqlx::query_scalar::<_, Uuid>(
            "SELECT case_id FROM cases WHERE case_id = $1 AND branch_id = $2 FOR UPDATE",
        )
        .bind(Uuid::from(payment.case_id))
        .bind(Uuid::from(payment.branch_id))
        .fetch_optional(&mut *tx)
        .await
        .map_err(DatabaseError::from)?;

        if owned.is_none() {
            return Err(PortError::reference_violation(format!(
                "case {} does not belong to branch {}",
                payment.case_id, payment.branch_id
            )));
        }

        let row = sqlx::query_as::<_, PaymentRow>(
            r#"
            INSERT INTO payments (
                payment_id, branch_id, case_id, amount, method, allocation,
                receipt_no, received_by, note, paid_on
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(Uuid::from(payment.id))
        .bind(Uuid::from(payment.branch_id))
        .bind(Uuid::from(payment.case_id))
        .bind(payment.amount.amount())
        .bind(payment.method.as_str())
        .bind(payment.allocation.as_str())
        .bind(payment.receipt_no.as_str())
        .bind(Uuid::from(payment.received_by))
        .bind(&payment.note)
        .bind(payment.paid_on)
        .fetch_one(&mut *tx)
        .await
        .map_err(DatabaseError::from)?;

        recompute(&mut tx, row.case_id).await?;
        tx.commit().await.map_err(DatabaseError::from)?;

        Ok(row.into_domain(self.currency)?)
    }

    async fn list_payments(&self, branch_id: BranchId) -> Result<Vec<Payment>, PortError> {
        let rows = sqlx::query_as::<_, PaymentRow>(
            "SELECT * FROM payments WHERE branch_id = $1 ORDER BY paid_on DESC",
        )
        .bind(Uuid::from(branch_id))
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        rows.into_iter()
            .map(|row| row.into_domain(self.currency).map_err(PortError::from))
            .collect()
    }

    #[instrument(skip(self), fields(payment_id = %payment_id))]
    async fn delete_payment(
        &self,
        branch_id: BranchId,
        payment_id: PaymentId,
    ) -> Result<CaseId, PortError> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from)?;

        let case_id: Uuid = sqlx::query_scalar::<_, Uuid>(
            "DELETE FROM payments WHERE payment_id = $1 AND branch_id = $2 RETURNING case_id",
        )
        .bind(Uuid::from(payment_id))
        .bind(Uuid::from(branch_id))
        .fetch_optional(&mut *tx)
        .await
        .map_err(DatabaseError::from)?
        .ok_or_else(|| DatabaseError::not_found("Payment", payment_id))?;

        recompute(&mut tx, case_id).await?;
        tx.commit().await.map_err(DatabaseError::from)?;
        Ok(CaseId::from(case_id))
    }

    async fn find_payment_by_receipt(
        &self,
        branch_id: BranchId,
        receipt_no: &ReceiptNumber,
    ) -> Result<Option<Payment>, PortError> {
        let row = sqlx::query_as::<_, PaymentRow>(
            "SELECT * FROM payments WHERE branch_id = $1 AND receipt_no = $2",
        )
        .bind(Uuid::from(branch_id))
        .bind(receipt_no.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        Ok(row.map(|r| r.into_domain(self.currency)).transpose()?)
    }
}
