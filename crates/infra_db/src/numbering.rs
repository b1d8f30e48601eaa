//! PostgreSQL Receipt Numbering
//!
//! Receipt numbers come from the `receipt_sequences` table, one row per
//! branch and receipt type. A single upsert with `RETURNING` increments the
//! counter under the row lock, so concurrent callers never see the same
//! number and numbers only grow. The prefix of a new row is the branch
//! code followed by the type prefix (`ACC-PAY`), which keeps numbers
//! unique across branches.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{BranchId, DomainPort, PortError};
use domain_billing::{ReceiptNumber, ReceiptType};
use domain_case::ReceiptNumbering;

use crate::error::DatabaseError;

#[derive(Debug, Clone)]
pub struct PgReceiptNumbering {
    pool: PgPool,
}

impl PgReceiptNumbering {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl DomainPort for PgReceiptNumbering {}

#[async_trait]
impl ReceiptNumbering for PgReceiptNumbering {
    #[instrument(skip(self), fields(branch_id = %branch_id, receipt_type = %receipt_type))]
    async fn next_number(
        &self,
        branch_id: BranchId,
        receipt_type: ReceiptType,
    ) -> Result<ReceiptNumber, PortError> {
        // First use of a (branch, type) pair creates its sequence row.
        // An unknown branch selects no row and nothing is returned.
        let row = sqlx::query_as::<_, (String, i64)>(
            r#"
            INSERT INTO receipt_sequences (branch_id, receipt_type, prefix, next_number)
            SELECT b.branch_id, $2, b.code || '-' || $3, 1
            FROM branches b
            WHERE b.branch_id = $1
            ON CONFLICT (branch_id, receipt_type)
            DO UPDATE SET next_number = receipt_sequences.next_number + 1
            RETURNING prefix, next_number
            "#,
        )
        .bind(Uuid::from(branch_id))
        .bind(receipt_type.as_str())
        .bind(receipt_type.default_prefix())
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        let (prefix, number) =
            row.ok_or_else(|| DatabaseError::not_found("Branch", branch_id))?;

        let receipt_no = ReceiptNumber::format(&prefix, number);
        debug!(receipt_no = %receipt_no, "Allocated receipt number");
        Ok(receipt_no)
    }
}
