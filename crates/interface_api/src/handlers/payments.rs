//! Payment handlers

use axum::{extract::State, http::StatusCode, Json};

use core_kernel::{BranchId, PaymentId};
use domain_billing::Payment;

use crate::auth::require_branch;
use crate::dto::billing::{PaymentResponse, RecordPaymentBody};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, AuthContext};
use crate::AppState;

/// Lists a branch's payments, newest first
pub async fn list_payments(
    State(state): State<AppState>,
    AuthContext(ctx): AuthContext,
    ApiPath(branch_id): ApiPath<BranchId>,
) -> Result<Json<Vec<Payment>>, ApiError> {
    require_branch(&ctx, branch_id)?;
    let payments = state.services.payments.list_payments(&ctx, branch_id).await?;
    Ok(Json(payments))
}

/// Records a payment and returns its receipt
pub async fn record_payment(
    State(state): State<AppState>,
    AuthContext(ctx): AuthContext,
    ApiPath(branch_id): ApiPath<BranchId>,
    ApiJson(body): ApiJson<RecordPaymentBody>,
) -> Result<(StatusCode, Json<PaymentResponse>), ApiError> {
    require_branch(&ctx, branch_id)?;
    let request = body.into_request(branch_id)?;
    let receipt = state.services.payments.record_payment(&ctx, request).await?;
    Ok((StatusCode::CREATED, Json(receipt.into())))
}

pub async fn void_payment(
    State(state): State<AppState>,
    AuthContext(ctx): AuthContext,
    ApiPath((branch_id, payment_id)): ApiPath<(BranchId, PaymentId)>,
) -> Result<StatusCode, ApiError> {
    require_branch(&ctx, branch_id)?;
    state.services.payments.void_payment(&ctx, payment_id, branch_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
