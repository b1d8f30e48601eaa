//! Discharge handlers

use axum::{extract::State, Json};

use core_kernel::{BranchId, CaseId};
use domain_case::DischargePreview;

use crate::auth::require_branch;
use crate::dto::billing::{DischargeBody, DischargeQuery, DischargeResponse};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery, AuthContext};
use crate::AppState;

/// Storage days and balance as they would be on `?date=` (default today)
pub async fn preview_discharge(
    State(state): State<AppState>,
    AuthContext(ctx): AuthContext,
    ApiPath((branch_id, case_id)): ApiPath<(BranchId, CaseId)>,
    ApiQuery(query): ApiQuery<DischargeQuery>,
) -> Result<Json<DischargePreview>, ApiError> {
    require_branch(&ctx, branch_id)?;
    let preview = state
        .services
        .discharge
        .preview_discharge(&ctx, branch_id, case_id, query.date)
        .await?;
    Ok(Json(preview))
}

/// Discharges a case. Requires `confirm_payment`.
pub async fn discharge_case(
    State(state): State<AppState>,
    AuthContext(ctx): AuthContext,
    ApiPath((branch_id, case_id)): ApiPath<(BranchId, CaseId)>,
    ApiJson(body): ApiJson<DischargeBody>,
) -> Result<Json<DischargeResponse>, ApiError> {
    require_branch(&ctx, branch_id)?;
    let receipt = state
        .services
        .discharge
        .discharge(&ctx, body.into_request(branch_id, case_id))
        .await?;
    Ok(Json(receipt.into()))
}
