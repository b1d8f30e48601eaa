//! Charge ledger handlers

use axum::{extract::State, http::StatusCode, Json};

use core_kernel::{BranchId, CaseId, ChargeId};
use domain_billing::Charge;

use crate::auth::require_branch;
use crate::dto::billing::AddChargeBody;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, AuthContext};
use crate::AppState;

pub async fn list_charges(
    State(state): State<AppState>,
    AuthContext(ctx): AuthContext,
    ApiPath((branch_id, case_id)): ApiPath<(BranchId, CaseId)>,
) -> Result<Json<Vec<Charge>>, ApiError> {
    require_branch(&ctx, branch_id)?;
    let charges = state.services.ledger.list_charges(&ctx, branch_id, case_id).await?;
    Ok(Json(charges))
}

/// Adds a manual charge to a case
pub async fn add_charge(
    State(state): State<AppState>,
    AuthContext(ctx): AuthContext,
    ApiPath((branch_id, case_id)): ApiPath<(BranchId, CaseId)>,
    ApiJson(body): ApiJson<AddChargeBody>,
) -> Result<(StatusCode, Json<Charge>), ApiError> {
    require_branch(&ctx, branch_id)?;
    let request = body.into_request(branch_id, case_id)?;
    let charge = state.services.ledger.add_charge(&ctx, request).await?;
    Ok((StatusCode::CREATED, Json(charge)))
}

pub async fn delete_charge(
    State(state): State<AppState>,
    AuthContext(ctx): AuthContext,
    ApiPath((branch_id, case_id, charge_id)): ApiPath<(BranchId, CaseId, ChargeId)>,
) -> Result<StatusCode, ApiError> {
    require_branch(&ctx, branch_id)?;
    state
        .services
        .ledger
        .delete_charge(&ctx, charge_id, case_id, branch_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
