//! Case handlers

use axum::{extract::State, http::StatusCode, Json};

use core_kernel::{BranchId, CaseId};
use domain_case::{Case, CaseDetailsUpdate};

use crate::auth::require_branch;
use crate::dto::case::{AdmissionResponse, AdmitCaseBody, ListCasesQuery};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery, AuthContext};
use crate::AppState;

/// Admits a case and bills the branch's initial services
pub async fn admit_case(
    State(state): State<AppState>,
    AuthContext(ctx): AuthContext,
    ApiPath(branch_id): ApiPath<BranchId>,
    ApiJson(body): ApiJson<AdmitCaseBody>,
) -> Result<(StatusCode, Json<AdmissionResponse>), ApiError> {
    require_branch(&ctx, branch_id)?;
    let request = body.into_request(branch_id)?;
    let result = state.services.admission.admit(&ctx, request).await?;
    Ok((StatusCode::CREATED, Json(result.into())))
}

/// Lists a branch's cases, optionally filtered by status
pub async fn list_cases(
    State(state): State<AppState>,
    AuthContext(ctx): AuthContext,
    ApiPath(branch_id): ApiPath<BranchId>,
    ApiQuery(query): ApiQuery<ListCasesQuery>,
) -> Result<Json<Vec<Case>>, ApiError> {
    require_branch(&ctx, branch_id)?;
    let cases = state
        .services
        .registry
        .list_cases(&ctx, branch_id, query.into())
        .await?;
    Ok(Json(cases))
}

pub async fn get_case(
    State(state): State<AppState>,
    AuthContext(ctx): AuthContext,
    ApiPath((branch_id, case_id)): ApiPath<(BranchId, CaseId)>,
) -> Result<Json<Case>, ApiError> {
    require_branch(&ctx, branch_id)?;
    let case = state.services.registry.get_case(&ctx, branch_id, case_id).await?;
    Ok(Json(case))
}

/// Edits the descriptive fields of a case
pub async fn update_case(
    State(state): State<AppState>,
    AuthContext(ctx): AuthContext,
    ApiPath((branch_id, case_id)): ApiPath<(BranchId, CaseId)>,
    ApiJson(update): ApiJson<CaseDetailsUpdate>,
) -> Result<Json<Case>, ApiError> {
    require_branch(&ctx, branch_id)?;
    let case = state
        .services
        .registry
        .update_case_details(&ctx, branch_id, case_id, update)
        .await?;
    Ok(Json(case))
}
