//! Branch handlers

use axum::{extract::State, http::StatusCode, Json};

use core_kernel::BranchId;
use domain_case::Branch;

use crate::auth::require_admin;
use crate::dto::branch::CreateBranchBody;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, AuthContext};
use crate::AppState;

/// Lists the branches the caller may access
pub async fn list_branches(
    State(state): State<AppState>,
    AuthContext(ctx): AuthContext,
) -> Result<Json<Vec<Branch>>, ApiError> {
    let branches = state.services.settings.list_branches(&ctx).await?;
    Ok(Json(branches))
}

/// Creates a branch
pub async fn create_branch(
    State(state): State<AppState>,
    AuthContext(ctx): AuthContext,
    ApiJson(body): ApiJson<CreateBranchBody>,
) -> Result<(StatusCode, Json<Branch>), ApiError> {
    require_admin(&ctx)?;
    let branch = state.services.settings.create_branch(&ctx, body.into()).await?;
    Ok((StatusCode::CREATED, Json(branch)))
}

/// Deletes a branch that nothing references any more
pub async fn delete_branch(
    State(state): State<AppState>,
    AuthContext(ctx): AuthContext,
    ApiPath(branch_id): ApiPath<BranchId>,
) -> Result<StatusCode, ApiError> {
    require_admin(&ctx)?;
    state.services.settings.delete_branch(&ctx, branch_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
