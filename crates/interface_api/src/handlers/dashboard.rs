//! Branch dashboard

use axum::{extract::State, Json};

use core_kernel::BranchId;
use domain_case::BranchSummary;

use crate::auth::require_branch;
use crate::error::ApiError;
use crate::extract::{ApiPath, AuthContext};
use crate::AppState;

pub async fn branch_summary(
    State(state): State<AppState>,
    AuthContext(ctx): AuthContext,
    ApiPath(branch_id): ApiPath<BranchId>,
) -> Result<Json<BranchSummary>, ApiError> {
    require_branch(&ctx, branch_id)?;
    let summary = state.services.dashboard.branch_summary(&ctx, branch_id).await?;
    Ok(Json(summary))
}
