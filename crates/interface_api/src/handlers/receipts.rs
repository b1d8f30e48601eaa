//! Receipt lookup

use axum::{extract::State, Json};

use core_kernel::BranchId;
use domain_case::FoundReceipt;

use crate::auth::require_branch;
use crate::error::ApiError;
use crate::extract::{ApiPath, AuthContext};
use crate::AppState;

pub async fn find_receipt(
    State(state): State<AppState>,
    AuthContext(ctx): AuthContext,
    ApiPath((branch_id, receipt_no)): ApiPath<(BranchId, String)>,
) -> Result<Json<FoundReceipt>, ApiError> {
    require_branch(&ctx, branch_id)?;
    let found = state
        .services
        .receipts
        .find_receipt(&ctx, branch_id, &receipt_no)
        .await?;
    Ok(Json(found))
}
