//! Service catalog handlers

use axum::{extract::State, http::StatusCode, Json};

use core_kernel::{BranchId, ServiceId};
use domain_billing::ServiceCatalogEntry;

use crate::auth::{require_branch, require_settings};
use crate::dto::billing::UpsertServiceBody;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, AuthContext};
use crate::AppState;

/// Lists every catalog entry of a branch, inactive ones included
pub async fn list_services(
    State(state): State<AppState>,
    AuthContext(ctx): AuthContext,
    ApiPath(branch_id): ApiPath<BranchId>,
) -> Result<Json<Vec<ServiceCatalogEntry>>, ApiError> {
    require_branch(&ctx, branch_id)?;
    let services = state.services.settings.list_services(&ctx, branch_id).await?;
    Ok(Json(services))
}

/// Creates a catalog entry, or updates it when `id` is given
pub async fn upsert_service(
    State(state): State<AppState>,
    AuthContext(ctx): AuthContext,
    ApiPath(branch_id): ApiPath<BranchId>,
    ApiJson(body): ApiJson<UpsertServiceBody>,
) -> Result<Json<ServiceCatalogEntry>, ApiError> {
    require_branch(&ctx, branch_id)?;
    require_settings(&ctx)?;
    let request = body.into_request(branch_id)?;
    let entry = state.services.settings.upsert_service(&ctx, request).await?;
    Ok(Json(entry))
}

pub async fn delete_service(
    State(state): State<AppState>,
    AuthContext(ctx): AuthContext,
    ApiPath((branch_id, service_id)): ApiPath<(BranchId, ServiceId)>,
) -> Result<StatusCode, ApiError> {
    require_branch(&ctx, branch_id)?;
    require_settings(&ctx)?;
    state
        .services
        .settings
        .delete_service(&ctx, branch_id, service_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
