//! HTTP API Layer
//!
//! REST API for the mortuary case core using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: one module per area (cases, charges, payments, ...)
//! - **Middleware**: JWT authentication, tracing, audit logging
//! - **DTOs**: request bodies converted into domain requests
//! - **Error Handling**: `CaseError` and `AuthError` rendered as JSON
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let state = AppState::new(services, store, config);
//! axum::serve(listener, create_router(state)).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;
pub mod auth;
pub mod extract;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{delete, get},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use domain_case::{CaseServices, RecordStore};

use crate::config::ApiConfig;
use crate::handlers::{
    branches, cases, charges, dashboard, discharge, health, payments, receipts, services,
};
use crate::middleware::{audit_middleware, auth_middleware};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub services: CaseServices,
    /// Same store the services use; probed by the readiness check
    pub store: Arc<dyn RecordStore>,
    pub config: ApiConfig,
}

impl AppState {
    pub fn new(services: CaseServices, store: Arc<dyn RecordStore>, config: ApiConfig) -> Self {
        Self {
            services,
            store,
            config,
        }
    }
}

/// Creates the main API router
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let branch_routes = Router::new()
        .route("/", get(branches::list_branches).post(branches::create_branch))
        .route("/:branch_id", delete(branches::delete_branch))
        .route("/:branch_id/cases", get(cases::list_cases).post(cases::admit_case))
        .route(
            "/:branch_id/cases/:case_id",
            get(cases::get_case).put(cases::update_case),
        )
        .route(
            "/:branch_id/cases/:case_id/charges",
            get(charges::list_charges).post(charges::add_charge),
        )
        .route(
            "/:branch_id/cases/:case_id/charges/:charge_id",
            delete(charges::delete_charge),
        )
        .route(
            "/:branch_id/cases/:case_id/discharge",
            get(discharge::preview_discharge).post(discharge::discharge_case),
        )
        .route(
            "/:branch_id/payments",
            get(payments::list_payments).post(payments::record_payment),
        )
        .route("/:branch_id/payments/:payment_id", delete(payments::void_payment))
        .route(
            "/:branch_id/services",
            get(services::list_services).put(services::upsert_service),
        )
        .route("/:branch_id/services/:service_id", delete(services::delete_service))
        .route("/:branch_id/receipts/:receipt_no", get(receipts::find_receipt))
        .route("/:branch_id/dashboard", get(dashboard::branch_summary));

    // Protected API routes
    let api_routes = Router::new()
        .nest("/branches", branch_routes)
        .layer(axum_middleware::from_fn_with_state(state.clone(), audit_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
