//! HTTP API Layer
//!
//! REST API for lecturer claims: submission, review, invoicing and the
//! attachment upload path, built on Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Translate requests into [`ClaimWorkflow`] calls
//! - **Middleware**: Authentication and audit logging
//! - **DTOs**: Request/Response data transfer objects
//! - **Storage**: Local filesystem adapter for supporting documents
//! - **Error Handling**: Consistent error responses
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let app = create_router(AppState::new(workflow, config));
//! axum::serve(listener, app).await?;
//! ```

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod storage;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use domain_claims::ClaimWorkflow;

use crate::config::ApiConfig;
use crate::handlers::{claims, health};
use crate::middleware::{audit_middleware, auth_middleware};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub workflow: Arc<ClaimWorkflow>,
    pub config: ApiConfig,
}

impl AppState {
    pub fn new(workflow: ClaimWorkflow, config: ApiConfig) -> Self {
        Self {
            workflow: Arc::new(workflow),
            config,
        }
    }
}

/// Creates the main API router
///
/// Claim routes live under `/api/v1/claims` behind bearer authentication;
/// stored attachments are served from the upload root under the configured
/// public prefix.
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let claims_routes = Router::new()
        .route("/", get(claims::list_own).post(claims::submit))
        .route("/pending", get(claims::list_pending))
        .route("/history", get(claims::list_history))
        .route("/approved", get(claims::list_approved))
        .route("/invoiced", get(claims::list_invoiced))
        .route(
            "/:id",
            get(claims::get_claim).put(claims::edit).delete(claims::delete),
        )
        .route("/:id/approve", post(claims::approve))
        .route("/:id/reject", post(claims::reject))
        .route(
            "/:id/invoice",
            post(claims::generate_invoice).get(claims::get_invoice),
        )
        .layer(DefaultBodyLimit::max(state.config.body_limit()));

    // Protected API routes
    let api_routes = Router::new()
        .nest("/claims", claims_routes)
        .layer(axum_middleware::from_fn_with_state(state.clone(), audit_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .nest_service(
            state.config.public_route(),
            ServeDir::new(&state.config.upload_root),
        )
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
