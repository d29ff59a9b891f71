//! Router configuration.
//!
//! This module creates the main Axum router that combines all endpoints.

use axum::{
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::saml_handlers;
use crate::state::AppState;
use crate::ui;

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    let saml = Router::new()
        .route("/metadata.xml", get(saml_handlers::metadata))
        .route("/signin", get(saml_handlers::signin))
        .route("/logout", get(saml_handlers::logout));

    let ui_routes = Router::new()
        .route("/", get(ui::main_page))
        .route("/login", get(ui::login_page).post(ui::login_submit))
        .route("/logout-form", post(ui::logout_form));

    Router::new()
        .merge(saml)
        .merge(ui_routes)
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Basic health check.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}
