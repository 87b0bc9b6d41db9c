//! wsis-web library - Weekly safety-inspection reporting service
//!
//! Serves the submission form and the per-user dashboard, backed by a
//! SQLite report store with live snapshot subscriptions over SSE.

use axum::Router;
use std::sync::Arc;
use wsis_common::config::AppConfig;

use crate::session::SessionManager;
use crate::store::ReportStore;

pub mod api;
pub mod db;
pub mod session;
pub mod store;
pub mod views;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Immutable startup configuration
    pub config: Arc<AppConfig>,
    /// Process identity and its lifecycle
    pub session: Arc<SessionManager>,
    /// Per-user report collection
    pub store: Arc<ReportStore>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, session: Arc<SessionManager>, store: Arc<ReportStore>) -> Self {
        Self {
            config,
            session,
            store,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{delete, get, post};
    use tower_http::cors::CorsLayer;

    Router::new()
        .route("/", get(api::serve_index))
        .route("/static/app.js", get(api::serve_app_js))
        .route("/static/style.css", get(api::serve_style_css))
        .route("/api/session", get(api::get_session))
        .route("/api/session/retry", post(api::retry_session))
        .route("/api/taxonomy", get(api::get_taxonomy))
        .route("/api/reports", get(api::list_reports).post(api::create_report))
        .route("/api/reports/:id", delete(api::delete_report))
        .route("/api/reports/events", get(api::report_events))
        .merge(api::health_routes())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
