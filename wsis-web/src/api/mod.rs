//! HTTP API handlers for wsis-web

pub mod health;
pub mod reports;
pub mod session;
pub mod sse;
pub mod taxonomy;
pub mod ui;

pub use health::health_routes;
pub use reports::{create_report, delete_report, list_reports};
pub use session::{get_session, retry_session};
pub use sse::report_events;
pub use taxonomy::get_taxonomy;
pub use ui::{serve_app_js, serve_index, serve_style_css};
