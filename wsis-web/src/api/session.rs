//! Session endpoints
//!
//! `GET /api/session` reports the current identity, phase and namespace
//! (also feeding the connection-debug overlay); `POST /api/session/retry`
//! runs the manual recover-session flow: sign out, anonymous re-sign-in.

use axum::{extract::State, Json};
use serde::Serialize;
use uuid::Uuid;

use crate::AppState;

/// Session status response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    /// "initializing" | "ready" | "rate-limited"
    pub state: &'static str,
    pub user_id: Option<Uuid>,
    pub app_id: String,
    /// Scoped storage path of the current user, when signed in
    pub namespace: Option<String>,
    /// Pending auth alert message, cleared on read
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<String>,
}

async fn session_response(state: &AppState) -> SessionResponse {
    let user_id = state.session.current();
    SessionResponse {
        state: state.session.phase().await.as_str(),
        user_id,
        app_id: state.config.app_id.clone(),
        namespace: user_id.map(|u| state.store.namespace(u)),
        alert: state.session.take_auth_alert().await,
    }
}

/// GET /api/session
pub async fn get_session(State(state): State<AppState>) -> Json<SessionResponse> {
    Json(session_response(&state).await)
}

/// POST /api/session/retry
///
/// Sign out, then re-attempt anonymous sign-in. A rate-limited failure
/// re-enters the rate-limited state; any other failure surfaces in the
/// response's alert field.
pub async fn retry_session(State(state): State<AppState>) -> Json<SessionResponse> {
    state.session.retry().await;
    Json(session_response(&state).await)
}
