//! Server-Sent Events endpoint for the live report subscription
//!
//! Streams full-collection snapshots to the dashboard. Snapshot errors
//! are delivered as a terminal `SubscriptionError` event (they move the
//! whole view into a recoverable state, unlike write-path errors which
//! stay transient alerts). The stream ends when the identity changes so
//! stale-identity data never leaks into a new session; the client
//! re-subscribes under the new identity.

use axum::response::sse::{Event, KeepAlive, Sse};
use axum::extract::State;
use futures::stream::Stream;
use serde_json::json;
use std::convert::Infallible;
use std::time::Duration;
use tracing::{debug, info};
use wsis_common::model::WeeklyReport;

use crate::AppState;

/// GET /api/reports/events
pub async fn report_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let session = state.session.clone();
    let store = state.store.clone();

    let stream = async_stream::stream! {
        info!("SSE: report event stream started");
        yield Ok(Event::default().event("ConnectionStatus").data("connected"));

        let user = match session.current() {
            Some(user) => user,
            None => {
                yield error_event("not-authenticated", "no signed-in user");
                return;
            }
        };
        let mut identity_rx = session.subscribe();

        let mut sub = match store.subscribe(user, user).await {
            Ok(sub) => sub,
            Err(e) => {
                yield error_event(e.code(), &e.to_string());
                return;
            }
        };

        // First snapshot is loaded by subscribe; emit it before waiting
        if let Some(snapshot) = sub.latest_acknowledged() {
            yield snapshot_event(&snapshot);
        }

        loop {
            tokio::select! {
                changed = sub.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    if let Some(snapshot) = sub.latest_acknowledged() {
                        debug!("SSE: emitting snapshot for {}", user);
                        yield snapshot_event(&snapshot);
                    }
                }
                changed = identity_rx.changed() => {
                    if changed.is_err() || *identity_rx.borrow() != Some(user) {
                        info!("SSE: identity changed, closing stream for {}", user);
                        yield error_event("identity-changed", "session identity changed");
                        break;
                    }
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    )
}

fn snapshot_event(reports: &[WeeklyReport]) -> Result<Event, Infallible> {
    let data = serde_json::to_string(reports).unwrap_or_else(|_| "[]".to_string());
    Ok(Event::default().event("Snapshot").data(data))
}

fn error_event(code: &str, message: &str) -> Result<Event, Infallible> {
    Ok(Event::default()
        .event("SubscriptionError")
        .data(json!({ "code": code, "error": message }).to_string()))
}
