//! Report write and read endpoints
//!
//! Write-path errors (create/delete) are returned to the caller and shown
//! as transient alerts client-side; they never reach a global handler.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;
use wsis_common::model::{ReportDraft, WeeklyReport};

use crate::{views, AppState};

/// Query parameters for report listing
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Week filter; absent or empty shows all reports
    pub week: Option<String>,
}

/// Report list response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportListResponse {
    pub total: usize,
    /// Distinct weeks in the full (unfiltered) set, most recent first
    pub weeks: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_week: Option<String>,
    /// Filtered reports in pivoted-table order (site name ascending)
    pub reports: Vec<WeeklyReport>,
}

/// GET /api/reports?week=
pub async fn list_reports(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ReportListResponse>, ReportError> {
    let user = state.session.current().ok_or(ReportError::NotAuthenticated)?;

    let all = state.store.list(user, user).await?;
    let weeks = views::available_weeks(&all);
    let selected_week = query.week.filter(|w| !w.is_empty());
    let reports = views::table_order(views::filter_by_week(&all, selected_week.as_deref()));

    Ok(Json(ReportListResponse {
        total: reports.len(),
        weeks,
        selected_week,
        reports,
    }))
}

/// POST /api/reports
///
/// Stores one report for the current user. The store stamps id, userId
/// and createdAt; the submitted categories are normalized to the full
/// taxonomy shape.
pub async fn create_report(
    State(state): State<AppState>,
    Json(draft): Json<ReportDraft>,
) -> Result<(StatusCode, Json<WeeklyReport>), ReportError> {
    let user = state.session.current().ok_or(ReportError::NotAuthenticated)?;
    let report = state.store.create(user, user, draft).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

/// DELETE /api/reports/:id
pub async fn delete_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ReportError> {
    let user = state.session.current().ok_or(ReportError::NotAuthenticated)?;
    state.store.delete(user, user, id).await?;
    Ok(Json(json!({ "status": "deleted", "id": id })))
}

/// Report API errors
#[derive(Debug)]
pub enum ReportError {
    /// No signed-in identity; the client shows its connection fallback
    NotAuthenticated,
    Store(wsis_common::Error),
}

impl From<wsis_common::Error> for ReportError {
    fn from(e: wsis_common::Error) -> Self {
        ReportError::Store(e)
    }
}

impl IntoResponse for ReportError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ReportError::NotAuthenticated => (
                StatusCode::UNAUTHORIZED,
                "not-authenticated",
                "no signed-in user".to_string(),
            ),
            ReportError::Store(e) => {
                let status = match &e {
                    wsis_common::Error::PermissionDenied(_) => StatusCode::FORBIDDEN,
                    wsis_common::Error::NotFound(_) => StatusCode::NOT_FOUND,
                    wsis_common::Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
                    wsis_common::Error::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, e.code(), e.to_string())
            }
        };

        let body = Json(json!({
            "error": message,
            "code": code,
        }));

        (status, body).into_response()
    }
}
