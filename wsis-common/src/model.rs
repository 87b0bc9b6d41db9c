//! Report data model
//!
//! Wire names are camelCase to match the document shape the dashboard and
//! form exchange (`reportingWeek`, `siteName`, `proofLink`, `createdAt`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// The three free-text fields every taxonomy leaf carries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubcategoryFields {
    /// This week's plan
    #[serde(default)]
    pub plan: String,
    /// This week's performance
    #[serde(default)]
    pub performance: String,
    /// Follow-up status (or next week's plan)
    #[serde(default)]
    pub status: String,
}

/// category id -> subcategory id -> fields
pub type CategoryMap = BTreeMap<String, BTreeMap<String, SubcategoryFields>>;

/// One submitted weekly report
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyReport {
    /// Store-assigned identifier (used for deletion and list keys)
    pub id: Uuid,
    /// ISO week string, format `YYYY-Www`
    pub reporting_week: String,
    /// One value from the fixed site list
    pub site_name: String,
    /// Fully-populated taxonomy shape; every leaf present even when empty
    pub categories: CategoryMap,
    /// Optional evidence URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof_link: Option<String>,
    /// Owner identity, stamped at write time, never user-editable
    pub user_id: Uuid,
    /// Creation timestamp, stamped at write time, immutable
    pub created_at: DateTime<Utc>,
}

/// What the submission form sends; the store stamps id, userId and createdAt
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDraft {
    pub reporting_week: String,
    pub site_name: String,
    #[serde(default)]
    pub categories: CategoryMap,
    #[serde(default)]
    pub proof_link: Option<String>,
}
