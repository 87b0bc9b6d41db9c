//! Report store
//!
//! Create / live-subscribe / delete over the per-user weekly report
//! collection. Every operation is scoped by the application id and a user
//! id (namespace `artifacts/{appId}/users/{userId}/weeklyReports`); a
//! caller whose identity does not match the namespace owner gets
//! permission-denied, which is the entire authorization model.
//!
//! Subscriptions are watch channels carrying full-collection snapshots:
//! each emission completely replaces the previous result set, sorted by
//! creation time descending. The channel value stays `None` until the
//! first load completes, so consumers can tell "loading" from "empty".

use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};
use uuid::Uuid;
use wsis_common::model::{ReportDraft, WeeklyReport};
use wsis_common::{taxonomy, week, Error, Result};

/// Full-collection snapshot; `None` until the first load completes
pub type Snapshot = Option<Arc<Vec<WeeklyReport>>>;

/// Cancellable handle on a user's live snapshot stream
pub struct SnapshotSubscription {
    rx: watch::Receiver<Snapshot>,
}

impl SnapshotSubscription {
    /// Latest snapshot without waiting
    pub fn latest(&self) -> Snapshot {
        self.rx.borrow().clone()
    }

    /// Latest snapshot, marked seen so `changed` waits for a newer one
    pub fn latest_acknowledged(&mut self) -> Snapshot {
        self.rx.borrow_and_update().clone()
    }

    /// Wait for the next emission; `Err` means the stream closed
    pub async fn changed(&mut self) -> std::result::Result<(), watch::error::RecvError> {
        self.rx.changed().await
    }

    /// Explicitly cancel the subscription (equivalent to dropping it)
    pub fn cancel(self) {}
}

pub struct ReportStore {
    pool: SqlitePool,
    app_id: String,
    /// One snapshot channel per subscribed user; pruned once the last
    /// receiver is gone
    channels: Mutex<HashMap<Uuid, watch::Sender<Snapshot>>>,
}

impl ReportStore {
    pub fn new(pool: SqlitePool, app_id: String) -> Self {
        Self {
            pool,
            app_id,
            channels: Mutex::new(HashMap::new()),
        }
    }

    /// Scoped storage path for one user (debug overlay display)
    pub fn namespace(&self, user_id: Uuid) -> String {
        format!("artifacts/{}/users/{}/weeklyReports", self.app_id, user_id)
    }

    fn check_owner(&self, caller: Uuid, owner: Uuid) -> Result<()> {
        if caller != owner {
            return Err(Error::PermissionDenied(format!(
                "caller {} cannot access namespace of {}",
                caller, owner
            )));
        }
        Ok(())
    }

    /// Append a new report to the owner's namespace.
    ///
    /// Validates the reporting week, the site name and the taxonomy shape
    /// (missing leaves filled empty, unknown ids rejected), stamps id,
    /// userId and createdAt, then emits a fresh snapshot.
    pub async fn create(&self, caller: Uuid, owner: Uuid, draft: ReportDraft) -> Result<WeeklyReport> {
        self.check_owner(caller, owner)?;

        if draft.reporting_week.is_empty() {
            return Err(Error::InvalidInput("reporting week is required".to_string()));
        }
        if !week::is_valid_week(&draft.reporting_week) {
            return Err(Error::InvalidInput(format!(
                "invalid reporting week: {}",
                draft.reporting_week
            )));
        }
        if !taxonomy::is_known_site(&draft.site_name) {
            return Err(Error::InvalidInput(format!(
                "unknown site: {}",
                draft.site_name
            )));
        }

        let report = WeeklyReport {
            id: Uuid::new_v4(),
            reporting_week: draft.reporting_week,
            site_name: draft.site_name,
            categories: taxonomy::normalize(&draft.categories)?,
            proof_link: draft.proof_link.filter(|l| !l.trim().is_empty()),
            user_id: owner,
            created_at: Utc::now(),
        };

        let categories_json = serde_json::to_string(&report.categories)
            .map_err(|e| Error::Internal(format!("serialize categories: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO weekly_reports
                (guid, app_id, user_id, reporting_week, site_name, proof_link, categories, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(report.id.to_string())
        .bind(&self.app_id)
        .bind(owner.to_string())
        .bind(&report.reporting_week)
        .bind(&report.site_name)
        .bind(&report.proof_link)
        .bind(&categories_json)
        .bind(report.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        info!(
            "Report {} created in {} (week {})",
            report.id,
            self.namespace(owner),
            report.reporting_week
        );
        self.refresh(owner).await;
        Ok(report)
    }

    /// Remove one report by id from the owner's namespace
    pub async fn delete(&self, caller: Uuid, owner: Uuid, id: Uuid) -> Result<()> {
        self.check_owner(caller, owner)?;

        let result = sqlx::query(
            "DELETE FROM weekly_reports WHERE guid = ? AND app_id = ? AND user_id = ?",
        )
        .bind(id.to_string())
        .bind(&self.app_id)
        .bind(owner.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("report {}", id)));
        }

        info!("Report {} deleted from {}", id, self.namespace(owner));
        self.refresh(owner).await;
        Ok(())
    }

    /// Subscribe to the owner's live snapshot stream.
    ///
    /// The first snapshot is loaded before the handle is returned; later
    /// writes to the namespace trigger fresh emissions.
    pub async fn subscribe(&self, caller: Uuid, owner: Uuid) -> Result<SnapshotSubscription> {
        self.check_owner(caller, owner)?;

        let rx = {
            let mut channels = self.channels.lock().await;
            let tx = channels
                .entry(owner)
                .or_insert_with(|| watch::channel(None).0);
            tx.subscribe()
        };

        // Load outside the channels lock; a failed load closes nothing,
        // the subscription just stays in the loading state
        let reports = self.load_snapshot(owner).await?;
        if let Some(tx) = self.channels.lock().await.get(&owner) {
            tx.send_replace(Some(Arc::new(reports)));
        }

        debug!("Subscribed to {}", self.namespace(owner));
        Ok(SnapshotSubscription { rx })
    }

    /// One-shot read of the owner's collection (non-SSE dashboard reads)
    pub async fn list(&self, caller: Uuid, owner: Uuid) -> Result<Vec<WeeklyReport>> {
        self.check_owner(caller, owner)?;
        self.load_snapshot(owner).await
    }

    /// Full-collection query, sorted by creation time descending
    async fn load_snapshot(&self, owner: Uuid) -> Result<Vec<WeeklyReport>> {
        let rows = sqlx::query(
            r#"
            SELECT guid, reporting_week, site_name, proof_link, categories, created_at
            FROM weekly_reports
            WHERE app_id = ? AND user_id = ?
            ORDER BY created_at DESC, guid
            "#,
        )
        .bind(&self.app_id)
        .bind(owner.to_string())
        .fetch_all(&self.pool)
        .await?;

        let mut reports = Vec::with_capacity(rows.len());
        for row in rows {
            reports.push(row_to_report(&row, owner)?);
        }
        Ok(reports)
    }

    /// Re-query and emit a fresh snapshot for a user, pruning dead channels
    async fn refresh(&self, owner: Uuid) {
        let mut channels = self.channels.lock().await;
        let Some(tx) = channels.get(&owner) else {
            return;
        };
        if tx.receiver_count() == 0 {
            channels.remove(&owner);
            return;
        }
        drop(channels);

        match self.load_snapshot(owner).await {
            Ok(reports) => {
                if let Some(tx) = self.channels.lock().await.get(&owner) {
                    tx.send_replace(Some(Arc::new(reports)));
                }
            }
            // The write already succeeded; a failed re-read only delays
            // the next emission
            Err(e) => warn!("Snapshot reload for {} failed: {}", owner, e),
        }
    }
}

fn row_to_report(row: &sqlx::sqlite::SqliteRow, owner: Uuid) -> Result<WeeklyReport> {
    let guid: String = row.get("guid");
    let created_at: String = row.get("created_at");
    let categories: String = row.get("categories");

    Ok(WeeklyReport {
        id: guid
            .parse()
            .map_err(|e| Error::Internal(format!("bad report id {}: {}", guid, e)))?,
        reporting_week: row.get("reporting_week"),
        site_name: row.get("site_name"),
        categories: serde_json::from_str(&categories)
            .map_err(|e| Error::Internal(format!("bad categories column: {}", e)))?,
        proof_link: row.get("proof_link"),
        user_id: owner,
        created_at: chrono::DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| Error::Internal(format!("bad created_at column: {}", e)))?
            .with_timezone(&Utc),
    })
}
