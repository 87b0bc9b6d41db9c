//! Dashboard view derivations
//!
//! Pure functions over a snapshot: the distinct reporting weeks, the week
//! filter, and the row order of the pivoted table. Kept free of I/O so
//! the dashboard semantics are testable without a database.

use wsis_common::model::WeeklyReport;

/// Distinct reporting weeks present in the snapshot, sorted descending.
///
/// Lexicographic descending equals chronological descending because the
/// week format is zero-padded (`YYYY-Www`).
pub fn available_weeks(reports: &[WeeklyReport]) -> Vec<String> {
    let mut weeks: Vec<String> = reports.iter().map(|r| r.reporting_week.clone()).collect();
    weeks.sort();
    weeks.dedup();
    weeks.reverse();
    weeks
}

/// Week filter: empty selection shows all reports, otherwise only those
/// whose reporting week equals the selection
pub fn filter_by_week(reports: &[WeeklyReport], week: Option<&str>) -> Vec<WeeklyReport> {
    match week {
        None | Some("") => reports.to_vec(),
        Some(week) => reports
            .iter()
            .filter(|r| r.reporting_week == week)
            .cloned()
            .collect(),
    }
}

/// Pivoted-table row order: site name ascending (lexicographic)
pub fn table_order(mut reports: Vec<WeeklyReport>) -> Vec<WeeklyReport> {
    reports.sort_by(|a, b| a.site_name.cmp(&b.site_name));
    reports
}
