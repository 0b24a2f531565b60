//! Relational domain types for reports and their work orders.

use serde::{Deserialize, Serialize};

/// System-of-record row for a citizen-submitted road issue.
///
/// `firebase_id` back-references the originating document; it is set at most
/// once, at ingestion, and immutable thereafter. `is_synced` is monotone
/// false -> true and never reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: i64,
    pub reported_at: String,
    pub longitude: f64,
    pub latitude: f64,
    pub city: Option<String>,
    pub problem_type_id: i64,
    pub report_status_id: i64,
    pub user_id: i64,
    pub is_synced: bool,
    pub firebase_id: Option<String>,
}

/// Manager-maintained work order, zero-or-one per report, created lazily on
/// the first edit. `surface`, `budget` and `progress` keep the manager's
/// input verbatim; numeric coercion happens only when publishing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSync {
    pub id: i64,
    pub report_id: i64,
    pub surface: Option<String>,
    pub budget: Option<String>,
    pub progress: Option<String>,
    pub company_id: Option<i64>,
    pub report_status_id: i64,
    pub sent_to_firebase: Option<bool>,
}

/// One appended row per status change; never mutated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncHistoryEntry {
    pub id: i64,
    pub report_sync_id: i64,
    pub report_status_id: i64,
    pub changed_at: String,
}

/// Fields a manager may edit on a work order. The edit overwrites the whole
/// row, mirroring the dashboard form: omitted fields clear to NULL and an
/// omitted status falls back to the default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrderUpdate {
    pub surface: Option<String>,
    pub budget: Option<String>,
    pub progress: Option<String>,
    pub company_id: Option<i64>,
    pub report_status_id: Option<i64>,
}

/// Joined report + work order + assigned-company row, read immediately
/// before a publish, never from a stale snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishProjection {
    pub report_id: i64,
    pub report_sync_id: i64,
    pub firebase_id: Option<String>,
    pub longitude: f64,
    pub latitude: f64,
    pub city: Option<String>,
    pub problem_type_id: i64,
    pub surface: Option<String>,
    pub budget: Option<String>,
    pub progress: Option<String>,
    pub company_id: Option<i64>,
    pub company_name: Option<String>,
    pub report_status_id: i64,
    pub sent_to_firebase: Option<bool>,
}
