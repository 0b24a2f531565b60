//! Diesel row types for the report tables and their conversions into the
//! core domain models.

use diesel::prelude::*;
use roadreport_core::reports::{PublishProjection, Report, ReportSync, SyncHistoryEntry};

use crate::schema::{report_sync_histories, report_syncs, reports};

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = reports)]
pub struct ReportDB {
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

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = reports)]
pub struct NewReportDB {
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

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = report_syncs)]
pub struct ReportSyncDB {
    pub id: i64,
    pub report_id: i64,
    pub surface: Option<String>,
    pub budget: Option<String>,
    pub progress: Option<String>,
    pub company_id: Option<i64>,
    pub report_status_id: i64,
    pub sent_to_firebase: Option<bool>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = report_syncs)]
pub struct NewReportSyncDB {
    pub report_id: i64,
    pub surface: Option<String>,
    pub budget: Option<String>,
    pub progress: Option<String>,
    pub company_id: Option<i64>,
    pub report_status_id: i64,
    pub sent_to_firebase: Option<bool>,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = report_sync_histories)]
pub struct SyncHistoryDB {
    pub id: i64,
    pub report_sync_id: i64,
    pub report_status_id: i64,
    pub changed_at: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = report_sync_histories)]
pub struct NewSyncHistoryDB {
    pub report_sync_id: i64,
    pub report_status_id: i64,
    pub changed_at: String,
}

/// Joined row backing a publish: work order + owning report + assigned
/// company name. Field order matches the select list in the repository.
#[derive(Debug, Clone, Queryable)]
pub struct PublishProjectionDB {
    pub report_sync_id: i64,
    pub report_id: i64,
    pub surface: Option<String>,
    pub budget: Option<String>,
    pub progress: Option<String>,
    pub company_id: Option<i64>,
    pub report_status_id: i64,
    pub sent_to_firebase: Option<bool>,
    pub firebase_id: Option<String>,
    pub longitude: f64,
    pub latitude: f64,
    pub city: Option<String>,
    pub problem_type_id: i64,
    pub company_name: Option<String>,
}

impl From<ReportDB> for Report {
    fn from(row: ReportDB) -> Self {
        Self {
            id: row.id,
            reported_at: row.reported_at,
            longitude: row.longitude,
            latitude: row.latitude,
            city: row.city,
            problem_type_id: row.problem_type_id,
            report_status_id: row.report_status_id,
            user_id: row.user_id,
            is_synced: row.is_synced,
            firebase_id: row.firebase_id,
        }
    }
}

impl From<ReportSyncDB> for ReportSync {
    fn from(row: ReportSyncDB) -> Self {
        Self {
            id: row.id,
            report_id: row.report_id,
            surface: row.surface,
            budget: row.budget,
            progress: row.progress,
            company_id: row.company_id,
            report_status_id: row.report_status_id,
            sent_to_firebase: row.sent_to_firebase,
        }
    }
}

impl From<SyncHistoryDB> for SyncHistoryEntry {
    fn from(row: SyncHistoryDB) -> Self {
        Self {
            id: row.id,
            report_sync_id: row.report_sync_id,
            report_status_id: row.report_status_id,
            changed_at: row.changed_at,
        }
    }
}

impl From<PublishProjectionDB> for PublishProjection {
    fn from(row: PublishProjectionDB) -> Self {
        Self {
            report_id: row.report_id,
            report_sync_id: row.report_sync_id,
            firebase_id: row.firebase_id,
            longitude: row.longitude,
            latitude: row.latitude,
            city: row.city,
            problem_type_id: row.problem_type_id,
            surface: row.surface,
            budget: row.budget,
            progress: row.progress,
            company_id: row.company_id,
            company_name: row.company_name,
            report_status_id: row.report_status_id,
            sent_to_firebase: row.sent_to_firebase,
        }
    }
}
