use diesel::prelude::*;
use roadreport_core::documents::SourceDocument;
use roadreport_core::reports::{
    IngestOutcome, PublishOutcome, PublishProjection, Report, ReportRepositoryTrait,
    StatusChangeOutcome, SyncHistoryEntry, WorkOrderOutcome, WorkOrderUpdate, DEFAULT_STATUS_ID,
};
use roadreport_core::sync::{default_timestamp, is_publish_pending, now_rfc3339};
use roadreport_core::Result;

use crate::db::{get_connection, with_transaction, DbPool};
use crate::errors::StorageError;
use crate::reports::model::{
    NewReportDB, NewReportSyncDB, NewSyncHistoryDB, PublishProjectionDB, ReportDB, ReportSyncDB,
    SyncHistoryDB,
};
use crate::reports::resolver::resolve_or_create_user;
use crate::schema::{companies, report_sync_histories, report_syncs, reports};

/// Transactional repository over the report tables.
pub struct ReportRepository {
    pool: DbPool,
}

impl ReportRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn load_projection(
    conn: &mut SqliteConnection,
    report_id: i64,
) -> Result<Option<PublishProjectionDB>> {
    let row = report_syncs::table
        .inner_join(reports::table)
        .left_join(companies::table)
        .filter(report_syncs::report_id.eq(report_id))
        .select((
            report_syncs::id,
            report_syncs::report_id,
            report_syncs::surface,
            report_syncs::budget,
            report_syncs::progress,
            report_syncs::company_id,
            report_syncs::report_status_id,
            report_syncs::sent_to_firebase,
            reports::firebase_id,
            reports::longitude,
            reports::latitude,
            reports::city,
            reports::problem_type_id,
            companies::name.nullable(),
        ))
        .first::<PublishProjectionDB>(conn)
        .optional()
        .map_err(StorageError::from)?;
    Ok(row)
}

impl ReportRepositoryTrait for ReportRepository {
    fn ingest_submission(&self, submission: &SourceDocument) -> Result<IngestOutcome> {
        let mut conn = get_connection(&self.pool)?;
        with_transaction(&mut conn, |tx| {
            let user_id = resolve_or_create_user(tx, &submission.submitter_id)?;
            let row = NewReportDB {
                reported_at: default_timestamp(submission.reported_at.clone()),
                longitude: submission.longitude,
                latitude: submission.latitude,
                city: submission.city.clone(),
                problem_type_id: submission.problem_type_id,
                report_status_id: submission.report_status_id,
                user_id,
                // Ingested rows are born synced; the flag never goes back.
                is_synced: true,
                firebase_id: Some(submission.firebase_id.clone()),
            };
            match diesel::insert_into(reports::table)
                .values(&row)
                .returning(reports::id)
                .get_result::<i64>(tx)
            {
                Ok(report_id) => Ok(IngestOutcome::Created { report_id }),
                Err(err) => {
                    let err = StorageError::from(err);
                    if !err.is_unique_violation() {
                        return Err(err.into());
                    }
                    // A concurrent pass won the insert; reuse its row so the
                    // caller can still complete the document write-back.
                    let report_id = reports::table
                        .filter(reports::firebase_id.eq(&submission.firebase_id))
                        .select(reports::id)
                        .first::<i64>(tx)
                        .map_err(StorageError::from)?;
                    Ok(IngestOutcome::AlreadyIngested { report_id })
                }
            }
        })
    }

    fn pending_publish_report_ids(&self) -> Result<Vec<i64>> {
        let mut conn = get_connection(&self.pool)?;
        let ids = report_syncs::table
            .filter(
                report_syncs::sent_to_firebase
                    .eq(false)
                    .or(report_syncs::sent_to_firebase.is_null()),
            )
            .order(report_syncs::id.asc())
            .select(report_syncs::report_id)
            .load::<i64>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(ids)
    }

    fn publish_with(
        &self,
        report_id: i64,
        write: &dyn Fn(&PublishProjection) -> Result<()>,
    ) -> Result<PublishOutcome> {
        let mut conn = get_connection(&self.pool)?;
        with_transaction(&mut conn, |tx| {
            let Some(row) = load_projection(tx, report_id)? else {
                return Ok(PublishOutcome::NotFound);
            };
            if !is_publish_pending(row.sent_to_firebase) {
                return Ok(PublishOutcome::AlreadySent);
            }
            let projection = PublishProjection::from(row);
            // The document write happens inside the transaction: if it fails,
            // the flag flip below never commits and the row stays pending.
            write(&projection)?;
            diesel::update(report_syncs::table.find(projection.report_sync_id))
                .set(report_syncs::sent_to_firebase.eq(Some(true)))
                .execute(tx)
                .map_err(StorageError::from)?;
            Ok(PublishOutcome::Published)
        })
    }

    fn change_status(
        &self,
        report_sync_id: i64,
        status_id: i64,
        progress: Option<String>,
    ) -> Result<StatusChangeOutcome> {
        let mut conn = get_connection(&self.pool)?;
        with_transaction(&mut conn, |tx| {
            let Some(work_order) = report_syncs::table
                .find(report_sync_id)
                .first::<ReportSyncDB>(tx)
                .optional()
                .map_err(StorageError::from)?
            else {
                return Ok(StatusChangeOutcome::NotFound);
            };

            if let Some(progress) = progress {
                diesel::update(report_syncs::table.find(report_sync_id))
                    .set((
                        report_syncs::report_status_id.eq(status_id),
                        report_syncs::progress.eq(Some(progress)),
                        report_syncs::sent_to_firebase.eq(Some(false)),
                    ))
                    .execute(tx)
                    .map_err(StorageError::from)?;
            } else {
                diesel::update(report_syncs::table.find(report_sync_id))
                    .set((
                        report_syncs::report_status_id.eq(status_id),
                        report_syncs::sent_to_firebase.eq(Some(false)),
                    ))
                    .execute(tx)
                    .map_err(StorageError::from)?;
            }

            // Keep the report's own status column in step with the work order.
            diesel::update(reports::table.find(work_order.report_id))
                .set(reports::report_status_id.eq(status_id))
                .execute(tx)
                .map_err(StorageError::from)?;

            diesel::insert_into(report_sync_histories::table)
                .values(&NewSyncHistoryDB {
                    report_sync_id,
                    report_status_id: status_id,
                    changed_at: now_rfc3339(),
                })
                .execute(tx)
                .map_err(StorageError::from)?;

            Ok(StatusChangeOutcome::Changed {
                report_id: work_order.report_id,
            })
        })
    }

    fn update_work_order(
        &self,
        report_id: i64,
        update: &WorkOrderUpdate,
    ) -> Result<WorkOrderOutcome> {
        let mut conn = get_connection(&self.pool)?;
        let update = update.clone();
        with_transaction(&mut conn, move |tx| {
            let report = reports::table
                .find(report_id)
                .select(reports::id)
                .first::<i64>(tx)
                .optional()
                .map_err(StorageError::from)?;
            if report.is_none() {
                return Ok(WorkOrderOutcome::NotFound);
            }

            let status_id = update.report_status_id.unwrap_or(DEFAULT_STATUS_ID);
            let existing = report_syncs::table
                .filter(report_syncs::report_id.eq(report_id))
                .select(report_syncs::id)
                .first::<i64>(tx)
                .optional()
                .map_err(StorageError::from)?;

            let outcome = match existing {
                Some(report_sync_id) => {
                    // Full overwrite: the dashboard form always submits the
                    // whole work order, so omitted fields clear to NULL.
                    diesel::update(report_syncs::table.find(report_sync_id))
                        .set((
                            report_syncs::surface.eq(update.surface.clone()),
                            report_syncs::budget.eq(update.budget.clone()),
                            report_syncs::progress.eq(update.progress.clone()),
                            report_syncs::company_id.eq(update.company_id),
                            report_syncs::report_status_id.eq(status_id),
                            report_syncs::sent_to_firebase.eq(Some(false)),
                        ))
                        .execute(tx)
                        .map_err(StorageError::from)?;
                    WorkOrderOutcome::Updated { report_sync_id }
                }
                None => {
                    let report_sync_id = diesel::insert_into(report_syncs::table)
                        .values(&NewReportSyncDB {
                            report_id,
                            surface: update.surface.clone(),
                            budget: update.budget.clone(),
                            progress: update.progress.clone(),
                            company_id: update.company_id,
                            report_status_id: status_id,
                            sent_to_firebase: Some(false),
                        })
                        .returning(report_syncs::id)
                        .get_result::<i64>(tx)
                        .map_err(StorageError::from)?;
                    WorkOrderOutcome::Created { report_sync_id }
                }
            };

            diesel::update(reports::table.find(report_id))
                .set(reports::report_status_id.eq(status_id))
                .execute(tx)
                .map_err(StorageError::from)?;

            Ok(outcome)
        })
    }

    fn find_report_by_firebase_id(&self, firebase_id: &str) -> Result<Option<Report>> {
        let mut conn = get_connection(&self.pool)?;
        let row = reports::table
            .filter(reports::firebase_id.eq(firebase_id))
            .first::<ReportDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(Report::from))
    }

    fn history_for(&self, report_sync_id: i64) -> Result<Vec<SyncHistoryEntry>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = report_sync_histories::table
            .filter(report_sync_histories::report_sync_id.eq(report_sync_id))
            .order((
                report_sync_histories::changed_at.asc(),
                report_sync_histories::id.asc(),
            ))
            .load::<SyncHistoryDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(SyncHistoryEntry::from).collect())
    }
}
