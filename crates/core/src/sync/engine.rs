//! The bidirectional synchronization engine.
//!
//! Each public operation is one externally-triggered unit of work: callers
//! (request handlers, scheduled jobs) decide cadence and relay the structured
//! outcome. Nothing here retries on its own; every write is an idempotent
//! merge or flag-gated transaction, so re-invoking after a failure is safe.

use std::sync::Arc;

use log::{debug, warn};
use serde_json::{Map, Value};

use crate::documents::{
    Document, DocumentStore, PublishedDocument, SourceDocument, PUBLISHED_COLLECTION,
    SOURCE_COLLECTION,
};
use crate::errors::Result;
use crate::reports::{
    IngestOutcome, PublishOutcome, ReportRepositoryTrait, StatusChangeOutcome, WorkOrderOutcome,
    WorkOrderUpdate,
};
use crate::sync::now_rfc3339;

/// One failed item in a batch; the rest of the batch is unaffected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    pub id: String,
    pub error: String,
    /// Whether re-running the pass can clear this failure on its own, per
    /// [`crate::errors::Error::is_retryable`]. Non-retryable items need an
    /// operator to fix the underlying data.
    pub retryable: bool,
}

/// Structured result of a download pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadOutcome {
    pub ingested: usize,
    pub already_ingested: usize,
    pub failures: Vec<ItemFailure>,
}

impl DownloadOutcome {
    /// Documents fully handled this pass (new rows plus completed retries).
    pub fn processed(&self) -> usize {
        self.ingested + self.already_ingested
    }
}

/// Structured result of an upload pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadOutcome {
    pub published: usize,
    pub failures: Vec<ItemFailure>,
}

/// Result of a status change plus its triggered single-record publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusUpdateOutcome {
    Updated {
        report_id: i64,
        /// Whether the immediate publish succeeded. When false the change is
        /// still durable and pending, and a later upload pass republishes.
        published: bool,
    },
    NotFound,
}

/// Reconciles the relational system of record with the document store.
///
/// Store handles are injected; their lifecycle belongs to the process entry
/// point.
pub struct SyncEngine {
    repository: Arc<dyn ReportRepositoryTrait>,
    documents: Arc<dyn DocumentStore>,
}

impl SyncEngine {
    pub fn new(repository: Arc<dyn ReportRepositoryTrait>, documents: Arc<dyn DocumentStore>) -> Self {
        Self {
            repository,
            documents,
        }
    }

    /// Document store -> relational store.
    ///
    /// Ingests every document still flagged `is_synced == false`. Each
    /// document is one relational transaction; a failure abandons that item
    /// only and leaves its document untouched for retry.
    pub fn download_all(&self) -> Result<DownloadOutcome> {
        let pending =
            self.documents
                .query_eq(SOURCE_COLLECTION, "is_synced", &Value::Bool(false))?;
        debug!("download pass: {} unsynced document(s)", pending.len());

        let mut outcome = DownloadOutcome::default();
        for document in &pending {
            match self.ingest_one(document) {
                Ok(IngestOutcome::Created { report_id }) => {
                    debug!("ingested document {} as report {}", document.id, report_id);
                    outcome.ingested += 1;
                }
                Ok(IngestOutcome::AlreadyIngested { report_id }) => {
                    debug!(
                        "document {} already ingested as report {}, write-back completed",
                        document.id, report_id
                    );
                    outcome.already_ingested += 1;
                }
                Err(err) => {
                    warn!("failed to ingest document {}: {}", document.id, err);
                    outcome.failures.push(ItemFailure {
                        id: document.id.clone(),
                        error: err.to_string(),
                        retryable: err.is_retryable(),
                    });
                }
            }
        }
        Ok(outcome)
    }

    fn ingest_one(&self, document: &Document) -> Result<IngestOutcome> {
        let submission = SourceDocument::decode(document)?;
        let outcome = self.repository.ingest_submission(&submission)?;

        // The relational row is durable from here. If the write-back below
        // fails, the document stays unsynced and the next pass lands on the
        // AlreadyIngested branch, re-attempting only this merge.
        let mut fields = Map::new();
        fields.insert("is_synced".to_string(), Value::Bool(true));
        fields.insert(
            "postgres_report_id".to_string(),
            Value::from(outcome.report_id()),
        );
        self.documents
            .merge(SOURCE_COLLECTION, &document.id, &fields)?;
        Ok(outcome)
    }

    /// Relational store -> document store.
    ///
    /// Publishes every work order whose `sent_to_firebase` flag is pending.
    /// One bad row never aborts the batch.
    pub fn upload_all(&self) -> Result<UploadOutcome> {
        let pending = self.repository.pending_publish_report_ids()?;
        debug!("upload pass: {} pending work order(s)", pending.len());

        let mut outcome = UploadOutcome::default();
        for report_id in pending {
            match self.publish_report(report_id) {
                Ok(PublishOutcome::Published) => outcome.published += 1,
                // Raced with another publisher or the row vanished between
                // the id scan and the row transaction; nothing to do.
                Ok(PublishOutcome::AlreadySent) | Ok(PublishOutcome::NotFound) => {}
                Err(err) => {
                    warn!("failed to publish report {}: {}", report_id, err);
                    outcome.failures.push(ItemFailure {
                        id: report_id.to_string(),
                        error: err.to_string(),
                        retryable: err.is_retryable(),
                    });
                }
            }
        }
        Ok(outcome)
    }

    /// Publish a single report if it has a pending change.
    pub fn upload_one(&self, report_id: i64) -> Result<PublishOutcome> {
        self.publish_report(report_id)
    }

    fn publish_report(&self, report_id: i64) -> Result<PublishOutcome> {
        self.repository.publish_with(report_id, &|projection| {
            let published = PublishedDocument::from_projection(projection, now_rfc3339());
            let fields = published.into_fields()?;
            self.documents.merge(
                PUBLISHED_COLLECTION,
                &projection.report_id.to_string(),
                &fields,
            )
        })
    }

    /// Atomic status change + audit trail, then an immediate single-record
    /// publish. Relational durability is prioritized over propagation: a
    /// publish failure after commit leaves the row pending for the next
    /// upload pass.
    pub fn set_status(
        &self,
        report_sync_id: i64,
        status_id: i64,
        progress: Option<String>,
    ) -> Result<StatusUpdateOutcome> {
        match self
            .repository
            .change_status(report_sync_id, status_id, progress)?
        {
            StatusChangeOutcome::NotFound => Ok(StatusUpdateOutcome::NotFound),
            StatusChangeOutcome::Changed { report_id } => {
                let published = match self.publish_report(report_id) {
                    Ok(PublishOutcome::Published) => true,
                    Ok(other) => {
                        debug!(
                            "status change for report {} published nothing: {:?}",
                            report_id, other
                        );
                        false
                    }
                    Err(err) => {
                        warn!(
                            "status change for report {} committed but publish failed: {}",
                            report_id, err
                        );
                        false
                    }
                };
                Ok(StatusUpdateOutcome::Updated {
                    report_id,
                    published,
                })
            }
        }
    }

    /// Manager edit of work-order fields; creates the row lazily and forces a
    /// republish on the next upload pass.
    pub fn update_work_order(
        &self,
        report_id: i64,
        update: WorkOrderUpdate,
    ) -> Result<WorkOrderOutcome> {
        self.repository.update_work_order(report_id, &update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use crate::errors::{DocumentStoreError, Error};
    use crate::reports::{PublishProjection, Report, SyncHistoryEntry};

    /// In-memory document store with merge semantics, local to engine tests.
    #[derive(Default)]
    struct FakeDocuments {
        collections: Mutex<BTreeMap<String, BTreeMap<String, Map<String, Value>>>>,
        fail_merges_into: Mutex<Option<String>>,
    }

    impl FakeDocuments {
        fn seed(&self, collection: &str, id: &str, fields: Value) {
            let Value::Object(fields) = fields else {
                panic!("seed fields must be an object");
            };
            self.collections
                .lock()
                .unwrap()
                .entry(collection.to_string())
                .or_default()
                .insert(id.to_string(), fields);
        }

        fn field(&self, collection: &str, id: &str, field: &str) -> Option<Value> {
            self.collections
                .lock()
                .unwrap()
                .get(collection)?
                .get(id)?
                .get(field)
                .cloned()
        }
    }

    impl DocumentStore for FakeDocuments {
        fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
            Ok(self
                .collections
                .lock()
                .unwrap()
                .get(collection)
                .and_then(|docs| docs.get(id))
                .map(|fields| Document::new(id, fields.clone())))
        }

        fn query_eq(&self, collection: &str, field: &str, value: &Value) -> Result<Vec<Document>> {
            Ok(self
                .collections
                .lock()
                .unwrap()
                .get(collection)
                .map(|docs| {
                    docs.iter()
                        .filter(|(_, fields)| fields.get(field) == Some(value))
                        .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                        .collect()
                })
                .unwrap_or_default())
        }

        fn merge(&self, collection: &str, id: &str, fields: &Map<String, Value>) -> Result<()> {
            if self.fail_merges_into.lock().unwrap().as_deref() == Some(collection) {
                return Err(DocumentStoreError::Transport("injected failure".to_string()).into());
            }
            let mut collections = self.collections.lock().unwrap();
            let target = collections
                .entry(collection.to_string())
                .or_default()
                .entry(id.to_string())
                .or_default();
            for (key, value) in fields {
                target.insert(key.clone(), value.clone());
            }
            Ok(())
        }
    }

    /// Minimal repository double tracking ingested ids and pending flags.
    #[derive(Default)]
    struct FakeRepository {
        ingested: Mutex<BTreeMap<String, i64>>,
        pending: Mutex<BTreeMap<i64, PublishProjection>>,
    }

    impl FakeRepository {
        fn stage_pending(&self, projection: PublishProjection) {
            self.pending
                .lock()
                .unwrap()
                .insert(projection.report_id, projection);
        }
    }

    fn projection(report_id: i64) -> PublishProjection {
        PublishProjection {
            report_id,
            report_sync_id: report_id,
            firebase_id: Some(format!("d{report_id}")),
            longitude: 47.5,
            latitude: -18.9,
            city: Some("Tana".to_string()),
            problem_type_id: 1,
            surface: None,
            budget: Some("5000000".to_string()),
            progress: Some("50".to_string()),
            company_id: Some(1),
            company_name: Some("ACME".to_string()),
            report_status_id: 2,
            sent_to_firebase: Some(false),
        }
    }

    impl ReportRepositoryTrait for FakeRepository {
        fn ingest_submission(&self, submission: &SourceDocument) -> Result<IngestOutcome> {
            let mut ingested = self.ingested.lock().unwrap();
            if let Some(existing) = ingested.get(&submission.firebase_id) {
                return Ok(IngestOutcome::AlreadyIngested {
                    report_id: *existing,
                });
            }
            let report_id = ingested.len() as i64 + 1;
            ingested.insert(submission.firebase_id.clone(), report_id);
            Ok(IngestOutcome::Created { report_id })
        }

        fn pending_publish_report_ids(&self) -> Result<Vec<i64>> {
            Ok(self.pending.lock().unwrap().keys().copied().collect())
        }

        fn publish_with(
            &self,
            report_id: i64,
            write: &dyn Fn(&PublishProjection) -> Result<()>,
        ) -> Result<PublishOutcome> {
            let staged = self.pending.lock().unwrap().get(&report_id).cloned();
            match staged {
                None => Ok(PublishOutcome::NotFound),
                Some(projection) if !crate::sync::is_publish_pending(projection.sent_to_firebase) => {
                    Ok(PublishOutcome::AlreadySent)
                }
                Some(projection) => {
                    write(&projection)?;
                    self.pending
                        .lock()
                        .unwrap()
                        .get_mut(&report_id)
                        .expect("staged row")
                        .sent_to_firebase = Some(true);
                    Ok(PublishOutcome::Published)
                }
            }
        }

        fn change_status(
            &self,
            report_sync_id: i64,
            status_id: i64,
            progress: Option<String>,
        ) -> Result<StatusChangeOutcome> {
            let mut pending = self.pending.lock().unwrap();
            let Some(row) = pending.get_mut(&report_sync_id) else {
                return Ok(StatusChangeOutcome::NotFound);
            };
            row.report_status_id = status_id;
            if progress.is_some() {
                row.progress = progress;
            }
            row.sent_to_firebase = Some(false);
            Ok(StatusChangeOutcome::Changed {
                report_id: row.report_id,
            })
        }

        fn update_work_order(
            &self,
            _report_id: i64,
            _update: &WorkOrderUpdate,
        ) -> Result<WorkOrderOutcome> {
            unimplemented!("not exercised by engine unit tests")
        }

        fn find_report_by_firebase_id(&self, _firebase_id: &str) -> Result<Option<Report>> {
            Ok(None)
        }

        fn history_for(&self, _report_sync_id: i64) -> Result<Vec<SyncHistoryEntry>> {
            Ok(Vec::new())
        }
    }

    fn engine_with(repository: Arc<FakeRepository>, documents: Arc<FakeDocuments>) -> SyncEngine {
        SyncEngine::new(repository, documents)
    }

    #[test]
    fn download_ingests_and_writes_back() {
        let repository = Arc::new(FakeRepository::default());
        let documents = Arc::new(FakeDocuments::default());
        documents.seed(
            SOURCE_COLLECTION,
            "d1",
            serde_json::json!({"is_synced": false, "user_id": "u1", "longitude": 47.5}),
        );

        let engine = engine_with(repository, Arc::clone(&documents));
        let outcome = engine.download_all().expect("download");
        assert_eq!(outcome.processed(), 1);
        assert_eq!(outcome.ingested, 1);

        assert_eq!(
            documents.field(SOURCE_COLLECTION, "d1", "is_synced"),
            Some(Value::Bool(true))
        );
        assert_eq!(
            documents.field(SOURCE_COLLECTION, "d1", "postgres_report_id"),
            Some(Value::from(1))
        );
        // Merge write-back preserved the untouched submission fields.
        assert_eq!(
            documents.field(SOURCE_COLLECTION, "d1", "longitude"),
            Some(Value::from(47.5))
        );
    }

    #[test]
    fn download_skips_malformed_documents_without_aborting_batch() {
        let repository = Arc::new(FakeRepository::default());
        let documents = Arc::new(FakeDocuments::default());
        documents.seed(SOURCE_COLLECTION, "bad", serde_json::json!({"is_synced": false}));
        documents.seed(
            SOURCE_COLLECTION,
            "good",
            serde_json::json!({"is_synced": false, "user_id": "u2"}),
        );

        let engine = engine_with(repository, Arc::clone(&documents));
        let outcome = engine.download_all().expect("download");
        assert_eq!(outcome.ingested, 1);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].id, "bad");
        // A payload missing its submitter never fixes itself.
        assert!(!outcome.failures[0].retryable);
        assert_eq!(
            documents.field(SOURCE_COLLECTION, "bad", "is_synced"),
            Some(Value::Bool(false))
        );
    }

    #[test]
    fn upload_publishes_pending_rows_and_is_idempotent() {
        let repository = Arc::new(FakeRepository::default());
        repository.stage_pending(projection(10));
        let documents = Arc::new(FakeDocuments::default());

        let engine = engine_with(Arc::clone(&repository), Arc::clone(&documents));
        let first = engine.upload_all().expect("upload");
        assert_eq!(first.published, 1);
        assert_eq!(
            documents.field(PUBLISHED_COLLECTION, "10", "budget"),
            Some(Value::from(5_000_000.0))
        );

        let second = engine.upload_all().expect("upload again");
        assert_eq!(second.published, 0);
        assert!(second.failures.is_empty());
    }

    #[test]
    fn set_status_reports_publish_failure_without_losing_change() {
        let repository = Arc::new(FakeRepository::default());
        repository.stage_pending(projection(10));
        let documents = Arc::new(FakeDocuments::default());
        *documents.fail_merges_into.lock().unwrap() = Some(PUBLISHED_COLLECTION.to_string());

        let engine = engine_with(Arc::clone(&repository), Arc::clone(&documents));
        let outcome = engine
            .set_status(10, 3, Some("70".to_string()))
            .expect("set_status");
        assert_eq!(
            outcome,
            StatusUpdateOutcome::Updated {
                report_id: 10,
                published: false
            }
        );

        // The row stayed pending; a later pass publishes the fresh values.
        *documents.fail_merges_into.lock().unwrap() = None;
        let retried = engine.upload_all().expect("retry upload");
        assert_eq!(retried.published, 1);
        assert_eq!(
            documents.field(PUBLISHED_COLLECTION, "10", "progress"),
            Some(Value::from(70.0))
        );
        assert_eq!(
            documents.field(PUBLISHED_COLLECTION, "10", "report_status_id"),
            Some(Value::from(3))
        );
    }

    #[test]
    fn set_status_returns_not_found_for_missing_work_order() {
        let engine = engine_with(
            Arc::new(FakeRepository::default()),
            Arc::new(FakeDocuments::default()),
        );
        let outcome = engine.set_status(99, 2, None).expect("set_status");
        assert_eq!(outcome, StatusUpdateOutcome::NotFound);
    }

    #[test]
    fn download_surfaces_write_back_failure_as_item_failure() {
        let repository = Arc::new(FakeRepository::default());
        let documents = Arc::new(FakeDocuments::default());
        documents.seed(
            SOURCE_COLLECTION,
            "d1",
            serde_json::json!({"is_synced": false, "user_id": "u1"}),
        );
        *documents.fail_merges_into.lock().unwrap() = Some(SOURCE_COLLECTION.to_string());

        let engine = engine_with(Arc::clone(&repository), Arc::clone(&documents));
        let outcome = engine.download_all().expect("download");
        assert_eq!(outcome.processed(), 0);
        assert_eq!(outcome.failures.len(), 1);
        assert!(outcome.failures[0].retryable);
        assert!(matches!(
            engine.upload_all().map(|o| o.published),
            Ok(0)
        ));

        // Retry completes only the write-back; the repository dedupes.
        *documents.fail_merges_into.lock().unwrap() = None;
        let retried = engine.download_all().expect("retry");
        assert_eq!(retried.already_ingested, 1);
        assert_eq!(retried.ingested, 0);
    }
}
