//! Report domain models and the relational repository contract.

mod model;

pub use model::*;

use crate::documents::SourceDocument;
use crate::errors::Result;

/// Default id for open-enumeration lookup rows (initial report status, user
/// status, fallback problem type).
pub const DEFAULT_STATUS_ID: i64 = 1;

/// Synthetic stable email derived from a document's submitter identifier,
/// used to create-or-find the owning relational user.
pub fn synthetic_email(submitter_id: &str) -> String {
    format!("{submitter_id}@local")
}

/// Result of ingesting one source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// A new report row was inserted.
    Created { report_id: i64 },
    /// A report with this `firebase_id` already exists; only the document
    /// write-back still needs to happen.
    AlreadyIngested { report_id: i64 },
}

impl IngestOutcome {
    pub fn report_id(&self) -> i64 {
        match self {
            Self::Created { report_id } | Self::AlreadyIngested { report_id } => *report_id,
        }
    }
}

/// Result of a single-row publish attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Published,
    /// The row carries no pending change; nothing was written.
    AlreadySent,
    /// No report or work order exists for the id.
    NotFound,
}

/// Result of a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChangeOutcome {
    Changed { report_id: i64 },
    NotFound,
}

/// Result of a work-order edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkOrderOutcome {
    Created { report_sync_id: i64 },
    Updated { report_sync_id: i64 },
    NotFound,
}

/// Transactional access to the relational system of record.
///
/// Every method runs its work inside exactly one transaction: commit on
/// success, rollback and propagate on any failure, connection released on
/// every exit path. Implemented by `roadreport-storage-sqlite`.
pub trait ReportRepositoryTrait: Send + Sync {
    /// Resolve-or-create the owning user, insert a report row (fields copied
    /// verbatim, timestamp defaulting to now, inserted already-synced with
    /// `firebase_id` set exactly once), and return the generated id.
    ///
    /// A duplicate `firebase_id` means another pass already ingested this
    /// document; implementations report it as [`IngestOutcome::AlreadyIngested`]
    /// rather than failing.
    fn ingest_submission(&self, submission: &SourceDocument) -> Result<IngestOutcome>;

    /// Report ids of work orders whose `sent_to_firebase` flag is false/NULL.
    fn pending_publish_report_ids(&self) -> Result<Vec<i64>>;

    /// Publish one report: inside a single transaction, re-read the full
    /// joined projection, hand it to `write`, then flip `sent_to_firebase`
    /// to true. An edit landing after commit is left pending for the next
    /// pass; a failing `write` rolls the flag flip back.
    fn publish_with(
        &self,
        report_id: i64,
        write: &dyn Fn(&PublishProjection) -> Result<()>,
    ) -> Result<PublishOutcome>;

    /// Atomically update work-order status (and optionally progress), mirror
    /// the status onto the owning report, append one history row, and reset
    /// `sent_to_firebase`.
    fn change_status(
        &self,
        report_sync_id: i64,
        status_id: i64,
        progress: Option<String>,
    ) -> Result<StatusChangeOutcome>;

    /// Create the work order lazily on first edit, or overwrite the existing
    /// one. Always resets `sent_to_firebase`, forcing a republish.
    fn update_work_order(&self, report_id: i64, update: &WorkOrderUpdate)
        -> Result<WorkOrderOutcome>;

    /// Look up a report by the originating document id.
    fn find_report_by_firebase_id(&self, firebase_id: &str) -> Result<Option<Report>>;

    /// Append-only audit trail for a work order, ordered by change time.
    fn history_for(&self, report_sync_id: i64) -> Result<Vec<SyncHistoryEntry>>;
}
