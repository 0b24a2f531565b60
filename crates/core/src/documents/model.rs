//! Validated record shapes for the two synchronized collections.
//!
//! Mobile payloads are duck-typed; the defaulting rules live here at the
//! adapter boundary so reconciler logic only ever sees well-formed records.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::errors::{DocumentStoreError, Result};
use crate::reports::{PublishProjection, DEFAULT_STATUS_ID};
use crate::sync::{coerce_json_number, coerce_number};

use super::Document;

/// An unsynced mobile submission from the `reports` collection.
///
/// `submitter_id` is the only hard requirement; everything else defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    pub firebase_id: String,
    pub reported_at: Option<String>,
    pub longitude: f64,
    pub latitude: f64,
    pub city: Option<String>,
    pub problem_type_id: i64,
    pub report_status_id: i64,
    pub submitter_id: String,
}

impl SourceDocument {
    /// Decode a raw document, applying the collection's defaulting rules.
    /// Coordinates are coerced with a zero fallback; lookup ids default to the
    /// initial status/problem type.
    pub fn decode(document: &Document) -> Result<Self> {
        let fields = &document.fields;
        let submitter_id = fields
            .get("user_id")
            .and_then(Value::as_str)
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| {
                DocumentStoreError::shape(format!(
                    "document {} has no submitter user_id",
                    document.id
                ))
            })?
            .to_string();

        Ok(Self {
            firebase_id: document.id.clone(),
            reported_at: fields
                .get("reported_at")
                .and_then(Value::as_str)
                .map(str::to_string),
            longitude: fields.get("longitude").map(coerce_json_number).unwrap_or(0.0),
            latitude: fields.get("latitude").map(coerce_json_number).unwrap_or(0.0),
            city: fields.get("city").and_then(Value::as_str).map(str::to_string),
            problem_type_id: lookup_id(fields.get("problem_type_id")),
            report_status_id: lookup_id(fields.get("report_status_id")),
            submitter_id,
        })
    }
}

fn lookup_id(value: Option<&Value>) -> i64 {
    value
        .and_then(Value::as_i64)
        .filter(|id| *id > 0)
        .unwrap_or(DEFAULT_STATUS_ID)
}

/// The denormalized projection written to `reports_traites`, keyed by the
/// relational report id. Repeated writes merge, so publishing is idempotent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishedDocument {
    pub original_firebase_id: Option<String>,
    pub postgres_report_id: i64,
    pub longitude: f64,
    pub latitude: f64,
    pub city: Option<String>,
    pub surface: Option<String>,
    pub budget: f64,
    pub progress: f64,
    pub report_status_id: i64,
    pub problem_type_id: i64,
    pub company_id: Option<i64>,
    pub company_name: Option<String>,
    pub synced_at: String,
}

impl PublishedDocument {
    /// Build the publishable shape from a joined relational projection.
    /// `budget` and `progress` are stored as free text and coerced here.
    pub fn from_projection(projection: &PublishProjection, synced_at: String) -> Self {
        Self {
            original_firebase_id: projection.firebase_id.clone(),
            postgres_report_id: projection.report_id,
            longitude: projection.longitude,
            latitude: projection.latitude,
            city: projection.city.clone(),
            surface: projection.surface.clone(),
            budget: coerce_number(projection.budget.as_deref()),
            progress: coerce_number(projection.progress.as_deref()),
            report_status_id: projection.report_status_id,
            problem_type_id: projection.problem_type_id,
            company_id: projection.company_id,
            company_name: projection.company_name.clone(),
            synced_at,
        }
    }

    /// Serialize into a flat field map for a merge write.
    pub fn into_fields(self) -> Result<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(fields) => Ok(fields),
            other => Err(DocumentStoreError::shape(format!(
                "projection serialized to non-object value: {other}"
            ))
            .into()),
        }
    }
}
