//! Directional gate rules and boundary coercions.
//!
//! Two independent flags drive the engine:
//!
//! - `is_synced` (document -> relational): false until a relational report row
//!   exists for the document. The report row is inserted already-synced inside
//!   the ingest transaction; the document copy of the flag flips only through
//!   the post-commit merge write-back, so a retried pass re-attempts the
//!   write-back alone.
//! - `sent_to_firebase` (relational -> document): false or NULL whenever
//!   relational state is newer than the last published projection. Every
//!   work-order mutation resets it; the publisher flips it back inside the
//!   same transaction that read the projection.

use chrono::Utc;
use serde_json::Value;

/// `sent_to_firebase` treats NULL and `false` identically: the row has never
/// been published, or was edited since the last publish.
pub fn is_publish_pending(sent_to_firebase: Option<bool>) -> bool {
    !sent_to_firebase.unwrap_or(false)
}

/// Coerce a loosely-typed stored value to a number, with a zero fallback.
///
/// Manager-entered fields (`budget`, `progress`) are persisted verbatim and
/// may hold non-numeric junk; one bad value must never abort a publish batch.
pub fn coerce_number(raw: Option<&str>) -> f64 {
    let Some(raw) = raw else {
        return 0.0;
    };
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => {
            if !raw.trim().is_empty() {
                log::warn!("Non-numeric value {:?} coerced to 0", raw);
            }
            0.0
        }
    }
}

/// Coerce a JSON value (number, numeric string, or anything else) to `f64`.
pub fn coerce_json_number(value: &Value) -> f64 {
    match value {
        Value::Number(number) => number.as_f64().unwrap_or(0.0),
        Value::String(raw) => coerce_number(Some(raw)),
        _ => 0.0,
    }
}

/// Default a missing or blank submission timestamp to "now" (RFC3339).
pub fn default_timestamp(raw: Option<String>) -> String {
    raw.filter(|value| !value.trim().is_empty())
        .unwrap_or_else(now_rfc3339)
}

/// Current UTC time as an RFC3339 string, the storage format for timestamps.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}
