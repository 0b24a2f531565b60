//! Conversion between plain JSON field maps and Firestore's typed value
//! encoding (`stringValue`, `integerValue`, `mapValue`, ...).

use serde_json::{json, Map, Number, Value};

use roadreport_core::errors::{DocumentStoreError, Result};

/// Encode a plain JSON value into the Firestore typed representation.
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(flag) => json!({ "booleanValue": flag }),
        Value::Number(number) => {
            // Firestore carries 64-bit integers as strings.
            if let Some(integer) = number.as_i64() {
                json!({ "integerValue": integer.to_string() })
            } else {
                json!({ "doubleValue": number.as_f64() })
            }
        }
        Value::String(text) => json!({ "stringValue": text }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(fields) => json!({ "mapValue": { "fields": encode_fields(fields) } }),
    }
}

/// Encode every field of a flat map.
pub fn encode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(name, value)| (name.clone(), encode_value(value)))
        .collect()
}

/// Decode one Firestore typed value back into plain JSON.
pub fn decode_value(value: &Value) -> Result<Value> {
    let Value::Object(wrapper) = value else {
        return Err(DocumentStoreError::shape(format!("expected a typed value, got {value}")).into());
    };
    let Some((kind, inner)) = wrapper.iter().next() else {
        return Err(DocumentStoreError::shape("empty typed value").into());
    };

    let decoded = match kind.as_str() {
        "nullValue" => Value::Null,
        "booleanValue" => inner.clone(),
        "integerValue" => {
            let raw = match inner {
                Value::String(text) => text.parse::<i64>().ok(),
                other => other.as_i64(),
            };
            let integer = raw.ok_or_else(|| {
                DocumentStoreError::shape(format!("bad integerValue: {inner}"))
            })?;
            Value::Number(integer.into())
        }
        "doubleValue" => {
            let float = inner
                .as_f64()
                .ok_or_else(|| DocumentStoreError::shape(format!("bad doubleValue: {inner}")))?;
            Number::from_f64(float)
                .map(Value::Number)
                .unwrap_or(Value::Null)
        }
        "stringValue" | "timestampValue" | "referenceValue" => inner.clone(),
        "geoPointValue" => inner.clone(),
        "arrayValue" => {
            let items = inner
                .get("values")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            Value::Array(items.iter().map(decode_value).collect::<Result<_>>()?)
        }
        "mapValue" => {
            let fields = inner
                .get("fields")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();
            Value::Object(decode_fields(&fields)?)
        }
        other => {
            return Err(
                DocumentStoreError::shape(format!("unsupported value kind: {other}")).into(),
            )
        }
    };
    Ok(decoded)
}

/// Decode every field of a typed map.
pub fn decode_fields(fields: &Map<String, Value>) -> Result<Map<String, Value>> {
    fields
        .iter()
        .map(|(name, value)| Ok((name.clone(), decode_value(value)?)))
        .collect()
}
