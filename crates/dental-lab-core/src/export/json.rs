//! JSON export and import.

use serde_json::Value;
use tracing::{info, warn};

use super::{ExportError, ExportResult};
use crate::models::CaseRecord;

/// Serialize the full collection as a pretty-printed JSON array.
pub fn to_json(cases: &[CaseRecord]) -> ExportResult<String> {
    let json = serde_json::to_string_pretty(cases)
        .map_err(|e| ExportError::Serialization(e.to_string()))?;
    info!(cases = cases.len(), "exported cases to JSON");
    Ok(json)
}

/// Parse a JSON export back into case records.
///
/// The whole document is checked before anything is returned: it must be an
/// array, and every element must be an object with a non-empty `id` and
/// `patientName`. On any failure the caller gets `ImportFormat` and no
/// records. Other fields are decoded leniently and never reject the file.
pub fn from_json(text: &str) -> ExportResult<Vec<CaseRecord>> {
    let value: Value = serde_json::from_str(text).map_err(|e| {
        warn!(error = %e, "rejected import: not valid JSON");
        ExportError::ImportFormat(format!("Could not parse the JSON file: {}", e))
    })?;

    let items = match value {
        Value::Array(items) => items,
        _ => {
            warn!("rejected import: top-level value is not a list");
            return Err(ExportError::ImportFormat(
                "Invalid JSON file format: expected a list of cases".into(),
            ));
        }
    };

    for (i, item) in items.iter().enumerate() {
        check_required(item).map_err(|field| {
            warn!(index = i, field, "rejected import: missing required field");
            ExportError::ImportFormat(format!(
                "Invalid JSON file format: case {} is missing `{}`",
                i, field
            ))
        })?;
    }

    let cases = items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            serde_json::from_value::<CaseRecord>(item).map_err(|e| {
                ExportError::ImportFormat(format!("Invalid JSON file format: case {}: {}", i, e))
            })
        })
        .collect::<ExportResult<Vec<_>>>()?;

    info!(cases = cases.len(), "parsed JSON import");
    Ok(cases)
}

/// Name of the first required field that is missing or empty.
fn check_required(item: &Value) -> Result<(), &'static str> {
    for field in ["id", "patientName"] {
        let present = item
            .get(field)
            .and_then(Value::as_str)
            .map(|s| !s.is_empty())
            .unwrap_or(false);
        if !present {
            return Err(field);
        }
    }
    Ok(())
}
