//! JSON Output

use crate::ReportError;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Generate a prettified JSON report.
///
/// Works for any of the report types (benchmark, memory, accuracy).
pub fn generate_json_report<T: Serialize>(report: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

/// Load a report previously written by [`generate_json_report`].
pub fn load_json_report<T: DeserializeOwned>(json: &str) -> Result<T, ReportError> {
    Ok(serde_json::from_str(json)?)
}
