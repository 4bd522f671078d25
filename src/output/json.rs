//! JSON serialization for bootstrap support results.

use crate::result::SupportResult;

/// Serialize a SupportResult to a compact JSON string.
///
/// # Errors
///
/// Returns an error if serialization fails (should not happen for SupportResult).
pub fn to_json(result: &SupportResult) -> Result<String, serde_json::Error> {
    serde_json::to_string(result)
}

/// Serialize a SupportResult to a pretty-printed JSON string.
///
/// # Errors
///
/// Returns an error if serialization fails (should not happen for SupportResult).
pub fn to_json_pretty(result: &SupportResult) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(result)
}
