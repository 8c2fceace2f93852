//! JSON decoding at the I/O boundary

use crate::error::RelayResult;
use serde_json::Value;

/// Parse `text` as a JSON document.
///
/// Malformed input surfaces as `RelayError::Parse` with serde's detail.
pub fn decode(text: &str) -> RelayResult<Value> {
    Ok(serde_json::from_str(text)?)
}
