use crate::domain::contract::validate_response;
use crate::domain::recommendation::InferenceResponse;
use crate::error::SignalError;
use serde_json::Value;

/// Parses raw model output and validates it against the response schema.
///
/// No repair is attempted: markdown fences or leading prose make the whole
/// text malformed, and the original text travels with the error.
pub fn parse_response(text: &str) -> Result<InferenceResponse, SignalError> {
    let value = serde_json::from_str::<Value>(text).map_err(|e| SignalError::MalformedResponse {
        detail: e.to_string(),
        raw: text.to_string(),
    })?;
    validate_response(&value)
}
