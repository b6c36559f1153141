//! Response parsing: model text → typed [`ExtractionResult`].
//!
//! The body must be one JSON object matching the side's schema. The only
//! cleanup applied first is unwrapping an outer ```` ```json ```` fence,
//! which providers without a JSON response mode add despite the prompt.
//! Nothing else is coerced; on failure the raw body travels with the error.

use crate::error::ExtractError;
use crate::schema::{BackFields, ExtractionResult, FrontFields, Side};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static RE_OUTER_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:json|JSON)?\s*\n(.*?)\n?```$").unwrap());

/// Strip a single outer code fence, if present.
pub fn strip_json_fence(input: &str) -> &str {
    let trimmed = input.trim();
    match RE_OUTER_FENCE.captures(trimmed) {
        Some(caps) => caps.get(1).map_or(trimmed, |m| m.as_str().trim()),
        None => trimmed,
    }
}

/// Parse a response body as the given side's schema.
pub fn parse_response(side: Side, raw: &str) -> Result<ExtractionResult, ExtractError> {
    let parse_err = |detail: String| ExtractError::Parse {
        side,
        detail,
        raw: raw.to_string(),
    };

    let value: Value = serde_json::from_str(strip_json_fence(raw))
        .map_err(|e| parse_err(format!("not valid JSON: {e}")))?;

    if !value.is_object() {
        return Err(parse_err(format!(
            "expected a JSON object, got {}",
            json_kind(&value)
        )));
    }

    let result = match side {
        Side::Front => serde_json::from_value::<FrontFields>(value).map(ExtractionResult::Front),
        Side::Back => serde_json::from_value::<BackFields>(value).map(ExtractionResult::Back),
    };
    result.map_err(|e| parse_err(e.to_string()))
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
