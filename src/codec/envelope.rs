//! Tagged-envelope JSON encoding of attribute mappings
//!
//! Values JSON can hold natively pass through unchanged. Everything else is
//! wrapped in an envelope:
//!
//! ```text
//! {"_marker": "timestamp", "value": "2024-05-01T12:30:45.123456789Z"}
//! {"_marker": "opaque",    "value": "<base64 payload>"}
//! ```
//!
//! Any JSON object carrying the marker key is an envelope, so the marker key
//! is reserved and may not be used as an attribute name at any depth.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Datelike, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde_json::{Map, Value as JsonValue};

use super::errors::{CodecError, CodecResult};
use super::value::{Attributes, Opaque, Value};

/// Key identifying an envelope
pub const MARKER_KEY: &str = "_marker";

/// Key holding the envelope payload
pub const VALUE_KEY: &str = "value";

const TIMESTAMP_KIND: &str = "timestamp";
const OPAQUE_KIND: &str = "opaque";

// RFC 3339 has four-digit years only
const TIMESTAMP_YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

// ctime(3) text, as written by older stores. Day of month may be space padded.
const LEGACY_TIMESTAMP_FORMAT: &str = "%a %b %d %H:%M:%S %Y";

/// Encode an attribute mapping as row text
pub fn encode(attributes: &Attributes) -> CodecResult<String> {
    let json = to_json(attributes)?;
    serde_json::to_string(&json).map_err(|e| CodecError::Parse(e.to_string()))
}

/// Decode row text into an attribute mapping
pub fn decode(text: &str) -> CodecResult<Attributes> {
    let json: JsonValue =
        serde_json::from_str(text).map_err(|e| CodecError::Parse(e.to_string()))?;
    from_json(json)
}

/// Encode an attribute mapping as a tagged JSON object
pub fn to_json(attributes: &Attributes) -> CodecResult<JsonValue> {
    Ok(JsonValue::Object(encode_map(attributes)?))
}

/// Decode a tagged JSON object into an attribute mapping.
///
/// The top level must be a plain mapping, not an envelope.
pub fn from_json(json: JsonValue) -> CodecResult<Attributes> {
    match json {
        JsonValue::Object(map) => {
            if map.contains_key(MARKER_KEY) {
                return Err(CodecError::Parse(
                    "row content must be a mapping, found an envelope".to_string(),
                ));
            }
            decode_map(map)
        }
        other => Err(CodecError::Parse(format!(
            "row content must be a mapping, found {}",
            json_kind(&other)
        ))),
    }
}

/// Fixed textual form of a timestamp
pub fn format_timestamp(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Parse a timestamp written by [`format_timestamp`] or by the legacy
/// ctime form (taken as UTC).
pub fn parse_timestamp(text: &str) -> CodecResult<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(text) {
        return Ok(t.with_timezone(&Utc));
    }

    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    NaiveDateTime::parse_from_str(&normalized, LEGACY_TIMESTAMP_FORMAT)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|_| CodecError::InvalidTimestamp(text.to_string()))
}

fn encode_map(map: &Attributes) -> CodecResult<Map<String, JsonValue>> {
    let mut out = Map::new();
    for (name, value) in map {
        if name == MARKER_KEY {
            return Err(CodecError::ReservedAttribute(name.clone()));
        }
        out.insert(name.clone(), encode_value(value)?);
    }
    Ok(out)
}

fn encode_value(value: &Value) -> CodecResult<JsonValue> {
    let json = match value {
        Value::Null => JsonValue::Null,
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Number(n) => JsonValue::Number(n.clone()),
        Value::String(s) => JsonValue::String(s.clone()),
        Value::List(items) => JsonValue::Array(
            items
                .iter()
                .map(encode_value)
                .collect::<CodecResult<Vec<_>>>()?,
        ),
        Value::Map(map) => JsonValue::Object(encode_map(map)?),
        Value::Timestamp(t) => {
            if !TIMESTAMP_YEARS.contains(&t.year()) {
                return Err(CodecError::InvalidTimestamp(format_timestamp(t)));
            }
            envelope(TIMESTAMP_KIND, JsonValue::String(format_timestamp(t)))
        }
        Value::Opaque(o) => envelope(OPAQUE_KIND, JsonValue::String(STANDARD.encode(o.as_bytes()))),
    };
    Ok(json)
}

fn envelope(kind: &str, payload: JsonValue) -> JsonValue {
    let mut map = Map::new();
    map.insert(MARKER_KEY.to_string(), JsonValue::String(kind.to_string()));
    map.insert(VALUE_KEY.to_string(), payload);
    JsonValue::Object(map)
}

fn decode_map(map: Map<String, JsonValue>) -> CodecResult<Attributes> {
    map.into_iter()
        .map(|(name, value)| Ok((name, decode_value(value)?)))
        .collect()
}

fn decode_value(json: JsonValue) -> CodecResult<Value> {
    let value = match json {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Bool(b),
        JsonValue::Number(n) => Value::Number(n),
        JsonValue::String(s) => Value::String(s),
        JsonValue::Array(items) => Value::List(
            items
                .into_iter()
                .map(decode_value)
                .collect::<CodecResult<Vec<_>>>()?,
        ),
        JsonValue::Object(map) => {
            if map.contains_key(MARKER_KEY) {
                decode_envelope(map)?
            } else {
                Value::Map(decode_map(map)?)
            }
        }
    };
    Ok(value)
}

fn decode_envelope(mut map: Map<String, JsonValue>) -> CodecResult<Value> {
    let kind = match map.remove(MARKER_KEY) {
        Some(JsonValue::String(kind)) => kind,
        Some(other) => {
            return Err(CodecError::MalformedEnvelope(format!(
                "marker must be a string, found {}",
                json_kind(&other)
            )))
        }
        None => return Err(CodecError::MalformedEnvelope("missing marker".to_string())),
    };

    if kind != TIMESTAMP_KIND && kind != OPAQUE_KIND {
        return Err(CodecError::UnsupportedType(kind));
    }

    let payload = match map.remove(VALUE_KEY) {
        Some(JsonValue::String(payload)) => payload,
        Some(other) => {
            return Err(CodecError::MalformedEnvelope(format!(
                "{} payload must be a string, found {}",
                kind,
                json_kind(&other)
            )))
        }
        None => {
            return Err(CodecError::MalformedEnvelope(format!(
                "{} envelope has no {}",
                kind, VALUE_KEY
            )))
        }
    };

    if kind == TIMESTAMP_KIND {
        parse_timestamp(&payload).map(Value::Timestamp)
    } else {
        let bytes = STANDARD
            .decode(payload.as_bytes())
            .map_err(|e| CodecError::MalformedEnvelope(format!("opaque payload: {}", e)))?;
        Ok(Value::Opaque(Opaque::from_bytes(bytes)))
    }
}

fn json_kind(json: &JsonValue) -> &'static str {
    match json {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "list",
        JsonValue::Object(_) => "map",
    }
}
