//! Entry parser - decodes and validates inbound payloads

use chrono::{DateTime, FixedOffset};
use contracts::EntryError;
use serde_json::{Map, Value};
use tracing::{debug, error};

use crate::timestamp;

/// Kind applied when the payload has none
pub const INFO: &str = "info";
/// Error kind
pub const ERROR: &str = "error";
/// Warning kind
pub const WARN: &str = "warning";

/// A normalized log submission.
///
/// `message` is never empty; `kind` keeps the caller's casing until rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    kind: String,
    message: String,
    timestamp: DateTime<FixedOffset>,
}

impl Entry {
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        self.timestamp
    }

    pub(crate) fn into_parts(self) -> (String, String, DateTime<FixedOffset>) {
        (self.kind, self.message, self.timestamp)
    }
}

/// Decode `body` into an [`Entry`].
///
/// - `type` falls back to [`INFO`] when absent, empty or not a string
/// - `message` must be a non-empty string
/// - `timestamp` falls back to the current time when absent, empty or not a
///   string, and must parse when given
///
/// # Errors
/// [`EntryError::CorruptedPayload`] for anything but a JSON object,
/// [`EntryError::EmptyObject`] for `{}`, [`EntryError::EmptyMessage`] and
/// [`EntryError::InvalidTimestamp`] for the field rules above.
pub fn parse(body: &[u8]) -> Result<Entry, EntryError> {
    let object = decode_object(body)?;

    let kind = match string_field(&object, "type") {
        Some(kind) => kind.to_string(),
        None => {
            debug!("falling back to info");
            INFO.to_string()
        }
    };

    let Some(message) = string_field(&object, "message") else {
        error!(error = %EntryError::EmptyMessage, "rejecting entry");
        return Err(EntryError::EmptyMessage);
    };

    let timestamp = match string_field(&object, "timestamp") {
        Some(raw) => timestamp::parse_timestamp(raw).ok_or_else(|| {
            let err = EntryError::invalid_timestamp(raw);
            error!(error = %err, "rejecting entry");
            err
        })?,
        None => {
            debug!("no timestamp provided");
            timestamp::now()
        }
    };

    Ok(Entry {
        kind,
        message: message.to_string(),
        timestamp,
    })
}

fn decode_object(body: &[u8]) -> Result<Map<String, Value>, EntryError> {
    let value: Value = serde_json::from_slice(body).map_err(|e| {
        error!(error = %e, "decoding json object");
        EntryError::corrupted(e.to_string())
    })?;

    match value {
        Value::Object(object) if object.is_empty() => {
            error!(error = %EntryError::EmptyObject, "decoding json object");
            Err(EntryError::EmptyObject)
        }
        Value::Object(object) => Ok(object),
        other => {
            let err = EntryError::corrupted(format!("expected an object, got {}", type_name(&other)));
            error!(error = %err, "decoding json object");
            Err(err)
        }
    }
}

/// Non-empty string value of `key`, if any
fn string_field<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    object
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
