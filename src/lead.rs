//! Decoded lead payloads and correlation ids.

use lead_verifier_kafka::{Header, Record};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Header key carrying the producer's correlation id.
pub const CORRELATION_ID_HEADER: &str = "correlationId";

/// Reasons a record payload cannot be turned into a [`Lead`].
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("record has no payload")]
    MissingPayload,

    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("payload is a JSON {0}, expected an object")]
    NotAnObject(&'static str),

    #[error("payload has no 'email' field")]
    MissingEmail,

    #[error("'email' field is a JSON {0}, expected a string")]
    EmailNotString(&'static str),
}

/// A lead: a JSON object with at least a string `email` field.
///
/// All other fields are kept as-is and only used for logging.
#[derive(Debug, Clone, PartialEq)]
pub struct Lead {
    email: String,
    fields: Map<String, Value>,
}

impl Lead {
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let fields = match serde_json::from_slice::<Value>(bytes)? {
            Value::Object(fields) => fields,
            other => return Err(DecodeError::NotAnObject(json_kind(&other))),
        };

        let email = match fields.get("email") {
            Some(Value::String(email)) => email.clone(),
            Some(other) => return Err(DecodeError::EmailNotString(json_kind(other))),
            None => return Err(DecodeError::MissingEmail),
        };

        Ok(Self { email, fields })
    }

    /// Decode the payload of a record. Tombstones are a decode error.
    pub fn from_record(record: &Record) -> Result<Self, DecodeError> {
        let payload = record.payload.as_deref().ok_or(DecodeError::MissingPayload)?;
        Self::decode(payload)
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

impl fmt::Display for Lead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(&self.fields).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Correlation id of a record, or an empty string.
///
/// Only the header at position 0 is inspected, and only if its key is
/// `correlationId`. A matching header anywhere else is ignored.
pub fn correlation_id(headers: &[Header]) -> String {
    match headers.first() {
        Some(header) if header.key == CORRELATION_ID_HEADER => header
            .value
            .as_deref()
            .map(|v| String::from_utf8_lossy(v).into_owned())
            .unwrap_or_default(),
        _ => String::new(),
    }
}
