//! Chat transcript payload.

use crate::jsonl::{self, JsonObject, JsonlError};
use serde_json::Value;

/// An ordered chat transcript: record 0 is the header, the rest are
/// messages. Every record is a JSON object.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChatPayload {
    records: Vec<Value>,
}

impl ChatPayload {
    /// Validate and wrap a JSON value. Fails unless it is an array of
    /// objects.
    pub fn from_value(value: Value) -> Result<Self, JsonlError> {
        match value {
            Value::Array(records) => Self::from_records(records),
            _ => Err(JsonlError::PayloadNotArray),
        }
    }

    pub fn from_records(records: Vec<Value>) -> Result<Self, JsonlError> {
        jsonl::validate_payload(&records)?;
        Ok(Self { records })
    }

    pub fn from_objects(objects: Vec<JsonObject>) -> Self {
        Self {
            records: objects.into_iter().map(Value::Object).collect(),
        }
    }

    pub fn header(&self) -> Option<&Value> {
        self.records.first()
    }

    pub fn messages(&self) -> &[Value] {
        self.records.get(1..).unwrap_or_default()
    }

    pub fn records(&self) -> &[Value] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_value(self) -> Value {
        Value::Array(self.records)
    }
}
