use serde::Serialize;
use serde_json::{Map, Value};

use crate::BridgeError;

/// Uniform `{success, ...payload | error}` response handed to front ends.
///
/// Payload keys are flattened next to `success`, so a config read serializes
/// as `{"success":true,"config":{...}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub success: bool,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
}

impl Envelope {
    pub fn ok() -> Self {
        Self {
            success: true,
            payload: Map::new(),
            error: None,
            error_kind: None,
        }
    }

    pub fn failure(err: &BridgeError) -> Self {
        Self::failure_with(err.kind(), err.to_string())
    }

    pub fn failure_with(kind: &str, error: impl Into<String>) -> Self {
        Self {
            success: false,
            payload: Map::new(),
            error: Some(error.into()),
            error_kind: Some(kind.to_string()),
        }
    }

    /// Attach a payload entry. A value that cannot be represented as JSON
    /// turns the envelope into a failure instead of panicking.
    pub fn with(mut self, key: &str, value: impl Serialize) -> Self {
        match serde_json::to_value(value) {
            Ok(value) => {
                self.payload.insert(key.to_string(), value);
                self
            }
            Err(err) => Self::failure_with("encoding", format!("failed to encode {key}: {err}")),
        }
    }

    /// Copy every field of a serializable struct into the payload.
    pub fn merge(mut self, value: impl Serialize) -> Self {
        match serde_json::to_value(value) {
            Ok(Value::Object(fields)) => {
                self.payload.extend(fields);
                self
            }
            Ok(other) => self.with("value", other),
            Err(err) => Self::failure_with("encoding", format!("failed to encode payload: {err}")),
        }
    }

    pub fn message(self, message: impl Into<String>) -> Self {
        self.with("message", message.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
