//! Action execution result types.

use serde::{Deserialize, Serialize};

use crate::Record;

/// Result of a successful action execution.
///
/// The `data` mapping is merged into the run context under the step's id so
/// downstream steps can reference it (e.g. `{{ create_ticket.ticket_id }}`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionOutput {
    /// Output fields produced by the action.
    pub data: Record,

    /// Execution duration in milliseconds, when measured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl ActionOutput {
    /// Create an output from a JSON object value.
    ///
    /// Non-object values are wrapped under a `"value"` key so the output is
    /// always a flat mapping.
    pub fn from_value(value: serde_json::Value) -> Self {
        let data = match value {
            serde_json::Value::Object(map) => map,
            other => {
                let mut map = Record::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        Self {
            data,
            duration_ms: None,
        }
    }

    /// Set the execution duration.
    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Read a string field from the output.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(|v| v.as_str())
    }
}
