//! Structured events produced from log lines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One structured, sink-ready record derived from a single log line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Schema tag identifying the field layout (e.g., "w3c-access/1")
    pub schema: String,

    /// Event time, parsed from the line
    pub timestamp: DateTime<Utc>,

    /// Named fields, typed as strings, numbers or null
    pub fields: Map<String, Value>,
}

impl Event {
    /// Creates an event with no fields.
    pub fn new(schema: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            schema: schema.into(),
            timestamp,
            fields: Map::new(),
        }
    }

    /// Sets a field value.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Returns a field value by name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}
