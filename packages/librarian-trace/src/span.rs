use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier for a [`TraceSpan`]. Empty when the tracer is disabled
/// (spec.md §4.G, "Disable switch").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct SpanId(pub String);

impl SpanId {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single recorded event within a span's lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpanEvent {
    pub name: String,
    /// Milliseconds since Unix epoch.
    pub timestamp: i64,
    pub attributes: BTreeMap<String, Value>,
}

/// A named, timestamped unit of work, possibly nested under a parent span
/// (spec.md §4.G). Timestamps are milliseconds since Unix epoch throughout,
/// matching the tracer export format in spec.md §6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceSpan {
    pub id: SpanId,
    pub name: String,
    pub start_time: i64,
    pub end_time: Option<i64>,
    pub parent_id: Option<SpanId>,
    pub attributes: BTreeMap<String, Value>,
    pub events: Vec<SpanEvent>,
}

impl TraceSpan {
    pub fn is_ended(&self) -> bool {
        self.end_time.is_some()
    }

    pub fn duration_ms(&self) -> Option<i64> {
        self.end_time.map(|end| end - self.start_time)
    }

    /// The `status` attribute, if any (`"ok"` / `"error"`), used by the
    /// human tree formatter to pick a status icon.
    pub fn status(&self) -> Option<&str> {
        self.attributes.get("status").and_then(Value::as_str)
    }
}
