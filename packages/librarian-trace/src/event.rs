use std::collections::BTreeMap;

use serde_json::Value;

/// A raw event off the domain event bus: `{type: string, data: map}`
/// (spec.md §6, "Event bus").
#[derive(Debug, Clone)]
pub struct RawEvent {
    pub event_type: String,
    pub data: BTreeMap<String, Value>,
}

impl RawEvent {
    pub fn new(event_type: impl Into<String>, data: BTreeMap<String, Value>) -> Self {
        Self {
            event_type: event_type.into(),
            data,
        }
    }
}

/// The event families the bridge recognizes (spec.md §6, "the bridge
/// recognizes the query/bootstrap/indexing/engine/task/file/context-pack/
/// upgrade event families").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventFamily {
    Query,
    Bootstrap,
    Indexing,
    Engine,
    Task,
    File,
    ContextPack,
    Upgrade,
}

impl EventFamily {
    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "query" => Some(Self::Query),
            "bootstrap" => Some(Self::Bootstrap),
            "indexing" => Some(Self::Indexing),
            "engine" => Some(Self::Engine),
            "task" => Some(Self::Task),
            "file" => Some(Self::File),
            "context_pack" | "context-pack" | "contextpack" => Some(Self::ContextPack),
            "upgrade" => Some(Self::Upgrade),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Bootstrap => "bootstrap",
            Self::Indexing => "indexing",
            Self::Engine => "engine",
            Self::Task => "task",
            Self::File => "file",
            Self::ContextPack => "context_pack",
            Self::Upgrade => "upgrade",
        }
    }
}

/// Lifecycle phase inferred from an event's type string suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPhase {
    Started,
    Progress,
    Completed,
    Failed,
    /// No discernible lifecycle — treated as a point-in-time occurrence.
    Instant,
}

/// A domain event, classified into a recognized family + lifecycle phase,
/// or left as a generic `{type, attrs}` case when the family tag is
/// unrecognized (spec.md §9, "Dynamic dispatch").
#[derive(Debug, Clone)]
pub struct DomainEvent {
    pub family: Option<EventFamily>,
    pub phase: EventPhase,
    pub event_type: String,
    pub operation_id: Option<String>,
    pub data: BTreeMap<String, Value>,
}

impl DomainEvent {
    pub fn parse(raw: RawEvent) -> Self {
        let (prefix, suffix) = match raw.event_type.split_once('.') {
            Some((p, s)) => (p, Some(s)),
            None => (raw.event_type.as_str(), None),
        };
        let family = EventFamily::from_prefix(prefix);
        let phase = match suffix {
            Some("started" | "start" | "begin") => EventPhase::Started,
            Some("completed" | "finished" | "done" | "success") => EventPhase::Completed,
            Some("failed" | "error") => EventPhase::Failed,
            Some("progress" | "updated" | "changed") => EventPhase::Progress,
            _ => EventPhase::Instant,
        };
        let operation_id = raw
            .data
            .get("id")
            .or_else(|| raw.data.get("operation_id"))
            .and_then(Value::as_str)
            .map(str::to_string);

        Self {
            family,
            phase,
            event_type: raw.event_type,
            operation_id,
            data: raw.data,
        }
    }

    /// Correlation key `"{kind}:{id}"` used to look up the active span for
    /// this event's operation (spec.md §4.G, "Event bridge").
    pub fn correlation_key(&self) -> Option<String> {
        let kind = self.family.map(|f| f.as_str().to_string())?;
        let id = self.operation_id.clone().unwrap_or_else(|| "_".to_string());
        Some(format!("{kind}:{id}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognized_family_and_started_phase_parse() {
        let mut data = BTreeMap::new();
        data.insert("id".to_string(), Value::String("job-1".into()));
        let event = DomainEvent::parse(RawEvent::new("indexing.started", data));
        assert_eq!(event.family, Some(EventFamily::Indexing));
        assert_eq!(event.phase, EventPhase::Started);
        assert_eq!(event.correlation_key().as_deref(), Some("indexing:job-1"));
    }

    #[test]
    fn unrecognized_family_has_no_correlation_key() {
        let event = DomainEvent::parse(RawEvent::new("mystery.started", BTreeMap::new()));
        assert_eq!(event.family, None);
        assert_eq!(event.correlation_key(), None);
    }

    #[test]
    fn no_dot_in_type_is_instant_phase() {
        let event = DomainEvent::parse(RawEvent::new("heartbeat", BTreeMap::new()));
        assert_eq!(event.phase, EventPhase::Instant);
    }
}
