use std::collections::HashMap;

use parking_lot::Mutex;

use crate::event::{DomainEvent, EventPhase, RawEvent};
use crate::span::SpanId;
use crate::tracer::Tracer;

/// Subscribes to a domain event bus and maps domain events to span
/// operations by operation ID (spec.md §4.G, "Event bridge").
pub struct EventBridge<'t> {
    tracer: &'t Tracer,
    active_spans: Mutex<HashMap<String, SpanId>>,
}

impl<'t> EventBridge<'t> {
    pub fn new(tracer: &'t Tracer) -> Self {
        Self {
            tracer,
            active_spans: Mutex::new(HashMap::new()),
        }
    }

    /// Handle one raw event off the bus.
    pub fn handle(&self, raw: RawEvent) {
        let event = DomainEvent::parse(raw);

        let Some(key) = event.correlation_key() else {
            // Unrecognized tag: instantaneous span named `event:{type}`
            // carrying the payload as attributes (spec.md §4.G).
            let span = self.tracer.start_span(
                format!("event:{}", event.event_type),
                None,
                Some(event.data.clone()),
            );
            self.tracer.end_span(&span);
            return;
        };

        match event.phase {
            EventPhase::Started => {
                let span = self.tracer.start_span(
                    event.event_type.clone(),
                    None,
                    Some(event.data.clone()),
                );
                self.active_spans.lock().insert(key, span);
            }
            EventPhase::Progress => {
                let active = self.active_spans.lock().get(&key).cloned();
                match active {
                    Some(span) => {
                        self.tracer
                            .add_event(&span, event.event_type.clone(), Some(event.data.clone()));
                    }
                    None => self.instantaneous(&event),
                }
            }
            EventPhase::Completed | EventPhase::Failed => {
                let removed = self.active_spans.lock().remove(&key);
                match removed {
                    Some(span) => {
                        let status = if matches!(event.phase, EventPhase::Failed) {
                            "error"
                        } else {
                            "ok"
                        };
                        let mut attrs = event.data.clone();
                        attrs.insert("status".to_string(), serde_json::json!(status));
                        self.tracer.set_attributes(&span, attrs);
                        self.tracer.end_span(&span);
                    }
                    None => self.instantaneous(&event),
                }
            }
            EventPhase::Instant => self.instantaneous(&event),
        }
    }

    fn instantaneous(&self, event: &DomainEvent) {
        let span =
            self.tracer
                .start_span(event.event_type.clone(), None, Some(event.data.clone()));
        self.tracer.end_span(&span);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn started_then_completed_closes_one_span() {
        let tracer = Tracer::new();
        let bridge = EventBridge::new(&tracer);
        let mut data = BTreeMap::new();
        data.insert("id".to_string(), serde_json::json!("job-1"));

        bridge.handle(RawEvent::new("task.started", data.clone()));
        bridge.handle(RawEvent::new("task.completed", data));

        let spans = tracer.export_traces();
        assert_eq!(spans.len(), 1);
        assert!(spans[0].is_ended());
        assert_eq!(spans[0].status(), Some("ok"));
    }

    #[test]
    fn failed_without_started_is_recorded_as_instant() {
        let tracer = Tracer::new();
        let bridge = EventBridge::new(&tracer);
        bridge.handle(RawEvent::new("task.failed", BTreeMap::new()));
        assert_eq!(tracer.export_traces().len(), 1);
    }

    #[test]
    fn unknown_family_becomes_event_prefixed_instant_span() {
        let tracer = Tracer::new();
        let bridge = EventBridge::new(&tracer);
        bridge.handle(RawEvent::new("mystery.started", BTreeMap::new()));
        let spans = tracer.export_traces();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].name, "event:mystery.started");
    }
}
