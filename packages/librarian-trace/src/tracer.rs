use std::collections::{BTreeMap, VecDeque};

use chrono::Utc;
use parking_lot::RwLock;
use serde_json::Value;
use uuid::Uuid;

use crate::span::{SpanEvent, SpanId, TraceSpan};

const DEFAULT_MAX_SPANS: usize = 10_000;

struct State {
    spans: BTreeMap<SpanId, TraceSpan>,
    /// Insertion order, oldest first — used to evict when over capacity
    /// (spec.md §5, "excess spans are dropped oldest-first").
    order: VecDeque<SpanId>,
    /// Convenience stack of in-flight spans. Not required for correctness
    /// and not guaranteed under concurrent producers (spec.md §4.G).
    active_stack: Vec<SpanId>,
}

impl State {
    fn new() -> Self {
        Self {
            spans: BTreeMap::new(),
            order: VecDeque::new(),
            active_stack: Vec::new(),
        }
    }

    fn evict_if_over_capacity(&mut self, max_spans: usize) {
        while self.order.len() > max_spans {
            if let Some(oldest) = self.order.pop_front() {
                self.spans.remove(&oldest);
                self.active_stack.retain(|id| id != &oldest);
            } else {
                break;
            }
        }
    }
}

/// In-memory hierarchical span recorder (spec.md §4.G).
///
/// All library functions that need tracing accept a `&Tracer` explicitly
/// rather than reaching for a global — see spec.md §9, "Global tracer": a
/// module-level default may exist for ergonomics, but the tracer itself is
/// an injected resource scoped to one analysis session.
pub struct Tracer {
    enabled: bool,
    max_spans: usize,
    state: RwLock<State>,
}

impl Tracer {
    pub fn new() -> Self {
        Self {
            enabled: true,
            max_spans: DEFAULT_MAX_SPANS,
            state: RwLock::new(State::new()),
        }
    }

    /// A disabled tracer: every mutating call is a no-op, returns empty
    /// span IDs, and allocates nothing (spec.md §4.G, "Disable switch").
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            max_spans: DEFAULT_MAX_SPANS,
            state: RwLock::new(State::new()),
        }
    }

    pub fn with_max_spans(max_spans: usize) -> Self {
        Self {
            enabled: true,
            max_spans,
            state: RwLock::new(State::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Start a new span, returning its ID. When `parent_id` is `None`, the
    /// current top of the convenience active-span stack (if any) is used.
    pub fn start_span(
        &self,
        name: impl Into<String>,
        parent_id: Option<SpanId>,
        attributes: Option<BTreeMap<String, Value>>,
    ) -> SpanId {
        if !self.enabled {
            return SpanId::default();
        }
        let id = SpanId(Uuid::new_v4().to_string());
        let mut state = self.state.write();
        let parent_id = parent_id.or_else(|| state.active_stack.last().cloned());
        let span = TraceSpan {
            id: id.clone(),
            name: name.into(),
            start_time: Utc::now().timestamp_millis(),
            end_time: None,
            parent_id,
            attributes: attributes.unwrap_or_default(),
            events: Vec::new(),
        };
        state.spans.insert(id.clone(), span);
        state.order.push_back(id.clone());
        state.active_stack.push(id.clone());
        state.evict_if_over_capacity(self.max_spans);
        id
    }

    /// End a span. Ending an already-ended or unknown span is a no-op.
    pub fn end_span(&self, span_id: &SpanId) {
        if !self.enabled || span_id.is_empty() {
            return;
        }
        let mut state = self.state.write();
        let already_ended = state
            .spans
            .get(span_id)
            .map(|s| s.is_ended())
            .unwrap_or(true);
        if already_ended {
            return;
        }
        let now = Utc::now().timestamp_millis();
        if let Some(span) = state.spans.get_mut(span_id) {
            span.end_time = Some(now);
        }
        if state.active_stack.last() == Some(span_id) {
            state.active_stack.pop();
        } else {
            state.active_stack.retain(|id| id != span_id);
        }
    }

    pub fn add_event(
        &self,
        span_id: &SpanId,
        name: impl Into<String>,
        attributes: Option<BTreeMap<String, Value>>,
    ) {
        if !self.enabled || span_id.is_empty() {
            return;
        }
        let mut state = self.state.write();
        if let Some(span) = state.spans.get_mut(span_id) {
            span.events.push(SpanEvent {
                name: name.into(),
                timestamp: Utc::now().timestamp_millis(),
                attributes: attributes.unwrap_or_default(),
            });
        }
    }

    pub fn set_attributes(&self, span_id: &SpanId, attributes: BTreeMap<String, Value>) {
        if !self.enabled || span_id.is_empty() {
            return;
        }
        let mut state = self.state.write();
        if let Some(span) = state.spans.get_mut(span_id) {
            span.attributes.extend(attributes);
        }
    }

    /// The span currently on top of the convenience active-span stack, if
    /// any.
    pub fn current_span(&self) -> Option<SpanId> {
        self.state.read().active_stack.last().cloned()
    }

    /// All recorded spans, in start order.
    pub fn export_traces(&self) -> Vec<TraceSpan> {
        let state = self.state.read();
        state
            .order
            .iter()
            .filter_map(|id| state.spans.get(id).cloned())
            .collect()
    }

    pub fn span(&self, id: &SpanId) -> Option<TraceSpan> {
        self.state.read().spans.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.read().spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Tracer {
    fn default() -> Self {
        Self::new()
    }
}
