use serde::{Deserialize, Serialize};

use crate::span::{SpanId, TraceSpan};
use crate::tracer::Tracer;

/// Wire shape for `exportStructuredTrace()` (spec.md §6, "Tracer export
/// format"). Times are milliseconds since Unix epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredTrace {
    pub spans: Vec<TraceSpan>,
    pub root_span_id: Option<SpanId>,
    pub start_time: i64,
    pub end_time: i64,
    pub duration_ms: i64,
}

/// Compute trace start/end/duration and identify a single root when exactly
/// one parentless span exists (spec.md §4.G, "Export").
pub fn export_structured_trace(tracer: &Tracer) -> StructuredTrace {
    let spans = tracer.export_traces();

    let start_time = spans.iter().map(|s| s.start_time).min().unwrap_or(0);
    let end_time = spans
        .iter()
        .map(|s| s.end_time.unwrap_or(s.start_time))
        .max()
        .unwrap_or(0);

    let mut roots = spans.iter().filter(|s| s.parent_id.is_none());
    let root_span_id = match (roots.next(), roots.next()) {
        (Some(only), None) => Some(only.id.clone()),
        _ => None,
    };

    StructuredTrace {
        spans,
        root_span_id,
        start_time,
        end_time,
        duration_ms: end_time - start_time,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_parentless_span_is_the_root() {
        let tracer = Tracer::new();
        let root = tracer.start_span("root", None, None);
        let _child = tracer.start_span("child", Some(root.clone()), None);
        tracer.end_span(&_child);
        tracer.end_span(&root);

        let structured = export_structured_trace(&tracer);
        assert_eq!(structured.root_span_id, Some(root));
    }

    #[test]
    fn multiple_parentless_spans_have_no_single_root() {
        let tracer = Tracer::new();
        tracer.start_span("a", None, None);
        tracer.start_span("b", None, None);
        let structured = export_structured_trace(&tracer);
        assert_eq!(structured.root_span_id, None);
    }

    #[test]
    fn empty_tracer_exports_zeroed_trace() {
        let tracer = Tracer::new();
        let structured = export_structured_trace(&tracer);
        assert_eq!(structured.duration_ms, 0);
        assert!(structured.spans.is_empty());
    }
}
