//! In-memory hierarchical tracing spine (spec.md §4.G).
//!
//! `Tracer` instruments every operation in the deterministic, probabilistic,
//! hybrid, and recovery-learner components. It is an injected resource, not
//! a process-wide singleton (spec.md §9, "Global tracer") — callers that
//! want ergonomic access at a module boundary can hold one behind a
//! `&'static Tracer` or similar, but every library function here takes it
//! as an explicit parameter.

mod bridge;
mod event;
mod export;
mod span;
mod tracer;
mod tree;

pub use bridge::EventBridge;
pub use event::{DomainEvent, EventFamily, EventPhase, RawEvent};
pub use export::{export_structured_trace, StructuredTrace};
pub use span::{SpanEvent, SpanId, TraceSpan};
pub use tracer::Tracer;
pub use tree::{build_trace_tree, render_tree, TraceNode};
