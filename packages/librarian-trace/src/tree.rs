use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::span::{SpanId, TraceSpan};
use crate::tracer::Tracer;

/// One node of a [`build_trace_tree`] forest.
#[derive(Debug, Clone)]
pub struct TraceNode {
    pub span: TraceSpan,
    pub children: Vec<TraceNode>,
    pub duration_ms: Option<i64>,
}

/// Build a forest of spans rooted at `root_id`, or at every parentless span
/// when `root_id` is `None` (spec.md §4.G, "Tree rendering").
pub fn build_trace_tree(tracer: &Tracer, root_id: Option<&SpanId>) -> Vec<TraceNode> {
    let spans = tracer.export_traces();
    let mut children_of: BTreeMap<SpanId, Vec<TraceSpan>> = BTreeMap::new();
    let mut roots: Vec<TraceSpan> = Vec::new();

    for span in spans {
        match &span.parent_id {
            Some(parent) => children_of.entry(parent.clone()).or_default().push(span),
            None => roots.push(span),
        }
    }

    fn assemble(span: TraceSpan, children_of: &mut BTreeMap<SpanId, Vec<TraceSpan>>) -> TraceNode {
        let duration_ms = span.duration_ms();
        let kids = children_of.remove(&span.id).unwrap_or_default();
        let children = kids
            .into_iter()
            .map(|c| assemble(c, children_of))
            .collect();
        TraceNode {
            span,
            children,
            duration_ms,
        }
    }

    match root_id {
        Some(id) => {
            if let Some(span) = tracer.span(id) {
                vec![assemble(span, &mut children_of)]
            } else {
                Vec::new()
            }
        }
        None => roots
            .into_iter()
            .map(|r| assemble(r, &mut children_of))
            .collect(),
    }
}

fn status_icon(span: &TraceSpan) -> &'static str {
    match span.status() {
        Some("ok") => "\u{2713}", // ✓
        Some("error") => "\u{2717}", // ✗
        _ => "\u{2022}", // •
    }
}

/// Render a forest of [`TraceNode`]s as indented ASCII box-drawing text.
pub fn render_tree(nodes: &[TraceNode]) -> String {
    let mut out = String::new();
    for (i, node) in nodes.iter().enumerate() {
        render_node(node, "", i + 1 == nodes.len(), &mut out);
    }
    out
}

fn render_node(node: &TraceNode, prefix: &str, is_last: bool, out: &mut String) {
    let connector = if is_last { "\u{2514}\u{2500} " } else { "\u{251c}\u{2500} " };
    let duration = node
        .duration_ms
        .map(|d| format!("{d}ms"))
        .unwrap_or_else(|| "unfinished".to_string());
    let _ = writeln!(
        out,
        "{prefix}{connector}{} {} ({duration})",
        status_icon(&node.span),
        node.span.name
    );
    let child_prefix = format!(
        "{prefix}{}",
        if is_last { "    " } else { "\u{2502}   " }
    );
    let count = node.children.len();
    for (i, child) in node.children.iter().enumerate() {
        render_node(child, &child_prefix, i + 1 == count, out);
    }
}
