use std::collections::HashMap;

use chrono::{DateTime, Utc};
use librarian_graph::{EntityId, GraphModel};
use librarian_storage::{FeedbackLoop, LoopType, Severity};

use crate::deterministic::Scc;

/// Classify SCCs into [`FeedbackLoop`]s, fusing shape (size, internal edge
/// density) with confidence (spec.md §4.E, "Feedback-loop detection").
/// Components of size 1 are kept only when they carry a self-loop;
/// components of size < 2 otherwise contribute no loop.
pub fn classify_feedback_loops(
    graph: &GraphModel,
    sccs: &[Scc],
    mean_confidence: &HashMap<EntityId, f64>,
    now: DateTime<Utc>,
) -> Vec<FeedbackLoop> {
    sccs.iter()
        .filter(|scc| scc.size() >= 2 || scc.is_cyclic)
        .map(|scc| {
            let loop_type = classify_loop_type(graph, scc);
            let avg_mean = average_confidence(scc, mean_confidence);
            let severity = classify_severity(scc.size(), avg_mean);
            FeedbackLoop {
                loop_id: format!("loop-{}", scc.root()),
                entities: scc.members.clone(),
                loop_type,
                severity,
                is_stable: severity != Severity::Critical,
                cycle_length: scc.size(),
                detected_at: now,
            }
        })
        .collect()
}

fn internal_edge_count(graph: &GraphModel, scc: &Scc) -> usize {
    scc.members
        .iter()
        .map(|m| {
            graph
                .neighbors(m)
                .iter()
                .filter(|n| scc.members.contains(n))
                .count()
        })
        .sum()
}

/// Internal edge density `d = internalEdges / (|C|·(|C|−1))`. A size-1
/// self-loop has no denominator under that formula; it is treated as
/// maximally dense (`d = 1.0`), since its one possible internal edge is
/// present (spec.md §9 leaves the size-1 case open; see DESIGN.md).
fn classify_loop_type(graph: &GraphModel, scc: &Scc) -> LoopType {
    let size = scc.size();
    if size == 2 {
        return LoopType::MutualRecursion;
    }
    let density = if size < 2 {
        1.0
    } else {
        internal_edge_count(graph, scc) as f64 / (size as f64 * (size as f64 - 1.0))
    };
    if density > 0.7 {
        LoopType::StateCycle
    } else {
        LoopType::CircularImport
    }
}

fn average_confidence(scc: &Scc, mean_confidence: &HashMap<EntityId, f64>) -> f64 {
    let total: f64 = scc
        .members
        .iter()
        .map(|m| mean_confidence.get(m).copied().unwrap_or(0.5))
        .sum();
    total / scc.size() as f64
}

fn classify_severity(size: usize, avg_mean: f64) -> Severity {
    if size >= 5 {
        return Severity::Critical;
    }
    if avg_mean < 0.4 {
        return if size >= 3 { Severity::Critical } else { Severity::High };
    }
    if avg_mean < 0.6 {
        return if size >= 3 { Severity::High } else { Severity::Medium };
    }
    if size >= 3 { Severity::Medium } else { Severity::Low }
}

/// Advisory, template-generated description of a loop's impact (spec.md
/// §4.E, "Impact description").
pub fn impact_description(loop_: &FeedbackLoop) -> String {
    let shape = match loop_.loop_type {
        LoopType::MutualRecursion => "mutual recursion",
        LoopType::StateCycle => "a tightly coupled state cycle",
        LoopType::CircularImport => "a circular import chain",
        LoopType::DataFlowCycle => "a data-flow cycle",
    };
    let severity = match loop_.severity {
        Severity::Low => "low",
        Severity::Medium => "moderate",
        Severity::High => "high",
        Severity::Critical => "critical",
    };
    format!(
        "{} entities form {}, assessed at {} severity.",
        loop_.cycle_length, shape, severity
    )
}
