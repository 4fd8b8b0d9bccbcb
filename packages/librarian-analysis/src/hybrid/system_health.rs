use std::collections::HashMap;

use librarian_graph::{EntityId, GraphModel};
use librarian_storage::{FeedbackLoop, Severity};

use super::control_stability::ControlStability;
use crate::deterministic::adjacency_stats;
use crate::probabilistic::{aggregate_report, BetaPosterior};

/// Fraction thresholds for the critical-issue and recommendation checklists
/// (spec.md §4.E, "System-health report").
const VOLATILE_FRACTION_ALERT: f64 = 0.2;
const DENSITY_ALERT: f64 = 0.5;
const LOW_CONFIDENCE_FRACTION_ALERT: f64 = 0.3;
/// An entity counts toward the "low confidence" fraction when its
/// directRisk (`1 - mean`) would exceed 0.5 — i.e. mean < 0.5.
const LOW_CONFIDENCE_MEAN_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthGrade {
    A,
    B,
    C,
    D,
    F,
}

impl HealthGrade {
    fn from_score(score: u32) -> Self {
        if score >= 90 {
            HealthGrade::A
        } else if score >= 80 {
            HealthGrade::B
        } else if score >= 70 {
            HealthGrade::C
        } else if score >= 60 {
            HealthGrade::D
        } else {
            HealthGrade::F
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SystemHealthReport {
    pub score: u32,
    pub grade: HealthGrade,
    pub structural: f64,
    pub confidence: f64,
    pub stability: f64,
    pub coupling: f64,
    pub critical_issues: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Compute a whole-graph [`SystemHealthReport`] (spec.md §4.E,
/// "System-health report"): four weighted sub-scores averaged and scaled
/// to a 0-100 score, graded A-F.
pub fn system_health(
    graph: &GraphModel,
    posteriors: &HashMap<EntityId, BetaPosterior>,
    stability: ControlStability,
    loops: &[FeedbackLoop],
) -> SystemHealthReport {
    let stats = adjacency_stats(graph);
    let n = graph.node_count();

    let isolated_fraction = if n > 0 {
        stats.isolated.len() as f64 / n as f64
    } else {
        0.0
    };
    let structural = mean3(
        1.0 - stats.density,
        1.0 - isolated_fraction,
        (1.0 - stats.avg_out_degree / 20.0).max(0.0),
    );

    // Pooled mean across entities that carry a confidence record — summed
    // alpha/beta, not an average of per-entity means (spec.md §4.E,
    // "System-health report"); 0.5 when none carry a record.
    let pooled: Vec<BetaPosterior> = posteriors.values().copied().collect();
    let confidence = aggregate_report(&pooled).map(|(mean, _)| mean).unwrap_or(0.5);

    let coupling = (1.0 - stability.loop_risk) * (1.0 - stability.change_amplification);

    let score = (25.0 * (structural + confidence + stability.overall + coupling)).round() as u32;
    let grade = HealthGrade::from_score(score);

    let critical_loop_count = loops.iter().filter(|l| l.severity == Severity::Critical).count();
    let low_confidence_fraction = if n > 0 {
        graph
            .nodes()
            .filter(|id| {
                posteriors.get(*id).map(|p| p.mean()).unwrap_or(0.5) < LOW_CONFIDENCE_MEAN_THRESHOLD
            })
            .count() as f64
            / n as f64
    } else {
        0.0
    };

    let mut critical_issues = Vec::new();
    let mut recommendations = Vec::new();

    if critical_loop_count > 0 {
        critical_issues.push(format!(
            "{critical_loop_count} critical feedback loop(s) detected"
        ));
        recommendations.push("Break critical cycles by introducing an abstraction boundary".to_string());
    }
    if stability.volatile_fraction > VOLATILE_FRACTION_ALERT {
        critical_issues.push(format!(
            "volatile fraction {:.0}% exceeds {:.0}%",
            stability.volatile_fraction * 100.0,
            VOLATILE_FRACTION_ALERT * 100.0
        ));
        recommendations.push("Stabilize frequently-changing entities before further coupling them".to_string());
    }
    if stats.density > DENSITY_ALERT {
        critical_issues.push(format!("graph density {:.2} exceeds {DENSITY_ALERT}", stats.density));
        recommendations.push("Reduce edge density through module decomposition".to_string());
    }
    if low_confidence_fraction > LOW_CONFIDENCE_FRACTION_ALERT {
        critical_issues.push(format!(
            "{:.0}% of entities have low confidence",
            low_confidence_fraction * 100.0
        ));
        recommendations.push("Prioritize test coverage for low-confidence entities".to_string());
    }

    SystemHealthReport {
        score,
        grade,
        structural,
        confidence,
        stability: stability.overall,
        coupling,
        critical_issues,
        recommendations,
    }
}

fn mean3(a: f64, b: f64, c: f64) -> f64 {
    (a + b + c) / 3.0
}
