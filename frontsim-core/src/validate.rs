//! Structural validation of front state against a settlement graph.
//!
//! Errors mark state that the pipeline must not run on (dangling ids,
//! impossible invariants); warnings mark state that is suspicious but
//! survivable (stale edges after a map revision, drifted condition sums).

use crate::fixed::Fixed;
use crate::graph::SettlementGraph;
use crate::report::ValidationIssue;
use crate::state::WarState;

// Condition fractions drift by a raw unit or two per turn from fixed-point
// truncation; anything past this is a real bookkeeping bug.
const CONDITION_SUM_TOLERANCE: Fixed = Fixed::from_raw(100);

/// Run all structural checks. An empty result means the state is safe to
/// step.
pub fn validate_front_state(state: &WarState, graph: &SettlementGraph) -> Vec<ValidationIssue> {
    let mut issues: Vec<ValidationIssue> = Vec::new();

    for (edge, record) in &state.front_pressure {
        let path = format!("front_pressure.{edge}");
        for endpoint in [edge.a(), edge.b()] {
            if !graph.contains(endpoint) {
                issues.push(
                    ValidationIssue::error(
                        "pressure-unknown-settlement",
                        format!("pressure edge {edge} references unknown settlement {endpoint}"),
                    )
                    .at(path.clone()),
                );
            }
        }
        if graph.contains(edge.a()) && graph.contains(edge.b()) && !graph.has_edge(edge) {
            issues.push(
                ValidationIssue::warning(
                    "pressure-edge-not-in-graph",
                    format!("pressure edge {edge} is not an edge of the settlement graph"),
                )
                .at(path.clone()),
            );
        }
        if record.last_updated_turn > state.turn {
            issues.push(
                ValidationIssue::error(
                    "pressure-turn-from-future",
                    format!(
                        "pressure edge {edge} updated at turn {} but state is at turn {}",
                        record.last_updated_turn, state.turn
                    ),
                )
                .at(path.clone()),
            );
        }
        if record.max_abs < record.value.abs() {
            issues.push(
                ValidationIssue::error(
                    "pressure-max-abs-behind",
                    format!(
                        "pressure edge {edge} has |value| {} above max_abs {}",
                        record.value.abs(),
                        record.max_abs
                    ),
                )
                .at(path),
            );
        }
    }

    if state.front_pressure.len() > graph.edges().len().saturating_mul(5) {
        issues.push(ValidationIssue::warning(
            "pressure-map-oversized",
            format!(
                "{} pressure records against {} graph edges",
                state.front_pressure.len(),
                graph.edges().len()
            ),
        ));
    }

    for (edge, segment) in &state.front_segments {
        let path = format!("front_segments.{edge}");
        for endpoint in [edge.a(), edge.b()] {
            if !graph.contains(endpoint) {
                issues.push(
                    ValidationIssue::error(
                        "segment-unknown-settlement",
                        format!("segment edge {edge} references unknown settlement {endpoint}"),
                    )
                    .at(path.clone()),
                );
            }
        }
        if graph.contains(edge.a()) && graph.contains(edge.b()) && !graph.has_edge(edge) {
            issues.push(
                ValidationIssue::warning(
                    "segment-edge-not-in-graph",
                    format!("segment edge {edge} is not an edge of the settlement graph"),
                )
                .at(path.clone()),
            );
        }
        let latest = segment.created_turn.max(segment.last_active_turn);
        if latest > state.turn {
            issues.push(
                ValidationIssue::error(
                    "segment-turn-from-future",
                    format!(
                        "segment edge {edge} stamped at turn {latest} but state is at turn {}",
                        state.turn
                    ),
                )
                .at(path.clone()),
            );
        }
        if segment.max_active_streak < segment.active_streak {
            issues.push(
                ValidationIssue::error(
                    "segment-max-streak-behind",
                    format!(
                        "segment edge {edge} has streak {} above max {}",
                        segment.active_streak, segment.max_active_streak
                    ),
                )
                .at(path),
            );
        }
    }

    if state.front_segments.len() > graph.edges().len().saturating_mul(5) {
        issues.push(ValidationIssue::warning(
            "segment-map-oversized",
            format!(
                "{} segment records against {} graph edges",
                state.front_segments.len(),
                graph.edges().len()
            ),
        ));
    }

    if let Some(aor) = state.aor.as_ref() {
        for (sid, assignment) in aor {
            if !state.control.contains_key(sid) {
                issues.push(
                    ValidationIssue::error(
                        "aor-unknown-settlement",
                        format!("AoR entry for {sid} has no control record"),
                    )
                    .at(format!("aor.{sid}")),
                );
            }
            if let Some(brigade_id) = assignment {
                if state.formation(brigade_id).is_none() {
                    issues.push(
                        ValidationIssue::error(
                            "aor-unknown-brigade",
                            format!("settlement {sid} assigned to unknown formation {brigade_id}"),
                        )
                        .at(format!("aor.{sid}")),
                    );
                }
            }
        }
    }

    for formation in state.formations.values() {
        if let Some(hq) = formation.hq.as_ref() {
            if !graph.contains(hq) {
                issues.push(
                    ValidationIssue::error(
                        "formation-unknown-hq",
                        format!("formation {} HQ {hq} is not in the graph", formation.id),
                    )
                    .at(format!("formations.{}", formation.id)),
                );
            }
        }
        for (park, condition) in [
            ("armor", &formation.composition.armor_condition),
            ("artillery", &formation.composition.artillery_condition),
        ] {
            let drift = (condition.sum() - Fixed::ONE).abs();
            if drift > CONDITION_SUM_TOLERANCE {
                issues.push(
                    ValidationIssue::error(
                        "condition-sum-drift",
                        format!(
                            "formation {} {park} condition sums to {}",
                            formation.id,
                            condition.sum()
                        ),
                    )
                    .at(format!("formations.{}.composition", formation.id)),
                );
            } else if drift > Fixed::ZERO {
                issues.push(
                    ValidationIssue::warning(
                        "condition-sum-rounding",
                        format!(
                            "formation {} {park} condition sums to {}",
                            formation.id,
                            condition.sum()
                        ),
                    )
                    .at(format!("formations.{}.composition", formation.id)),
                );
            }
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::EdgeId;
    use crate::report::Severity;
    use crate::state::{FactionId, FrontPressureRecord, FrontSegment};
    use crate::testing::{line_graph, three_faction_line};

    fn codes(issues: &[ValidationIssue]) -> Vec<&'static str> {
        issues.iter().map(|i| i.code).collect()
    }

    #[test]
    fn test_clean_state_passes() {
        let graph = line_graph(12);
        let state = three_faction_line()
            .with_brigade("b1", FactionId::Bravo, "s05")
            .build();
        assert!(validate_front_state(&state, &graph).is_empty());
    }

    #[test]
    fn test_unknown_pressure_endpoint_is_error() {
        let graph = line_graph(4);
        let mut state = three_faction_line().build();
        state.front_pressure.insert(
            EdgeId::new("s00", "zz99").unwrap(),
            FrontPressureRecord {
                value: 0,
                max_abs: 0,
                last_updated_turn: 0,
            },
        );

        let issues = validate_front_state(&state, &graph);
        assert!(codes(&issues).contains(&"pressure-unknown-settlement"));
        assert!(issues.iter().any(|i| i.severity == Severity::Error));
    }

    #[test]
    fn test_non_graph_edge_is_warning() {
        let graph = line_graph(4);
        let mut state = three_faction_line().build();
        // Both endpoints exist but are not adjacent.
        state.front_pressure.insert(
            EdgeId::new("s00", "s02").unwrap(),
            FrontPressureRecord {
                value: 0,
                max_abs: 0,
                last_updated_turn: 0,
            },
        );

        let issues = validate_front_state(&state, &graph);
        let issue = issues
            .iter()
            .find(|i| i.code == "pressure-edge-not-in-graph")
            .unwrap();
        assert_eq!(issue.severity, Severity::Warning);
    }

    #[test]
    fn test_future_turn_and_max_abs_are_errors() {
        let graph = line_graph(4);
        let mut state = three_faction_line().build();
        state.front_pressure.insert(
            EdgeId::new("s00", "s01").unwrap(),
            FrontPressureRecord {
                value: 7,
                max_abs: 3,
                last_updated_turn: 99,
            },
        );

        let issues = validate_front_state(&state, &graph);
        assert!(codes(&issues).contains(&"pressure-turn-from-future"));
        assert!(codes(&issues).contains(&"pressure-max-abs-behind"));
    }

    #[test]
    fn test_segment_bookkeeping_errors() {
        let graph = line_graph(4);
        let mut state = three_faction_line().build();
        state.front_segments.insert(
            EdgeId::new("s00", "s01").unwrap(),
            FrontSegment {
                active: true,
                created_turn: 99,
                last_active_turn: 99,
                active_streak: 7,
                max_active_streak: 2,
            },
        );

        let issues = validate_front_state(&state, &graph);
        assert!(codes(&issues).contains(&"segment-turn-from-future"));
        assert!(codes(&issues).contains(&"segment-max-streak-behind"));
        assert!(issues.iter().all(|i| i.severity == Severity::Error));
    }

    #[test]
    fn test_non_graph_segment_edge_is_warning() {
        let graph = line_graph(4);
        let mut state = three_faction_line().build();
        // Both endpoints exist but are not adjacent: stale after a map
        // revision, not fatal.
        state.front_segments.insert(
            EdgeId::new("s00", "s02").unwrap(),
            FrontSegment {
                active: false,
                created_turn: 0,
                last_active_turn: 0,
                active_streak: 0,
                max_active_streak: 1,
            },
        );

        let issues = validate_front_state(&state, &graph);
        let issue = issues
            .iter()
            .find(|i| i.code == "segment-edge-not-in-graph")
            .unwrap();
        assert_eq!(issue.severity, Severity::Warning);
    }

    #[test]
    fn test_dangling_aor_brigade_is_error() {
        let graph = line_graph(4);
        let mut state = three_faction_line().build();
        let mut aor = std::collections::BTreeMap::new();
        aor.insert("s00".to_string(), Some("ghost".to_string()));
        state.aor = Some(aor);

        let issues = validate_front_state(&state, &graph);
        assert!(codes(&issues).contains(&"aor-unknown-brigade"));
    }

    #[test]
    fn test_condition_drift_severity_scales() {
        let graph = line_graph(12);
        let mut state = three_faction_line()
            .with_brigade("b1", FactionId::Bravo, "s05")
            .build();
        // A raw-unit shortfall from truncation: warning only.
        state
            .formations
            .get_mut("b1")
            .unwrap()
            .composition
            .armor_condition
            .operational -= Fixed::from_raw(2);
        let issues = validate_front_state(&state, &graph);
        assert!(codes(&issues).contains(&"condition-sum-rounding"));
        assert!(!codes(&issues).contains(&"condition-sum-drift"));

        // A few percent missing: bookkeeping bug.
        state
            .formations
            .get_mut("b1")
            .unwrap()
            .composition
            .armor_condition
            .operational -= Fixed::from_raw(500);
        let issues = validate_front_state(&state, &graph);
        assert!(codes(&issues).contains(&"condition-sum-drift"));
    }
}
