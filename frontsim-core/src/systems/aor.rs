//! Brigade AoR allocation.
//!
//! Multi-source BFS ("Voronoi on the graph") from brigade HQ settlements:
//! the first brigade to reach a settlement claims it, ties broken by
//! formation id ordering. Settlements outside the front-active-plus-rear
//! set stay unassigned, as do front settlements of factions with no active
//! brigade (an undefended front, not an error).

use crate::fixed::Fixed;
use crate::graph::{SettlementGraph, SettlementId};
use crate::report::AorReport;
use crate::state::{FactionId, FormationId, WarState};
use crate::systems::front::front_active_with_rear;
use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Claim every settlement of `faction`'s territory reachable from an active
/// brigade HQ. Deterministic: brigade seeds in sorted id order, sorted
/// neighbor expansion, first claim wins.
fn assign_by_bfs(
    state: &WarState,
    graph: &SettlementGraph,
    faction: FactionId,
    eligible: &BTreeSet<SettlementId>,
) -> BTreeMap<SettlementId, FormationId> {
    let brigades = state.active_brigades(faction);
    if brigades.is_empty() {
        return BTreeMap::new();
    }

    let mut claimed: FxHashMap<&str, &FormationId> = FxHashMap::default();
    let mut queue: VecDeque<&SettlementId> = VecDeque::new();

    for brigade in &brigades {
        let Some(hq) = brigade.hq.as_ref() else {
            continue;
        };
        if state.controller(hq) != Some(faction) || !graph.contains(hq) {
            continue;
        }
        // Stacked HQs: the earlier brigade in sorted order keeps the seed.
        if claimed.contains_key(hq.as_str()) {
            continue;
        }
        claimed.insert(hq, &brigade.id);
        queue.push_back(hq);
    }

    while let Some(current) = queue.pop_front() {
        let owner = claimed[current.as_str()];
        for neighbor in graph.neighbors(current) {
            if claimed.contains_key(neighbor.as_str()) {
                continue;
            }
            if state.controller(neighbor) != Some(faction) {
                continue;
            }
            claimed.insert(neighbor, owner);
            queue.push_back(neighbor);
        }
    }

    eligible
        .iter()
        .filter(|sid| state.controller(sid) == Some(faction))
        .filter_map(|sid| {
            claimed
                .get(sid.as_str())
                .map(|brigade| (sid.clone(), (*brigade).clone()))
        })
        .collect()
}

/// Allocate the brigade AoR mapping from scratch.
///
/// Every settlement in the control map ends up mapped: front-active (plus
/// rear margin) settlements to a brigade of their controlling faction where
/// one can reach them, everything else to `None`. Idempotent for identical
/// inputs.
pub fn initialize_brigade_aor(state: &mut WarState, graph: &SettlementGraph) -> AorReport {
    let eligible = front_active_with_rear(state, graph);

    let mut aor: BTreeMap<SettlementId, Option<FormationId>> = BTreeMap::new();
    let mut report = AorReport::default();

    for faction in FactionId::ALL {
        for (sid, brigade) in assign_by_bfs(state, graph, faction, &eligible) {
            *report.brigade_counts.entry(brigade.clone()).or_insert(0) += 1;
            report.front_active_assigned += 1;
            aor.insert(sid, Some(brigade));
        }
    }

    for sid in state.control.keys() {
        if !aor.contains_key(sid) {
            aor.insert(sid.clone(), None);
            report.rear_settlements += 1;
        }
    }

    state.aor = Some(aor);
    report
}

/// Per-turn AoR validation and repair.
///
/// Handles control flips, formation lifecycle changes, and front movement:
/// settlements assigned to dead/ineligible brigades or newly front-active
/// are reassigned to the nearest same-faction active brigade by BFS;
/// settlements that fell out of the front margin become rear (`None`).
///
/// Returns the number of settlements reassigned. No-op when the AoR map
/// has not been initialized yet.
pub fn validate_brigade_aor(state: &mut WarState, graph: &SettlementGraph) -> u32 {
    let Some(mut aor) = state.aor.take() else {
        return 0;
    };
    let eligible = front_active_with_rear(state, graph);

    let mut needs_reassignment: BTreeSet<SettlementId> = BTreeSet::new();

    let assigned: Vec<(SettlementId, Option<FormationId>)> = aor
        .iter()
        .map(|(sid, b)| (sid.clone(), b.clone()))
        .collect();
    for (sid, assignment) in assigned {
        match assignment {
            None => {
                // Was rear; may have become front-active.
                if eligible.contains(&sid) {
                    needs_reassignment.insert(sid);
                }
            }
            Some(brigade_id) => {
                let valid = state
                    .formation(&brigade_id)
                    .map(|f| f.is_active_brigade() && Some(f.faction) == state.controller(&sid))
                    .unwrap_or(false);
                if !valid {
                    needs_reassignment.insert(sid);
                } else if !eligible.contains(&sid) {
                    // Front moved away; settlement is rear again.
                    aor.insert(sid, None);
                }
            }
        }
    }

    // Settlements added to the control map since initialization.
    for sid in state.control.keys() {
        if !aor.contains_key(sid) && eligible.contains(sid) {
            needs_reassignment.insert(sid.clone());
        }
    }

    let mut reassigned = 0;
    for sid in &needs_reassignment {
        let target = nearest_assigned_brigade(state, graph, &aor, sid);
        if target.is_some() {
            reassigned += 1;
        }
        aor.insert(sid.clone(), target);
    }

    if reassigned > 0 {
        log::debug!(
            "brigade AoR revalidation reassigned {} settlement(s)",
            reassigned
        );
    }

    state.aor = Some(aor);
    reassigned
}

/// BFS through same-faction territory to the closest settlement held by an
/// active brigade of that faction.
fn nearest_assigned_brigade(
    state: &WarState,
    graph: &SettlementGraph,
    aor: &BTreeMap<SettlementId, Option<FormationId>>,
    sid: &SettlementId,
) -> Option<FormationId> {
    let faction = state.controller(sid)?;

    let mut visited: BTreeSet<&SettlementId> = BTreeSet::new();
    let mut queue: VecDeque<&SettlementId> = VecDeque::new();
    visited.insert(sid);
    queue.push_back(sid);

    while let Some(current) = queue.pop_front() {
        for neighbor in graph.neighbors(current) {
            if !visited.insert(neighbor) {
                continue;
            }
            if state.controller(neighbor) != Some(faction) {
                continue;
            }
            if let Some(Some(brigade_id)) = aor.get(neighbor) {
                let valid = state
                    .formation(brigade_id)
                    .map(|f| f.is_active_brigade() && f.faction == faction)
                    .unwrap_or(false);
                if valid {
                    return Some(brigade_id.clone());
                }
            }
            queue.push_back(neighbor);
        }
    }

    None
}

/// Settlements currently assigned to a brigade, sorted.
pub fn brigade_settlements(state: &WarState, brigade_id: &str) -> Vec<SettlementId> {
    let Some(aor) = state.aor.as_ref() else {
        return Vec::new();
    };
    aor.iter()
        .filter(|(_, b)| b.as_deref() == Some(brigade_id))
        .map(|(sid, _)| sid.clone())
        .collect()
}

/// Brigade density: personnel spread evenly across the AoR.
/// Equals the per-settlement garrison strength.
pub fn brigade_density(state: &WarState, brigade_id: &str) -> Fixed {
    let Some(formation) = state.formation(brigade_id) else {
        return Fixed::ZERO;
    };
    let count = brigade_settlements(state, brigade_id).len();
    Fixed::from_ratio(formation.personnel as i64, count.max(1) as i64)
}

/// Garrison strength at a settlement: the holding brigade's density, or
/// zero for unassigned settlements.
pub fn settlement_garrison(state: &WarState, sid: &str) -> Fixed {
    match state.assigned_brigade(sid) {
        Some(brigade_id) => brigade_density(state, &brigade_id.clone()),
        None => Fixed::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::FormationStatus;
    use crate::testing::{line_graph, three_faction_line};

    #[test]
    fn test_single_brigade_per_faction_allocation() {
        let graph = line_graph(12);
        let mut state = three_faction_line()
            .with_brigade("a1", FactionId::Alfa, "s01")
            .with_brigade("b1", FactionId::Bravo, "s05")
            .with_brigade("c1", FactionId::Charlie, "s10")
            .build();

        let report = initialize_brigade_aor(&mut state, &graph);

        let aor = state.aor.as_ref().unwrap();
        // Front-active plus one hop of rear margin, per controlling faction.
        assert_eq!(aor["s02"].as_deref(), Some("a1"));
        assert_eq!(aor["s03"].as_deref(), Some("a1"));
        for sid in ["s04", "s05", "s06", "s07"] {
            assert_eq!(aor[sid].as_deref(), Some("b1"), "{sid}");
        }
        assert_eq!(aor["s08"].as_deref(), Some("c1"));
        assert_eq!(aor["s09"].as_deref(), Some("c1"));
        // Deep rear stays unassigned.
        for sid in ["s00", "s01", "s10", "s11"] {
            assert_eq!(aor[sid], None, "{sid}");
        }

        assert_eq!(report.front_active_assigned, 8);
        assert_eq!(report.rear_settlements, 4);
        assert_eq!(report.brigade_counts["b1"], 4);
    }

    #[test]
    fn test_allocator_is_idempotent() {
        let graph = line_graph(12);
        let mut state = three_faction_line()
            .with_brigade("a1", FactionId::Alfa, "s01")
            .with_brigade("b1", FactionId::Bravo, "s05")
            .build();

        let first = initialize_brigade_aor(&mut state, &graph);
        let aor_first = state.aor.clone();
        let second = initialize_brigade_aor(&mut state, &graph);

        assert_eq!(first, second);
        assert_eq!(aor_first, state.aor);
    }

    #[test]
    fn test_faction_without_brigades_stays_unassigned() {
        let graph = line_graph(12);
        let mut state = three_faction_line()
            .with_brigade("b1", FactionId::Bravo, "s05")
            .build();

        initialize_brigade_aor(&mut state, &graph);

        let aor = state.aor.as_ref().unwrap();
        // Undefended fronts are not an error: Alfa and Charlie nodes are null.
        for sid in ["s02", "s03", "s08", "s09"] {
            assert_eq!(aor[sid], None, "{sid}");
        }
        assert_eq!(aor["s04"].as_deref(), Some("b1"));
    }

    #[test]
    fn test_two_brigades_split_segment_contiguously() {
        let graph = line_graph(12);
        let mut state = three_faction_line()
            .with_brigade("b1", FactionId::Bravo, "s06")
            .with_brigade("b2", FactionId::Bravo, "s04")
            .build();

        initialize_brigade_aor(&mut state, &graph);

        let b1: Vec<SettlementId> = brigade_settlements(&state, "b1");
        let b2: Vec<SettlementId> = brigade_settlements(&state, "b2");

        assert!(!b1.is_empty());
        assert!(!b2.is_empty());
        assert_eq!(b1.len() + b2.len(), 4);
        let overlap: Vec<_> = b1.iter().filter(|sid| b2.contains(sid)).collect();
        assert!(overlap.is_empty());
        // First wave claims: b2 holds its seed, b1 takes the rest.
        assert_eq!(b2, vec!["s04".to_string()]);
        assert_eq!(
            b1,
            vec!["s05".to_string(), "s06".to_string(), "s07".to_string()]
        );
    }

    #[test]
    fn test_dissolved_brigade_nodes_go_to_survivor() {
        let graph = line_graph(12);
        let mut state = three_faction_line()
            .with_brigade("b1", FactionId::Bravo, "s06")
            .with_brigade("b2", FactionId::Bravo, "s04")
            .build();

        initialize_brigade_aor(&mut state, &graph);
        state.formations.get_mut("b2").unwrap().status = FormationStatus::Dissolved;

        let reassigned = validate_brigade_aor(&mut state, &graph);

        assert_eq!(reassigned, 1);
        assert!(brigade_settlements(&state, "b2").is_empty());
        assert_eq!(brigade_settlements(&state, "b1").len(), 4);
    }

    #[test]
    fn test_validate_moves_front_with_control_flip() {
        let graph = line_graph(12);
        let mut state = three_faction_line()
            .with_brigade("a1", FactionId::Alfa, "s01")
            .with_brigade("b1", FactionId::Bravo, "s05")
            .build();
        initialize_brigade_aor(&mut state, &graph);

        // Bravo takes s03: the boundary shifts one hop toward Alfa.
        state
            .control
            .insert("s03".to_string(), Some(FactionId::Bravo));
        validate_brigade_aor(&mut state, &graph);

        let aor = state.aor.as_ref().unwrap();
        // s03 now belongs to Bravo's side of the front.
        assert_eq!(aor["s03"].as_deref(), Some("b1"));
        // s01 entered the rear margin of the new boundary.
        assert_eq!(aor["s01"].as_deref(), Some("a1"));
    }

    #[test]
    fn test_density_splits_personnel_over_aor() {
        let graph = line_graph(12);
        let mut state = three_faction_line()
            .with_brigade("b1", FactionId::Bravo, "s05")
            .build();
        state.formations.get_mut("b1").unwrap().personnel = 2000;

        initialize_brigade_aor(&mut state, &graph);

        // 2000 personnel over 4 settlements.
        assert_eq!(brigade_density(&state, "b1"), Fixed::from_int(500));
        assert_eq!(settlement_garrison(&state, "s04"), Fixed::from_int(500));
        assert_eq!(settlement_garrison(&state, "s00"), Fixed::ZERO);
    }
}
