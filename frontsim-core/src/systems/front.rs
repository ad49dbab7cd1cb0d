//! Front detection.
//!
//! Pure functions of graph + control: no side effects, recomputed every
//! turn rather than stored (front membership is derived state).

use crate::graph::{EdgeId, MunicipalityId, SettlementGraph, SettlementId};
use crate::state::WarState;
use std::collections::BTreeSet;

/// Hops of friendly territory behind the front line included in the
/// front-active set. Fixed by behavioral contract, not configuration.
pub const REAR_DEPTH: u32 = 1;

/// Edges whose endpoints have known, differing controllers.
pub fn front_edges(state: &WarState, graph: &SettlementGraph) -> Vec<EdgeId> {
    graph
        .edges()
        .iter()
        .filter(|edge| {
            match (state.controller(edge.a()), state.controller(edge.b())) {
                (Some(a), Some(b)) => a != b,
                _ => false,
            }
        })
        .cloned()
        .collect()
}

/// Settlements that are an endpoint of a front edge.
pub fn front_active(state: &WarState, graph: &SettlementGraph) -> BTreeSet<SettlementId> {
    let mut active = BTreeSet::new();
    for edge in graph.edges() {
        if let (Some(a), Some(b)) = (state.controller(edge.a()), state.controller(edge.b())) {
            if a != b {
                active.insert(edge.a().clone());
                active.insert(edge.b().clone());
            }
        }
    }
    active
}

/// Expand a front-active set by `depth` hops of rear margin.
///
/// Expansion stays inside territory controlled by the same faction as the
/// front settlement it grew from; it never crosses into enemy-controlled
/// or unknown territory.
pub fn expand_with_rear_depth(
    state: &WarState,
    graph: &SettlementGraph,
    front: &BTreeSet<SettlementId>,
    depth: u32,
) -> BTreeSet<SettlementId> {
    let mut expanded = front.clone();
    let mut current = front.clone();

    for _ in 0..depth {
        let mut next = BTreeSet::new();
        for sid in &current {
            let Some(faction) = state.controller(sid) else {
                continue;
            };
            for neighbor in graph.neighbors(sid) {
                if expanded.contains(neighbor) {
                    continue;
                }
                if state.controller(neighbor) == Some(faction) {
                    next.insert(neighbor.clone());
                    expanded.insert(neighbor.clone());
                }
            }
        }
        current = next;
    }

    expanded
}

/// Front-active set with the standard rear margin applied.
pub fn front_active_with_rear(state: &WarState, graph: &SettlementGraph) -> BTreeSet<SettlementId> {
    let front = front_active(state, graph);
    expand_with_rear_depth(state, graph, &front, REAR_DEPTH)
}

/// Municipalities touched by the current front line, sorted and deduplicated.
/// Consumed by corps-level sector planning outside this core.
pub fn front_municipalities(state: &WarState, graph: &SettlementGraph) -> Vec<MunicipalityId> {
    front_active(state, graph)
        .iter()
        .filter_map(|sid| graph.municipality(sid).cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
