//! AoR reshaping: settlement transfers between brigades.
//!
//! This is how a brigade "moves": its AoR boundary shifts one settlement at
//! a time. Each order is validated against the state as it mutates, applied
//! all-or-nothing, and the whole order queue is cleared at the end of the
//! stage whether an order succeeded or not.

use crate::graph::SettlementGraph;
use crate::report::{RejectedReshape, ReshapeReport};
use crate::state::{FormationKind, FormationStatus, ReshapeOrder, WarState};
use anyhow::{anyhow, Result};
use std::collections::BTreeMap;

const RESHAPE_COHESION_COST_TO: i32 = 3;
const RESHAPE_COHESION_COST_FROM: i32 = 2;

/// Validate one reshape order against the current AoR map. Returns a
/// rejection reason, or `None` when the order may be applied.
fn validate_order(
    state: &WarState,
    aor: &BTreeMap<String, Option<String>>,
    order: &ReshapeOrder,
    graph: &SettlementGraph,
) -> Option<String> {
    // Settlement must be known and currently held by from_brigade.
    let Some(current) = aor.get(&order.settlement) else {
        return Some(format!("settlement {} not found in AoR map", order.settlement));
    };
    if current.as_ref() != Some(&order.from_brigade) {
        return Some(format!(
            "settlement {} is not assigned to {} (currently: {})",
            order.settlement,
            order.from_brigade,
            current.as_deref().unwrap_or("unassigned"),
        ));
    }

    // Both formations must be active brigades of the same faction.
    let Some(from) = state.formation(&order.from_brigade) else {
        return Some(format!("from_brigade {} not found", order.from_brigade));
    };
    let Some(to) = state.formation(&order.to_brigade) else {
        return Some(format!("to_brigade {} not found", order.to_brigade));
    };
    if from.status != FormationStatus::Active {
        return Some(format!("from_brigade {} is not active", order.from_brigade));
    }
    if to.status != FormationStatus::Active {
        return Some(format!("to_brigade {} is not active", order.to_brigade));
    }
    if from.kind != FormationKind::Brigade {
        return Some(format!("from_brigade {} is not a brigade", order.from_brigade));
    }
    if to.kind != FormationKind::Brigade {
        return Some(format!("to_brigade {} is not a brigade", order.to_brigade));
    }
    if from.faction != to.faction {
        return Some("brigades are not same faction".to_string());
    }

    // Transfer must extend the receiving AoR, not teleport into it.
    let adjacent = graph
        .neighbors(&order.settlement)
        .iter()
        .any(|n| aor.get(n).map(|b| b.as_ref() == Some(&order.to_brigade)).unwrap_or(false));
    if !adjacent {
        return Some(format!(
            "settlement {} is not adjacent to {}'s AoR",
            order.settlement, order.to_brigade,
        ));
    }

    // The donor must not be emptied.
    let donor_count = aor
        .values()
        .filter(|b| b.as_ref() == Some(&order.from_brigade))
        .count();
    if donor_count <= 1 {
        return Some(format!(
            "from_brigade {} would have 0 settlements after transfer",
            order.from_brigade,
        ));
    }

    None
}

/// Executes the SubmitReshapeOrder command.
///
/// Pre-checks the order against the current state so callers get immediate
/// feedback, then queues it for the next turn's reshape stage. The order is
/// re-validated at application time against whatever the state looks like
/// then, so acceptance here is not a guarantee it will apply.
pub fn submit_reshape_order(
    state: &mut WarState,
    order: ReshapeOrder,
    graph: &SettlementGraph,
) -> Result<()> {
    let aor = state
        .aor
        .as_ref()
        .ok_or_else(|| anyhow!("brigade AoR not initialized"))?;
    if let Some(reason) = validate_order(state, aor, &order, graph) {
        return Err(anyhow!("{}", reason));
    }
    state.reshape_orders.push(order);
    Ok(())
}

/// Apply all pending reshape orders, sorted by settlement id, then clear the
/// queue. Each applied transfer costs cohesion (receiver 3, donor 2, floored
/// at zero) and flags both brigades disrupted for the pressure stage.
pub fn apply_reshape_orders(state: &mut WarState, graph: &SettlementGraph) -> ReshapeReport {
    let mut report = ReshapeReport::default();

    let mut orders = std::mem::take(&mut state.reshape_orders);
    if orders.is_empty() {
        return report;
    }
    orders.sort_by(|a, b| a.settlement.cmp(&b.settlement));

    let Some(mut aor) = state.aor.take() else {
        for order in orders {
            report.rejected.push(RejectedReshape {
                settlement: order.settlement,
                reason: "brigade AoR not initialized".to_string(),
            });
        }
        return report;
    };

    for order in orders {
        // Earlier transfers change assignment and counts, so each order is
        // validated against the mutated map.
        if let Some(reason) = validate_order(state, &aor, &order, graph) {
            log::debug!("reshape order for {} rejected: {}", order.settlement, reason);
            report.rejected.push(RejectedReshape {
                settlement: order.settlement,
                reason,
            });
            continue;
        }

        aor.insert(order.settlement.clone(), Some(order.to_brigade.clone()));

        if let Some(from) = state.formations.get_mut(&order.from_brigade) {
            from.cohesion.add(-RESHAPE_COHESION_COST_FROM);
            from.disrupted = true;
        }
        if let Some(to) = state.formations.get_mut(&order.to_brigade) {
            to.cohesion.add(-RESHAPE_COHESION_COST_TO);
            to.disrupted = true;
        }

        report.applied += 1;
    }

    state.aor = Some(aor);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{FactionId, FormationStatus};
    use crate::systems::aor::{brigade_settlements, initialize_brigade_aor};
    use crate::testing::{line_graph, three_faction_line};

    fn order(settlement: &str, from: &str, to: &str) -> ReshapeOrder {
        ReshapeOrder {
            settlement: settlement.to_string(),
            from_brigade: from.to_string(),
            to_brigade: to.to_string(),
        }
    }

    fn bravo_two_brigade_state() -> (SettlementGraph, WarState) {
        let graph = line_graph(12);
        let mut state = three_faction_line()
            .with_brigade("b1", FactionId::Bravo, "s06")
            .with_brigade("b2", FactionId::Bravo, "s04")
            .build();
        initialize_brigade_aor(&mut state, &graph);
        // b2 holds s04; b1 holds s05..s07.
        (graph, state)
    }

    #[test]
    fn test_valid_transfer_applies_costs() {
        let (graph, mut state) = bravo_two_brigade_state();
        state.reshape_orders.push(order("s05", "b1", "b2"));

        let report = apply_reshape_orders(&mut state, &graph);

        assert_eq!(report.applied, 1);
        assert!(report.rejected.is_empty());
        assert_eq!(state.assigned_brigade("s05"), Some(&"b2".to_string()));
        assert_eq!(state.formation("b1").unwrap().cohesion.get(), 58);
        assert_eq!(state.formation("b2").unwrap().cohesion.get(), 57);
        assert!(state.formation("b1").unwrap().disrupted);
        assert!(state.formation("b2").unwrap().disrupted);
        assert!(state.reshape_orders.is_empty());
    }

    #[test]
    fn test_non_adjacent_transfer_rejected() {
        let (graph, mut state) = bravo_two_brigade_state();
        // s06 does not touch b2's AoR (only s04).
        state.reshape_orders.push(order("s06", "b1", "b2"));
        let before = state.aor.clone();

        let report = apply_reshape_orders(&mut state, &graph);

        assert_eq!(report.applied, 0);
        assert_eq!(report.rejected.len(), 1);
        assert!(report.rejected[0].reason.contains("not adjacent"));
        assert_eq!(state.aor, before);
        // Rejection leaves cohesion untouched.
        assert_eq!(state.formation("b1").unwrap().cohesion.get(), 60);
        assert!(!state.formation("b1").unwrap().disrupted);
    }

    #[test]
    fn test_donor_keeps_last_settlement() {
        let (graph, mut state) = bravo_two_brigade_state();
        // b2 holds only s04.
        state.reshape_orders.push(order("s04", "b2", "b1"));

        let report = apply_reshape_orders(&mut state, &graph);

        assert_eq!(report.applied, 0);
        assert!(report.rejected[0].reason.contains("0 settlements"));
        assert_eq!(state.assigned_brigade("s04"), Some(&"b2".to_string()));
    }

    #[test]
    fn test_wrong_current_holder_rejected() {
        let (graph, mut state) = bravo_two_brigade_state();
        state.reshape_orders.push(order("s04", "b1", "b2"));

        let report = apply_reshape_orders(&mut state, &graph);

        assert_eq!(report.applied, 0);
        assert!(report.rejected[0].reason.contains("not assigned to b1"));
    }

    #[test]
    fn test_inactive_brigade_rejected() {
        let (graph, mut state) = bravo_two_brigade_state();
        state.formations.get_mut("b2").unwrap().status = FormationStatus::Forming;
        state.reshape_orders.push(order("s05", "b1", "b2"));

        let report = apply_reshape_orders(&mut state, &graph);

        assert_eq!(report.applied, 0);
        assert!(report.rejected[0].reason.contains("not active"));
    }

    #[test]
    fn test_cross_faction_transfer_rejected() {
        let graph = line_graph(12);
        let mut state = three_faction_line()
            .with_brigade("a1", FactionId::Alfa, "s01")
            .with_brigade("b1", FactionId::Bravo, "s05")
            .build();
        initialize_brigade_aor(&mut state, &graph);
        state.reshape_orders.push(order("s03", "a1", "b1"));

        let report = apply_reshape_orders(&mut state, &graph);

        assert_eq!(report.applied, 0);
        assert!(report.rejected[0].reason.contains("not same faction"));
    }

    #[test]
    fn test_orders_revalidated_as_state_mutates() {
        let (graph, mut state) = bravo_two_brigade_state();
        // Ordered by settlement id: s05 then s06 then s07. Each transfer
        // makes the next settlement adjacent to b2's grown AoR, but the last
        // would empty b1.
        state.reshape_orders.push(order("s07", "b1", "b2"));
        state.reshape_orders.push(order("s05", "b1", "b2"));
        state.reshape_orders.push(order("s06", "b1", "b2"));

        let report = apply_reshape_orders(&mut state, &graph);

        assert_eq!(report.applied, 2);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].settlement, "s07");
        assert_eq!(brigade_settlements(&state, "b1"), vec!["s07".to_string()]);
    }

    #[test]
    fn test_submit_rejects_bad_order_without_queueing() {
        let (graph, mut state) = bravo_two_brigade_state();

        let err = submit_reshape_order(&mut state, order("s06", "b1", "b2"), &graph)
            .unwrap_err();

        assert!(err.to_string().contains("not adjacent"));
        assert!(state.reshape_orders.is_empty());
    }

    #[test]
    fn test_submit_queues_valid_order() {
        let (graph, mut state) = bravo_two_brigade_state();

        submit_reshape_order(&mut state, order("s05", "b1", "b2"), &graph).unwrap();

        assert_eq!(state.reshape_orders.len(), 1);
        // Nothing applies until the reshape stage runs.
        assert_eq!(state.assigned_brigade("s05"), Some(&"b1".to_string()));
    }

    #[test]
    fn test_orders_cleared_even_when_aor_missing() {
        let graph = line_graph(12);
        let mut state = three_faction_line()
            .with_brigade("b1", FactionId::Bravo, "s05")
            .build();
        state.reshape_orders.push(order("s05", "b1", "b1"));

        let report = apply_reshape_orders(&mut state, &graph);

        assert_eq!(report.applied, 0);
        assert_eq!(report.rejected[0].reason, "brigade AoR not initialized");
        assert!(state.reshape_orders.is_empty());
    }
}
