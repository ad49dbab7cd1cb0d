//! AoR contiguity checking and repair.
//!
//! A brigade's AoR must form one connected component on the settlement
//! graph; a corps' effective AoR (union of its brigades' settlements) must
//! too, except where the faction's own territory is legitimately split into
//! enclaves. Repairs keep the best component and hand orphan islands to an
//! adjacent brigade, falling back to unassigned.

use crate::graph::{SettlementGraph, SettlementId};
use crate::report::ContiguityRepair;
use crate::state::{FactionId, FormationId, WarState};
use crate::systems::front::front_active;
use rustc_hash::FxHashSet;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContiguityResult {
    pub contiguous: bool,
    /// Connected components, largest first, ties broken by minimum id.
    pub components: Vec<Vec<SettlementId>>,
}

/// Connected components of a settlement set on the graph, restricted to the
/// set itself. Seeds and neighbors iterate in sorted order.
pub fn check_contiguity(settlements: &[SettlementId], graph: &SettlementGraph) -> ContiguityResult {
    if settlements.len() <= 1 {
        return ContiguityResult {
            contiguous: true,
            components: if settlements.is_empty() {
                Vec::new()
            } else {
                vec![settlements.to_vec()]
            },
        };
    }

    let members: BTreeSet<&SettlementId> = settlements.iter().collect();
    let mut visited: FxHashSet<&SettlementId> = FxHashSet::default();
    let mut components: Vec<Vec<SettlementId>> = Vec::new();

    for &seed in &members {
        if visited.contains(seed) {
            continue;
        }
        let mut component: Vec<SettlementId> = Vec::new();
        let mut queue: VecDeque<&SettlementId> = VecDeque::new();
        visited.insert(seed);
        queue.push_back(seed);

        while let Some(current) = queue.pop_front() {
            component.push(current.clone());
            for neighbor in graph.neighbors(current) {
                let Some(&member) = members.get(neighbor) else {
                    continue;
                };
                if visited.insert(member) {
                    queue.push_back(member);
                }
            }
        }

        component.sort();
        components.push(component);
    }

    components.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a[0].cmp(&b[0])));

    ContiguityResult {
        contiguous: components.len() <= 1,
        components,
    }
}

/// Whether removing one settlement leaves the rest connected. Sets of size
/// two or less remain trivially contiguous.
pub fn would_remain_contiguous(
    settlements: &[SettlementId],
    removed: &str,
    graph: &SettlementGraph,
) -> bool {
    if settlements.len() <= 2 {
        return true;
    }
    let remaining: BTreeSet<&SettlementId> =
        settlements.iter().filter(|s| s.as_str() != removed).collect();
    if remaining.len() <= 1 {
        return true;
    }

    let Some(&seed) = remaining.iter().next() else {
        return true;
    };
    let mut visited: FxHashSet<&SettlementId> = FxHashSet::default();
    let mut queue: VecDeque<&SettlementId> = VecDeque::new();
    visited.insert(seed);
    queue.push_back(seed);

    while let Some(current) = queue.pop_front() {
        for neighbor in graph.neighbors(current) {
            let Some(&member) = remaining.get(neighbor) else {
                continue;
            };
            if visited.insert(member) {
                queue.push_back(member);
            }
        }
    }

    visited.len() == remaining.len()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairResult {
    pub kept: Vec<SettlementId>,
    /// Orphan islands, sorted, awaiting reassignment.
    pub orphans: Vec<SettlementId>,
}

/// Pick the component to keep from a discontiguous set.
///
/// Score: HQ presence dominates, then front-active settlement count, then
/// size. First component wins ties (components come in largest-first order).
pub fn repair_contiguity(
    settlements: &[SettlementId],
    hq: Option<&SettlementId>,
    front_active: &BTreeSet<SettlementId>,
    graph: &SettlementGraph,
) -> RepairResult {
    let result = check_contiguity(settlements, graph);
    if result.contiguous {
        return RepairResult {
            kept: settlements.to_vec(),
            orphans: Vec::new(),
        };
    }

    let mut best_idx = 0usize;
    let mut best_score = -1i64;
    for (i, component) in result.components.iter().enumerate() {
        let has_hq = hq.map(|h| component.contains(h)).unwrap_or(false);
        let front_count = component.iter().filter(|s| front_active.contains(*s)).count();
        let score =
            if has_hq { 1_000_000 } else { 0 } + front_count as i64 * 1_000 + component.len() as i64;
        if score > best_score {
            best_score = score;
            best_idx = i;
        }
    }

    let mut orphans: Vec<SettlementId> = Vec::new();
    for (i, component) in result.components.iter().enumerate() {
        if i != best_idx {
            orphans.extend(component.iter().cloned());
        }
    }
    orphans.sort();

    RepairResult {
        kept: result.components[best_idx].clone(),
        orphans,
    }
}

/// Settlements grouped by holding brigade, brigades in sorted id order.
fn settlements_by_brigade(state: &WarState) -> BTreeMap<FormationId, Vec<SettlementId>> {
    let mut grouped: BTreeMap<FormationId, Vec<SettlementId>> = BTreeMap::new();
    if let Some(aor) = state.aor.as_ref() {
        for (sid, brigade) in aor {
            if let Some(brigade_id) = brigade {
                grouped.entry(brigade_id.clone()).or_default().push(sid.clone());
            }
        }
    }
    grouped
}

/// Repair every discontiguous brigade AoR.
///
/// Orphans transfer to an adjacent brigade of the same faction, preferring
/// one under the same corps, else go unassigned. Returns one repair record
/// per brigade touched.
pub fn enforce_brigade_contiguity(
    state: &mut WarState,
    graph: &SettlementGraph,
) -> Vec<ContiguityRepair> {
    let front = front_active(state, graph);
    let grouped = settlements_by_brigade(state);
    let mut repairs: Vec<ContiguityRepair> = Vec::new();

    let Some(mut aor) = state.aor.take() else {
        return repairs;
    };

    for (brigade_id, settlements) in &grouped {
        let Some(formation) = state.formation(brigade_id) else {
            continue;
        };
        let result = repair_contiguity(settlements, formation.hq.as_ref(), &front, graph);
        if result.orphans.is_empty() {
            continue;
        }

        let mut reassigned: BTreeMap<SettlementId, Option<FormationId>> = BTreeMap::new();
        for sid in &result.orphans {
            let mut same_corps: Option<FormationId> = None;
            let mut same_faction: Option<FormationId> = None;
            for neighbor in graph.neighbors(sid) {
                let Some(Some(neighbor_brigade)) = aor.get(neighbor) else {
                    continue;
                };
                if neighbor_brigade == brigade_id {
                    continue;
                }
                let Some(nf) = state.formation(neighbor_brigade) else {
                    continue;
                };
                if nf.faction != formation.faction {
                    continue;
                }
                if same_faction.is_none() {
                    same_faction = Some(neighbor_brigade.clone());
                }
                if same_corps.is_none()
                    && formation.corps.is_some()
                    && nf.corps == formation.corps
                {
                    same_corps = Some(neighbor_brigade.clone());
                }
            }
            let target = same_corps.or(same_faction);
            aor.insert(sid.clone(), target.clone());
            reassigned.insert(sid.clone(), target);
        }

        log::debug!(
            "brigade {} AoR discontiguous: kept {}, reassigned {}",
            brigade_id,
            result.kept.len(),
            reassigned.len()
        );
        repairs.push(ContiguityRepair {
            formation: brigade_id.clone(),
            kept: result.kept.len() as u32,
            reassigned,
        });
    }

    state.aor = Some(aor);
    repairs
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisconnectedTerritories {
    pub main_territory: BTreeSet<SettlementId>,
    /// Detached pockets, largest first, ties broken by minimum id.
    pub enclaves: Vec<BTreeSet<SettlementId>>,
}

/// Connected components of a faction's controlled territory. The largest
/// component is the main territory; the rest are enclaves.
pub fn detect_disconnected_territories(
    state: &WarState,
    graph: &SettlementGraph,
    faction: FactionId,
) -> DisconnectedTerritories {
    let held: Vec<SettlementId> = state
        .control
        .iter()
        .filter(|(_, c)| **c == Some(faction))
        .map(|(sid, _)| sid.clone())
        .collect();

    let mut components: Vec<BTreeSet<SettlementId>> = Vec::new();
    let mut visited: FxHashSet<&SettlementId> = FxHashSet::default();

    for seed in &held {
        if visited.contains(seed) {
            continue;
        }
        let mut component: BTreeSet<SettlementId> = BTreeSet::new();
        let mut queue: VecDeque<&SettlementId> = VecDeque::new();
        visited.insert(seed);
        queue.push_back(seed);

        while let Some(current) = queue.pop_front() {
            component.insert(current.clone());
            for neighbor in graph.neighbors(current) {
                if state.controller(neighbor) != Some(faction) {
                    continue;
                }
                let Some((member, _)) = state.control.get_key_value(neighbor) else {
                    continue;
                };
                if visited.insert(member) {
                    queue.push_back(member);
                }
            }
        }
        components.push(component);
    }

    components.sort_by(|a, b| {
        b.len()
            .cmp(&a.len())
            .then_with(|| a.iter().next().cmp(&b.iter().next()))
    });

    let mut iter = components.into_iter();
    DisconnectedTerritories {
        main_territory: iter.next().unwrap_or_default(),
        enclaves: iter.collect(),
    }
}

/// Repair corps-level discontiguity.
///
/// Enclave settlements are excluded first: a corps split across an enclave
/// boundary is a fact of the map, not a planning error. Orphans within the
/// main territory go to an adjacent brigade of a different corps of the same
/// faction, else unassigned.
pub fn enforce_corps_contiguity(
    state: &mut WarState,
    graph: &SettlementGraph,
) -> Vec<ContiguityRepair> {
    let mut repairs: Vec<ContiguityRepair> = Vec::new();
    if state.aor.is_none() {
        return repairs;
    }

    for faction in FactionId::ALL {
        let territories = detect_disconnected_territories(state, graph, faction);
        let enclave_settlements: BTreeSet<SettlementId> = territories
            .enclaves
            .iter()
            .flat_map(|e| e.iter().cloned())
            .collect();

        // Per-corps settlement sets from the AoR map, enclaves excluded.
        let mut corps_settlements: BTreeMap<FormationId, Vec<SettlementId>> = BTreeMap::new();
        if let Some(aor) = state.aor.as_ref() {
            for (sid, brigade) in aor {
                let Some(brigade_id) = brigade else { continue };
                if enclave_settlements.contains(sid) {
                    continue;
                }
                let Some(formation) = state.formation(brigade_id) else {
                    continue;
                };
                if formation.faction != faction {
                    continue;
                }
                let Some(corps_id) = formation.corps.clone() else {
                    continue;
                };
                corps_settlements.entry(corps_id).or_default().push(sid.clone());
            }
        }

        for (corps_id, settlements) in &corps_settlements {
            let result = check_contiguity(settlements, graph);
            if result.contiguous {
                continue;
            }
            let mut orphans: Vec<SettlementId> = result
                .components
                .iter()
                .skip(1)
                .flat_map(|c| c.iter().cloned())
                .collect();
            orphans.sort();
            let kept = result.components[0].len() as u32;

            let Some(mut aor) = state.aor.take() else {
                return repairs;
            };
            let mut reassigned: BTreeMap<SettlementId, Option<FormationId>> = BTreeMap::new();
            for sid in &orphans {
                let mut target: Option<FormationId> = None;
                for neighbor in graph.neighbors(sid) {
                    let Some(Some(neighbor_brigade)) = aor.get(neighbor) else {
                        continue;
                    };
                    let Some(nf) = state.formation(neighbor_brigade) else {
                        continue;
                    };
                    if nf.faction != faction {
                        continue;
                    }
                    if nf.corps.as_ref() == Some(corps_id) {
                        continue;
                    }
                    target = Some(neighbor_brigade.clone());
                    break;
                }
                aor.insert(sid.clone(), target.clone());
                reassigned.insert(sid.clone(), target);
            }
            state.aor = Some(aor);

            log::debug!(
                "corps {} AoR discontiguous: kept {}, reassigned {}",
                corps_id,
                kept,
                reassigned.len()
            );
            repairs.push(ContiguityRepair {
                formation: corps_id.clone(),
                kept,
                reassigned,
            });
        }
    }

    repairs
}
