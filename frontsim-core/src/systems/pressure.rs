//! Brigade-derived front pressure.
//!
//! Brigades are the sole source of front pressure: each front edge gets a
//! signed per-turn delta from the two facing brigades' raw output, clamped
//! and accumulated into the persistent per-edge record. Defense strength is
//! computed by the same engine for consumers that resolve breakthroughs.

use crate::fixed::Fixed;
use crate::graph::{EdgeId, SettlementGraph};
use crate::state::{Formation, FormationId, FrontPressureRecord, Posture, Readiness, WarState};
use crate::systems::aor::brigade_density;
use crate::systems::front::front_edges;
use rustc_hash::FxHashMap;

/// Per-turn per-edge delta bound, in integer pressure points.
pub const PRESSURE_DELTA_CLAMP: i64 = 10;

/// Supply is considered current for this many turns after the last delivery.
pub const SUPPLY_RECENT_TURNS: u32 = 2;

const UNSUPPLIED_FACTOR: Fixed = Fixed::from_raw(4000);
const DISRUPTION_FACTOR: Fixed = Fixed::from_raw(5000);
const HARDENING_PER_TURN: Fixed = Fixed::from_raw(500);
const HARDENING_CAP: Fixed = Fixed::from_raw(5000);

pub fn posture_offense_multiplier(posture: Posture) -> Fixed {
    match posture {
        Posture::Defend => Fixed::from_raw(3000),
        Posture::Probe => Fixed::from_raw(7000),
        Posture::Attack => Fixed::from_raw(15000),
        Posture::ElasticDefense => Fixed::from_raw(2000),
        Posture::Consolidation => Fixed::from_raw(6000),
    }
}

pub fn posture_defense_multiplier(posture: Posture) -> Fixed {
    match posture {
        Posture::Defend => Fixed::from_raw(15000),
        Posture::Probe => Fixed::ONE,
        Posture::Attack => Fixed::from_raw(5000),
        Posture::ElasticDefense => Fixed::from_raw(12000),
        Posture::Consolidation => Fixed::from_raw(11000),
    }
}

pub fn readiness_multiplier(readiness: Readiness) -> Fixed {
    match readiness {
        Readiness::Active => Fixed::ONE,
        Readiness::Overextended => Fixed::HALF,
        Readiness::Degraded => Fixed::from_raw(2000),
        Readiness::Forming => Fixed::ZERO,
    }
}

fn supply_factor(state: &WarState, formation: &Formation) -> Fixed {
    match formation.last_supplied_turn {
        Some(supplied) if state.turn as i64 - supplied as i64 <= SUPPLY_RECENT_TURNS as i64 => {
            Fixed::ONE
        }
        _ => UNSUPPLIED_FACTOR,
    }
}

/// Raw offensive pressure output of one brigade.
///
/// Density spread over the AoR, shaped by posture, readiness, cohesion,
/// supply recency, equipment, faction resilience, and reshaping disruption.
pub fn raw_pressure(state: &WarState, formation: &Formation) -> Fixed {
    let density = brigade_density(state, &formation.id);
    let disruption = if formation.disrupted {
        DISRUPTION_FACTOR
    } else {
        Fixed::ONE
    };

    density
        * posture_offense_multiplier(formation.posture)
        * readiness_multiplier(formation.readiness)
        * formation.cohesion.ratio()
        * supply_factor(state, formation)
        * crate::systems::equipment::equipment_multiplier(&formation.composition, formation.posture)
        * state.profile(formation.faction).resilience
        * disruption
}

/// Defensive strength of one brigade on a segment with the given active
/// streak. Static fronts harden: +5% per streak turn, capped at +50%.
pub fn defense_strength(state: &WarState, formation: &Formation, active_streak: u32) -> Fixed {
    let density = brigade_density(state, &formation.id);
    let hardening = (HARDENING_PER_TURN * Fixed::from_int(active_streak as i64)).min(HARDENING_CAP);

    density
        * posture_defense_multiplier(formation.posture)
        * readiness_multiplier(formation.readiness)
        * formation.cohesion.ratio()
        * supply_factor(state, formation)
        * crate::systems::equipment::equipment_multiplier(&formation.composition, formation.posture)
        * state.profile(formation.faction).resilience
        * (Fixed::ONE + hardening)
}

/// Accumulate one turn of brigade pressure into the per-edge records.
///
/// For each front edge, delta = side-a raw output minus side-b raw output,
/// clamped to the per-turn bound and rounded half away from zero. Records
/// are created on first touch; `max_abs` only ever grows. Returns the
/// number of edges updated.
pub fn accumulate_front_pressure(state: &mut WarState, graph: &SettlementGraph) -> u32 {
    let edges = front_edges(state, graph);
    let clamp = Fixed::from_int(PRESSURE_DELTA_CLAMP);

    // Raw pressure is per-brigade, not per-edge: compute once per brigade.
    let mut cache: FxHashMap<FormationId, Fixed> = FxHashMap::default();
    let mut cached_pressure = |state: &WarState, brigade_id: &FormationId| -> Fixed {
        if let Some(p) = cache.get(brigade_id) {
            return *p;
        }
        let p = state
            .formation(brigade_id)
            .map(|f| raw_pressure(state, f))
            .unwrap_or(Fixed::ZERO);
        cache.insert(brigade_id.clone(), p);
        p
    };

    let mut deltas: Vec<(EdgeId, i64)> = Vec::with_capacity(edges.len());
    for edge in edges {
        let side_a = match state.assigned_brigade(edge.a()) {
            Some(brigade_id) => cached_pressure(state, &brigade_id.clone()),
            None => Fixed::ZERO,
        };
        let side_b = match state.assigned_brigade(edge.b()) {
            Some(brigade_id) => cached_pressure(state, &brigade_id.clone()),
            None => Fixed::ZERO,
        };
        let delta = (side_a - side_b).clamp(-clamp, clamp).round_to_int();
        deltas.push((edge, delta));
    }

    let turn = state.turn;
    let updated = deltas.len() as u32;
    for (edge, delta) in deltas {
        let record = state
            .front_pressure
            .entry(edge)
            .or_insert_with(|| FrontPressureRecord {
                value: 0,
                max_abs: 0,
                last_updated_turn: turn,
            });
        record.value += delta;
        record.max_abs = record.max_abs.max(record.value.abs());
        record.last_updated_turn = turn;
    }

    log::trace!("front pressure updated on {} edge(s)", updated);
    updated
}
