//! Typed equipment effects on brigade pressure.
//!
//! Armor boosts offensive pressure, artillery boosts both directions.
//! Equipment wears with operational tempo, gets repaired by faction
//! maintenance capacity, and changes hands when territory flips.

use crate::fixed::Fixed;
use crate::state::{Composition, EquipmentCondition, FactionId, Posture};

const BASE_DEGRADATION: Fixed = Fixed::from_raw(200); // 0.02 per turn
const ARTILLERY_WEIGHT: Fixed = Fixed::from_raw(8000);
const ARMOR_WEIGHT_OFFENSIVE: Fixed = Fixed::from_raw(5000);
const ARMOR_WEIGHT_CONSOLIDATION: Fixed = Fixed::from_raw(3500);
const ARMOR_WEIGHT_DEFAULT: Fixed = Fixed::from_raw(2000);
const CAPTURE_RATE: Fixed = Fixed::from_raw(500); // 5% per settlement lost

/// Starting composition per faction. Alfa inherited the heavy park, Charlie
/// fields light infantry, Bravo sits between.
pub fn initial_composition(faction: FactionId) -> Composition {
    match faction {
        FactionId::Alfa => Composition::new(800, 40, 30),
        FactionId::Bravo => Composition::new(850, 15, 15),
        FactionId::Charlie => Composition::new(950, 3, 8),
    }
}

/// Pressure multiplier from equipment, relative to pure infantry (1.0).
///
/// Only operational equipment counts. Armor's weight depends on posture;
/// artillery contributes the same weight regardless.
pub fn equipment_multiplier(comp: &Composition, posture: Posture) -> Fixed {
    let armor_eff = Fixed::from_int(comp.armor as i64) * comp.armor_condition.operational;
    let artillery_eff =
        Fixed::from_int(comp.artillery as i64) * comp.artillery_condition.operational;

    let armor_weight = match posture {
        Posture::Attack | Posture::Probe => ARMOR_WEIGHT_OFFENSIVE,
        Posture::Consolidation => ARMOR_WEIGHT_CONSOLIDATION,
        _ => ARMOR_WEIGHT_DEFAULT,
    };
    let bonus = armor_eff * armor_weight + artillery_eff * ARTILLERY_WEIGHT;

    let infantry = Fixed::from_int(comp.infantry.max(1) as i64);
    Fixed::ONE + bonus / infantry
}

fn tempo_multiplier(posture: Posture) -> Fixed {
    match posture {
        Posture::Attack => Fixed::from_raw(15000),
        Posture::Probe => Fixed::from_raw(12000),
        Posture::Consolidation => Fixed::from_raw(10500),
        _ => Fixed::ONE,
    }
}

/// One turn of wear and repair for a brigade's equipment.
///
/// `maintenance` is the faction's maintenance capacity in [0, 1]: at full
/// capacity degradation runs at half rate, and repairs recover up to 5% of
/// the fleet per turn.
pub fn degrade_equipment(comp: &mut Composition, posture: Posture, maintenance: Fixed) {
    let tempo = tempo_multiplier(posture);
    let maintenance_factor = Fixed::from_raw(15000) - Fixed::HALF * maintenance;

    let armor_rate = BASE_DEGRADATION * tempo * maintenance_factor;
    degrade_condition(&mut comp.armor_condition, armor_rate);

    // Artillery sits further back and wears slower.
    let artillery_rate = armor_rate * Fixed::from_raw(7000);
    degrade_condition(&mut comp.artillery_condition, artillery_rate);

    let repair_capacity = maintenance * Fixed::from_raw(500);
    repair_condition(&mut comp.armor_condition, repair_capacity * Fixed::from_raw(8000));
    repair_condition(&mut comp.artillery_condition, repair_capacity);
}

/// Shift operational mass down the condition ladder. The shifted share
/// splits 70/30 between degraded and non-operational.
fn degrade_condition(cond: &mut EquipmentCondition, rate: Fixed) {
    let shift = cond.operational.min(rate);
    cond.operational -= shift;
    cond.degraded += shift * Fixed::from_raw(7000);
    cond.non_operational += shift * Fixed::from_raw(3000);
    clamp_condition(cond);
}

/// Repairs climb the ladder one rung per turn: non-operational equipment
/// becomes degraded, degraded becomes operational.
fn repair_condition(cond: &mut EquipmentCondition, rate: Fixed) {
    let repair_non_op = cond.non_operational.min(rate * Fixed::from_raw(3000));
    cond.non_operational -= repair_non_op;
    cond.degraded += repair_non_op;

    let repair_degraded = cond.degraded.min(rate * Fixed::from_raw(7000));
    cond.degraded -= repair_degraded;
    cond.operational += repair_degraded;

    clamp_condition(cond);
}

fn clamp_condition(cond: &mut EquipmentCondition) {
    cond.operational = cond.operational.clamp(Fixed::ZERO, Fixed::ONE);
    cond.degraded = cond.degraded.clamp(Fixed::ZERO, Fixed::ONE);
    cond.non_operational = cond.non_operational.clamp(Fixed::ZERO, Fixed::ONE);
}

/// Transfer captured equipment when a settlement flips.
///
/// The loser forfeits 5% of each park, scaled down by the size of the AoR
/// it lost the settlement from and floored to whole vehicles; small parks
/// lose nothing. Captured pieces enter the winner's park in degraded shape.
pub fn capture_equipment(loser: &mut Composition, winner: &mut Composition, loser_aor_size: u32) {
    let per_settlement = Fixed::from_ratio(1, loser_aor_size.max(1) as i64);

    let captured_armor =
        (Fixed::from_int(loser.armor as i64) * CAPTURE_RATE * per_settlement).to_int() as u32;
    if captured_armor > 0 {
        loser.armor -= captured_armor;
        winner.armor += captured_armor;
        absorb_captured(&mut winner.armor_condition, captured_armor, winner.armor);
    }

    let captured_artillery =
        (Fixed::from_int(loser.artillery as i64) * CAPTURE_RATE * per_settlement).to_int() as u32;
    if captured_artillery > 0 {
        loser.artillery -= captured_artillery;
        winner.artillery += captured_artillery;
        absorb_captured(
            &mut winner.artillery_condition,
            captured_artillery,
            winner.artillery,
        );
    }
}

fn absorb_captured(cond: &mut EquipmentCondition, captured: u32, new_total: u32) {
    let captured_frac = Fixed::from_ratio(captured as i64, new_total.max(1) as i64);
    cond.degraded += captured_frac * Fixed::HALF;
    cond.operational = (cond.operational - captured_frac * Fixed::from_raw(3000)).max(Fixed::ZERO);
    clamp_condition(cond);
}
