use crate::bounded::{new_cohesion, new_unit, BoundedFixed, BoundedInt};
use crate::fixed::Fixed;
use crate::graph::{EdgeId, SettlementId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type FormationId = String;

/// The three belligerents of the scenario. A closed set: control lookups
/// and pressure attribution match exhaustively, never compare strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactionId {
    Alfa,
    Bravo,
    Charlie,
}

impl FactionId {
    pub const ALL: [FactionId; 3] = [FactionId::Alfa, FactionId::Bravo, FactionId::Charlie];
}

impl std::fmt::Display for FactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FactionId::Alfa => "alfa",
            FactionId::Bravo => "bravo",
            FactionId::Charlie => "charlie",
        };
        f.write_str(name)
    }
}

/// Brigade posture. Controls pressure output, defensive resilience,
/// equipment tempo, and exhaustion rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Posture {
    Defend,
    Probe,
    Attack,
    ElasticDefense,
    Consolidation,
}

/// Formation operational capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Readiness {
    Active,
    Overextended,
    Degraded,
    Forming,
}

/// Formation lifecycle. Only `Active` formations participate in AoR
/// allocation and pressure; the rest are external recruitment states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormationStatus {
    Forming,
    Active,
    Inactive,
    Dissolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormationKind {
    Brigade,
    CorpsAsset,
}

/// Condition distribution for one equipment category.
/// Invariant: the three fractions sum to 1 (maintained by the equipment
/// system's shift operations, checked by the state validator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentCondition {
    pub operational: Fixed,
    pub degraded: Fixed,
    pub non_operational: Fixed,
}

impl EquipmentCondition {
    /// Factory-fresh equipment.
    pub const fn full() -> Self {
        Self {
            operational: Fixed::ONE,
            degraded: Fixed::ZERO,
            non_operational: Fixed::ZERO,
        }
    }

    pub const fn new(operational: Fixed, degraded: Fixed, non_operational: Fixed) -> Self {
        Self {
            operational,
            degraded,
            non_operational,
        }
    }

    pub fn sum(&self) -> Fixed {
        self.operational + self.degraded + self.non_operational
    }
}

/// Typed brigade composition: what a brigade is made of beyond headcount.
///
/// Always fully populated: build through [`Composition::new`] or the
/// per-faction initializer in the equipment system, never field-by-field
/// from partial data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Composition {
    /// Personnel with small arms.
    pub infantry: u32,
    /// MBTs and APCs.
    pub armor: u32,
    /// Howitzers, mortars, MLRS.
    pub artillery: u32,
    pub armor_condition: EquipmentCondition,
    pub artillery_condition: EquipmentCondition,
}

impl Composition {
    pub const fn new(infantry: u32, armor: u32, artillery: u32) -> Self {
        Self {
            infantry,
            armor,
            artillery,
            armor_condition: EquipmentCondition::full(),
            artillery_condition: EquipmentCondition::full(),
        }
    }
}

/// A military formation. Created by external recruitment logic; this core
/// mutates its AoR membership, cohesion, disruption, and equipment state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Formation {
    pub id: FormationId,
    pub faction: FactionId,
    pub kind: FormationKind,
    pub status: FormationStatus,
    pub personnel: u32,
    pub cohesion: BoundedInt,
    /// HQ settlement; BFS seed for AoR allocation.
    pub hq: Option<SettlementId>,
    /// Parent corps (None = unattached).
    pub corps: Option<FormationId>,
    pub posture: Posture,
    pub readiness: Readiness,
    pub composition: Composition,
    /// One-turn disruption flag from AoR reshaping; halves pressure output.
    pub disrupted: bool,
    pub last_supplied_turn: Option<u32>,
}

impl Formation {
    /// A deployed brigade with default posture and cohesion.
    pub fn brigade(
        id: impl Into<FormationId>,
        faction: FactionId,
        hq: impl Into<SettlementId>,
        personnel: u32,
        composition: Composition,
    ) -> Self {
        Self {
            id: id.into(),
            faction,
            kind: FormationKind::Brigade,
            status: FormationStatus::Active,
            personnel,
            cohesion: new_cohesion(),
            hq: Some(hq.into()),
            corps: None,
            posture: Posture::Defend,
            readiness: Readiness::Active,
            composition,
            disrupted: false,
            last_supplied_turn: Some(0),
        }
    }

    /// Participates in AoR allocation and pressure.
    pub fn is_active_brigade(&self) -> bool {
        self.status == FormationStatus::Active && self.kind == FormationKind::Brigade
    }
}

/// Persistent per-edge pressure record. Created the first turn its edge is
/// on the front; never deleted, only updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontPressureRecord {
    /// Signed running value: positive means side-a advantage (side a = the
    /// lexicographically smaller endpoint's controller at write time).
    pub value: i64,
    /// Monotonic high-water mark of |value|.
    pub max_abs: i64,
    pub last_updated_turn: u32,
}

/// Per-edge front activity bookkeeping; feeds defensive hardening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontSegment {
    pub active: bool,
    pub created_turn: u32,
    pub last_active_turn: u32,
    /// Consecutive turns active (0 when inactive).
    pub active_streak: u32,
    /// High-water mark of active_streak.
    pub max_active_streak: u32,
}

/// Per-faction scalars supplied by external scenario setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactionProfile {
    /// Pressure multiplier from faction-level resilience (1.0 = neutral).
    pub resilience: Fixed,
    /// Maintenance capacity in [0, 1]; scales equipment repair and slows
    /// degradation.
    pub maintenance: BoundedFixed,
}

impl Default for FactionProfile {
    fn default() -> Self {
        Self {
            resilience: Fixed::ONE,
            maintenance: new_unit(Fixed::HALF),
        }
    }
}

/// Transfer one settlement from one brigade's AoR to another's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReshapeOrder {
    pub settlement: SettlementId,
    pub from_brigade: FormationId,
    pub to_brigade: FormationId,
}

/// Complete front-subsystem state for one conflict.
///
/// The single exclusively-owned mutable context threaded through every
/// pipeline stage; no module-level state exists anywhere in the crate.
/// All associative fields are `BTreeMap` so iteration and serialization
/// are key-sorted without further ceremony.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WarState {
    pub turn: u32,
    /// Current political control; `None` = uncontrolled/unknown.
    pub control: BTreeMap<SettlementId, Option<FactionId>>,
    pub formations: BTreeMap<FormationId, Formation>,
    /// Brigade AoR mapping, total over the control map once initialized.
    /// `None` until the allocator has run; stages that need it treat the
    /// absence as a caller bug.
    pub aor: Option<BTreeMap<SettlementId, Option<FormationId>>>,
    pub front_pressure: BTreeMap<EdgeId, FrontPressureRecord>,
    pub front_segments: BTreeMap<EdgeId, FrontSegment>,
    pub reshape_orders: Vec<ReshapeOrder>,
    pub profiles: BTreeMap<FactionId, FactionProfile>,
}

impl WarState {
    /// Controller of a settlement (`None` = uncontrolled or unknown id).
    pub fn controller(&self, sid: &str) -> Option<FactionId> {
        self.control.get(sid).copied().flatten()
    }

    pub fn formation(&self, id: &str) -> Option<&Formation> {
        self.formations.get(id)
    }

    /// Active brigades of a faction, sorted by formation id.
    pub fn active_brigades(&self, faction: FactionId) -> Vec<&Formation> {
        self.formations
            .values()
            .filter(|f| f.faction == faction && f.is_active_brigade())
            .collect()
    }

    pub fn profile(&self, faction: FactionId) -> FactionProfile {
        self.profiles.get(&faction).copied().unwrap_or_default()
    }

    /// Brigade assigned to a settlement, if the AoR map is initialized.
    pub fn assigned_brigade(&self, sid: &str) -> Option<&FormationId> {
        self.aor.as_ref().and_then(|aor| aor.get(sid)).and_then(|b| b.as_ref())
    }

    /// Compute a deterministic checksum of the front-subsystem state.
    ///
    /// Used for desync detection and replay validation: identical states
    /// produce identical checksums. All maps are BTreeMaps, so iteration
    /// is already key-sorted.
    pub fn checksum(&self) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        self.turn.hash(&mut hasher);

        for (sid, faction) in &self.control {
            sid.hash(&mut hasher);
            faction.hash(&mut hasher);
        }

        for (id, f) in &self.formations {
            id.hash(&mut hasher);
            f.faction.hash(&mut hasher);
            f.kind.hash(&mut hasher);
            f.status.hash(&mut hasher);
            f.personnel.hash(&mut hasher);
            f.cohesion.get().hash(&mut hasher);
            f.hq.hash(&mut hasher);
            f.corps.hash(&mut hasher);
            f.posture.hash(&mut hasher);
            f.readiness.hash(&mut hasher);
            f.composition.infantry.hash(&mut hasher);
            f.composition.armor.hash(&mut hasher);
            f.composition.artillery.hash(&mut hasher);
            f.composition.armor_condition.operational.0.hash(&mut hasher);
            f.composition.armor_condition.degraded.0.hash(&mut hasher);
            f.composition.armor_condition.non_operational.0.hash(&mut hasher);
            f.composition.artillery_condition.operational.0.hash(&mut hasher);
            f.composition.artillery_condition.degraded.0.hash(&mut hasher);
            f.composition.artillery_condition.non_operational.0.hash(&mut hasher);
            f.disrupted.hash(&mut hasher);
            f.last_supplied_turn.hash(&mut hasher);
        }

        if let Some(aor) = &self.aor {
            for (sid, brigade) in aor {
                sid.hash(&mut hasher);
                brigade.hash(&mut hasher);
            }
        }

        for (edge, rec) in &self.front_pressure {
            edge.a().hash(&mut hasher);
            edge.b().hash(&mut hasher);
            rec.value.hash(&mut hasher);
            rec.max_abs.hash(&mut hasher);
            rec.last_updated_turn.hash(&mut hasher);
        }

        for (edge, seg) in &self.front_segments {
            edge.a().hash(&mut hasher);
            edge.b().hash(&mut hasher);
            seg.active.hash(&mut hasher);
            seg.created_turn.hash(&mut hasher);
            seg.last_active_turn.hash(&mut hasher);
            seg.active_streak.hash(&mut hasher);
            seg.max_active_streak.hash(&mut hasher);
        }

        for order in &self.reshape_orders {
            order.settlement.hash(&mut hasher);
            order.from_brigade.hash(&mut hasher);
            order.to_brigade.hash(&mut hasher);
        }

        for (faction, profile) in &self.profiles {
            faction.hash(&mut hasher);
            profile.resilience.0.hash(&mut hasher);
            profile.maintenance.get().0.hash(&mut hasher);
        }

        hasher.finish()
    }
}
