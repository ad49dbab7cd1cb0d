//! # Front Simulation Core
//!
//! Deterministic military front subsystem for a multi-faction territorial
//! conflict over a settlement graph.
//!
//! The crate owns the per-turn front loop: detect front edges from the
//! control map, allocate and repair brigade areas of responsibility (AoRs),
//! apply reshape orders, wear and repair equipment, track segment activity,
//! and accumulate per-edge pressure. Recruitment, combat resolution, and
//! territory flips live outside; they feed this core through [`WarState`]
//! and read back [`TurnReport`]s.
//!
//! ## Determinism
//!
//! Identical inputs produce byte-identical state on every platform:
//! all arithmetic is [`Fixed`]-point, persistent collections are ordered
//! (`BTreeMap`/`BTreeSet`), iteration is sorted, and there is no RNG,
//! wall clock, or thread dependence. [`WarState::checksum`] gives lockstep
//! peers a cheap divergence probe.
//!
//! ## Key Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`WarState`] | Complete front-subsystem state (control, formations, AoR, pressure) |
//! | [`SettlementGraph`] | Immutable settlement adjacency with canonical edge keys |
//! | [`run_front_turn`] | One turn of the pipeline: `(&mut state, &graph) -> TurnReport` |
//! | [`TurnReport`] | Structured per-stage outcome for the caller |
//! | [`ValidationIssue`] | Structural finding from [`validate_front_state`] |

pub mod bounded;
pub mod fixed;
pub mod graph;
pub mod report;
pub mod state;
pub mod step;
pub mod systems;
pub mod testing;
pub mod validate;

pub use bounded::{new_cohesion, new_unit, BoundedFixed, BoundedInt, Cohesion};
pub use fixed::Fixed;
pub use graph::{EdgeId, GraphError, MunicipalityId, SettlementGraph, SettlementId};
pub use report::{
    AorReport, ContiguityRepair, RejectedReshape, ReshapeReport, Severity, TurnReport,
    ValidationIssue,
};
pub use state::{
    Composition, EquipmentCondition, FactionId, FactionProfile, Formation, FormationId,
    FormationKind, FormationStatus, FrontPressureRecord, FrontSegment, Posture, Readiness,
    ReshapeOrder, WarState,
};
pub use step::{run_front_turn, FrontError};
pub use systems::reshape::submit_reshape_order;
pub use validate::validate_front_state;
