//! The front turn pipeline.
//!
//! Stage order matters: AoR upkeep before contiguity enforcement, reshaping
//! before equipment wear and pressure, segment sync before pressure so the
//! hardening streak reflects this turn's front.

use crate::fixed::Fixed;
use crate::graph::{GraphError, SettlementGraph};
use crate::report::{Severity, TurnReport};
use crate::state::{FactionId, WarState};
use crate::systems::{aor, contiguity, equipment, pressure, reshape, segments};
use crate::validate::validate_front_state;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::instrument;

#[derive(Error, Debug)]
pub enum FrontError {
    #[error("front state failed validation with {errors} error(s), first: {first}")]
    InvalidState { errors: usize, first: String },
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Advance the front subsystem by one turn.
///
/// Validates structurally first and refuses to run on broken state. The
/// AoR map is allocated on first use, revalidated on every later turn.
#[instrument(skip_all, name = "front_turn", fields(turn = state.turn))]
pub fn run_front_turn(
    state: &mut WarState,
    graph: &SettlementGraph,
) -> Result<TurnReport, FrontError> {
    let issues = validate_front_state(state, graph);
    let errors: Vec<_> = issues
        .iter()
        .filter(|i| i.severity == Severity::Error)
        .collect();
    for issue in &issues {
        match issue.severity {
            Severity::Error => log::error!("{}: {}", issue.code, issue.message),
            Severity::Warning => log::warn!("{}: {}", issue.code, issue.message),
        }
    }
    if let Some(first) = errors.first() {
        return Err(FrontError::InvalidState {
            errors: errors.len(),
            first: format!("{}: {}", first.code, first.message),
        });
    }

    let mut report = TurnReport::default();

    {
        let _span = tracing::info_span!("aor_upkeep").entered();
        if state.aor.is_none() {
            let allocated = aor::initialize_brigade_aor(state, graph);
            log::info!(
                "brigade AoR allocated: {} front-active, {} rear",
                allocated.front_active_assigned,
                allocated.rear_settlements
            );
            report.aor_initialized = Some(allocated);
        } else {
            aor::validate_brigade_aor(state, graph);
        }
    }

    {
        let _span = tracing::info_span!("contiguity").entered();
        report.brigade_repairs = contiguity::enforce_brigade_contiguity(state, graph);
        report.corps_repairs = contiguity::enforce_corps_contiguity(state, graph);
        if !report.brigade_repairs.is_empty() || !report.corps_repairs.is_empty() {
            log::info!(
                "contiguity repairs: {} brigade, {} corps",
                report.brigade_repairs.len(),
                report.corps_repairs.len()
            );
        }
    }

    {
        let _span = tracing::info_span!("reshape").entered();
        report.reshape = reshape::apply_reshape_orders(state, graph);
        if report.reshape.applied > 0 || !report.reshape.rejected.is_empty() {
            log::info!(
                "reshape orders: {} applied, {} rejected",
                report.reshape.applied,
                report.reshape.rejected.len()
            );
        }
    }

    {
        let _span = tracing::info_span!("equipment").entered();
        let maintenance: BTreeMap<FactionId, Fixed> = FactionId::ALL
            .iter()
            .map(|&f| (f, state.profile(f).maintenance.get()))
            .collect();
        for formation in state.formations.values_mut() {
            if !formation.is_active_brigade() {
                continue;
            }
            let capacity = maintenance
                .get(&formation.faction)
                .copied()
                .unwrap_or(Fixed::HALF);
            equipment::degrade_equipment(&mut formation.composition, formation.posture, capacity);
        }
    }

    {
        let _span = tracing::info_span!("segments").entered();
        report.segments_active = segments::sync_front_segments(state, graph);
    }

    {
        let _span = tracing::info_span!("pressure").entered();
        report.pressure_edges_updated = pressure::accumulate_front_pressure(state, graph);
    }

    // Disruption from this turn's reshaping has been priced into pressure;
    // the flag does not carry over.
    for formation in state.formations.values_mut() {
        formation.disrupted = false;
    }

    state.turn += 1;
    Ok(report)
}
