//! Front segment lifecycle tracking.
//!
//! A segment is the persistent per-edge record of front activity. Active
//! streaks feed defensive hardening; the high-water streak survives the
//! front moving on so later consumers can tell a long-static front from a
//! briefly contested one.

use crate::graph::SettlementGraph;
use crate::state::{FrontSegment, WarState};
use crate::systems::front::front_edges;
use std::collections::BTreeSet;

/// Bring the segment map in line with the current front.
///
/// Edges on the front get a segment (created at streak 1) or an incremented
/// streak; segments whose edge left the front go inactive with the streak
/// reset. `max_active_streak` never decreases. Returns the number of active
/// segments.
pub fn sync_front_segments(state: &mut WarState, graph: &SettlementGraph) -> u32 {
    let active: BTreeSet<_> = front_edges(state, graph).into_iter().collect();
    let turn = state.turn;

    for (edge, segment) in state.front_segments.iter_mut() {
        if active.contains(edge) {
            continue;
        }
        if segment.active {
            log::trace!("front segment {} went quiet", edge);
        }
        segment.active = false;
        segment.active_streak = 0;
    }

    for edge in &active {
        let segment = state
            .front_segments
            .entry(edge.clone())
            .or_insert_with(|| FrontSegment {
                active: false,
                created_turn: turn,
                last_active_turn: turn,
                active_streak: 0,
                max_active_streak: 0,
            });
        segment.active = true;
        segment.active_streak += 1;
        segment.max_active_streak = segment.max_active_streak.max(segment.active_streak);
        segment.last_active_turn = turn;
    }

    active.len() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::EdgeId;
    use crate::state::FactionId;
    use crate::testing::{line_graph, three_faction_line};

    #[test]
    fn test_streak_grows_on_static_front() {
        let graph = line_graph(12);
        let mut state = three_faction_line().build();
        let west = EdgeId::new("s03", "s04").unwrap();

        for expected in 1..=4u32 {
            let active = sync_front_segments(&mut state, &graph);
            assert_eq!(active, 2);
            let segment = &state.front_segments[&west];
            assert!(segment.active);
            assert_eq!(segment.active_streak, expected);
            assert_eq!(segment.max_active_streak, expected);
            state.turn += 1;
        }
    }

    #[test]
    fn test_quiet_segment_resets_streak_keeps_peak() {
        let graph = line_graph(12);
        let mut state = three_faction_line().build();
        let west = EdgeId::new("s03", "s04").unwrap();

        for _ in 0..3 {
            sync_front_segments(&mut state, &graph);
            state.turn += 1;
        }

        // Bravo takes s03: the old boundary edge is now interior.
        state
            .control
            .insert("s03".to_string(), Some(FactionId::Bravo));
        sync_front_segments(&mut state, &graph);

        let segment = &state.front_segments[&west];
        assert!(!segment.active);
        assert_eq!(segment.active_streak, 0);
        assert_eq!(segment.max_active_streak, 3);
        // The new boundary edge starts its own segment.
        let new_edge = EdgeId::new("s02", "s03").unwrap();
        assert_eq!(state.front_segments[&new_edge].active_streak, 1);
    }

    #[test]
    fn test_created_turn_is_stamped_once() {
        let graph = line_graph(12);
        let mut state = three_faction_line().build();
        state.turn = 7;
        sync_front_segments(&mut state, &graph);
        state.turn = 8;
        sync_front_segments(&mut state, &graph);

        let west = EdgeId::new("s03", "s04").unwrap();
        let segment = &state.front_segments[&west];
        assert_eq!(segment.created_turn, 7);
        assert_eq!(segment.last_active_turn, 8);
    }
}
