//! Test fixtures: a small settlement graph generator and a state builder.
//!
//! Production callers load real geodata and scenario state; everything here
//! exists so unit tests can spell out a front in a few lines.

use crate::graph::SettlementGraph;
use crate::state::{FactionId, Formation, WarState};
use crate::systems::equipment::initial_composition;

/// Path graph of `n` settlements `s00..` with consecutive edges.
/// Settlements pair up into municipalities `m00..` (two per municipality).
pub fn line_graph(n: usize) -> SettlementGraph {
    let nodes = (0..n).map(|i| (format!("s{i:02}"), format!("m{:02}", i / 2)));
    let edges = (1..n).map(|i| (format!("s{:02}", i - 1), format!("s{i:02}")));
    SettlementGraph::new(nodes, edges).expect("line graph is structurally valid")
}

pub struct WarStateBuilder {
    state: WarState,
}

impl WarStateBuilder {
    pub fn new() -> Self {
        Self {
            state: WarState::default(),
        }
    }

    pub fn turn(mut self, turn: u32) -> Self {
        self.state.turn = turn;
        self
    }

    pub fn with_settlement(mut self, sid: impl Into<String>, control: Option<FactionId>) -> Self {
        self.state.control.insert(sid.into(), control);
        self
    }

    /// Active brigade with test defaults: 1000 personnel, faction-standard
    /// composition, fresh cohesion and supply.
    pub fn with_brigade(
        mut self,
        id: impl Into<String>,
        faction: FactionId,
        hq: impl Into<String>,
    ) -> Self {
        let brigade = Formation::brigade(id, faction, hq, 1000, initial_composition(faction));
        self.state.formations.insert(brigade.id.clone(), brigade);
        self
    }

    pub fn with_formation(mut self, formation: Formation) -> Self {
        self.state.formations.insert(formation.id.clone(), formation);
        self
    }

    pub fn build(self) -> WarState {
        self.state
    }
}

impl Default for WarStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The standard three-faction fixture: twelve settlements in a line, four
/// per faction, giving two front boundaries (s03|s04 and s07|s08). Pair
/// with [`line_graph`]`(12)`.
pub fn three_faction_line() -> WarStateBuilder {
    let mut builder = WarStateBuilder::new();
    for n in 0..4 {
        builder = builder.with_settlement(format!("s{n:02}"), Some(FactionId::Alfa));
    }
    for n in 4..8 {
        builder = builder.with_settlement(format!("s{n:02}"), Some(FactionId::Bravo));
    }
    for n in 8..12 {
        builder = builder.with_settlement(format!("s{n:02}"), Some(FactionId::Charlie));
    }
    builder
}
