//! Settlement graph consumed from the external data pipeline.
//!
//! Node identity is an opaque string id; the sorted lexicographic order of
//! ids is the canonical iteration order everywhere in the crate. Edges are
//! undirected and carry a canonical textual key `a__b` with `a < b`;
//! anything else is a structural error, aborted rather than repaired,
//! because downstream pressure state cannot reason about malformed keys.

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

pub type SettlementId = String;
pub type MunicipalityId = String;

/// Delimiter of the canonical edge key.
const EDGE_DELIMITER: &str = "__";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("edge key {key:?} is malformed: expected exactly one \"__\" delimiter")]
    MalformedEdgeKey { key: String },
    #[error("edge key {key:?} is non-canonical: endpoints must satisfy a < b")]
    NonCanonicalEdgeKey { key: String },
    #[error("self-loop edge at settlement {sid:?}")]
    SelfLoop { sid: SettlementId },
    #[error("edge references unknown settlement {sid:?}")]
    UnknownSettlement { sid: SettlementId },
}

/// Canonical unordered settlement pair. Invariant: `a < b`, no self-loops.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeId {
    a: SettlementId,
    b: SettlementId,
}

impl EdgeId {
    /// Build from an unordered pair, sorting the endpoints.
    pub fn new(x: impl Into<SettlementId>, y: impl Into<SettlementId>) -> Result<Self, GraphError> {
        let x = x.into();
        let y = y.into();
        if x == y {
            return Err(GraphError::SelfLoop { sid: x });
        }
        if x < y {
            Ok(EdgeId { a: x, b: y })
        } else {
            Ok(EdgeId { a: y, b: x })
        }
    }

    /// Parse a canonical `a__b` key. Non-canonical ordering is rejected,
    /// not silently re-sorted: a non-canonical key in persisted state means
    /// the writer was broken.
    pub fn parse(key: &str) -> Result<Self, GraphError> {
        let mut parts = key.split(EDGE_DELIMITER);
        let (a, b) = match (parts.next(), parts.next(), parts.next()) {
            (Some(a), Some(b), None) if !a.is_empty() && !b.is_empty() => (a, b),
            _ => {
                return Err(GraphError::MalformedEdgeKey {
                    key: key.to_string(),
                })
            }
        };
        if a == b {
            return Err(GraphError::SelfLoop { sid: a.to_string() });
        }
        if a > b {
            return Err(GraphError::NonCanonicalEdgeKey {
                key: key.to_string(),
            });
        }
        Ok(EdgeId {
            a: a.to_string(),
            b: b.to_string(),
        })
    }

    pub fn a(&self) -> &SettlementId {
        &self.a
    }

    pub fn b(&self) -> &SettlementId {
        &self.b
    }

    /// The endpoint opposite to `sid`, if `sid` is an endpoint.
    pub fn other(&self, sid: &str) -> Option<&SettlementId> {
        if self.a == sid {
            Some(&self.b)
        } else if self.b == sid {
            Some(&self.a)
        } else {
            None
        }
    }
}

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.a, EDGE_DELIMITER, self.b)
    }
}

// Serialized as the canonical string key so edge-keyed maps persist with
// sorted, diffable keys.
impl Serialize for EdgeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for EdgeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EdgeIdVisitor;
        impl Visitor<'_> for EdgeIdVisitor {
            type Value = EdgeId;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a canonical edge key of the form a__b with a < b")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<EdgeId, E> {
                EdgeId::parse(v).map_err(de::Error::custom)
            }
        }
        deserializer.deserialize_str(EdgeIdVisitor)
    }
}

/// Read-only settlement adjacency graph with municipality grouping.
///
/// Neighbor lists are sorted at construction so every BFS expansion in the
/// crate proceeds in deterministic order without re-sorting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettlementGraph {
    municipalities: BTreeMap<SettlementId, MunicipalityId>,
    edges: Vec<EdgeId>,
    adjacency: BTreeMap<SettlementId, Vec<SettlementId>>,
}

impl SettlementGraph {
    /// Build from a node list (id, municipality) and an unordered edge list.
    /// Edges referencing unknown settlements are structural errors.
    pub fn new(
        nodes: impl IntoIterator<Item = (SettlementId, MunicipalityId)>,
        edge_pairs: impl IntoIterator<Item = (SettlementId, SettlementId)>,
    ) -> Result<Self, GraphError> {
        let mut municipalities = BTreeMap::new();
        let mut adjacency: BTreeMap<SettlementId, Vec<SettlementId>> = BTreeMap::new();
        for (sid, mun) in nodes {
            adjacency.entry(sid.clone()).or_default();
            municipalities.insert(sid, mun);
        }

        let mut edges = BTreeSet::new();
        for (x, y) in edge_pairs {
            let edge = EdgeId::new(x, y)?;
            for sid in [edge.a(), edge.b()] {
                if !municipalities.contains_key(sid) {
                    return Err(GraphError::UnknownSettlement { sid: sid.clone() });
                }
            }
            edges.insert(edge);
        }

        for edge in &edges {
            adjacency
                .get_mut(edge.a())
                .expect("endpoint checked above")
                .push(edge.b().clone());
            adjacency
                .get_mut(edge.b())
                .expect("endpoint checked above")
                .push(edge.a().clone());
        }
        // BTreeSet iteration inserts neighbors in edge order; normalize.
        for list in adjacency.values_mut() {
            list.sort();
            list.dedup();
        }

        Ok(Self {
            municipalities,
            edges: edges.into_iter().collect(),
            adjacency,
        })
    }

    pub fn contains(&self, sid: &str) -> bool {
        self.municipalities.contains_key(sid)
    }

    pub fn len(&self) -> usize {
        self.municipalities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.municipalities.is_empty()
    }

    /// Settlement ids in sorted order.
    pub fn settlements(&self) -> impl Iterator<Item = &SettlementId> {
        self.municipalities.keys()
    }

    pub fn municipality(&self, sid: &str) -> Option<&MunicipalityId> {
        self.municipalities.get(sid)
    }

    /// All edges, sorted by canonical key.
    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }

    pub fn has_edge(&self, edge: &EdgeId) -> bool {
        self.edges.binary_search(edge).is_ok()
    }

    /// Sorted neighbor list; empty for unknown settlements.
    pub fn neighbors(&self, sid: &str) -> &[SettlementId] {
        self.adjacency.get(sid).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_id_canonical_ordering() {
        let e = EdgeId::new("s2", "s1").unwrap();
        assert_eq!(e.a(), "s1");
        assert_eq!(e.b(), "s2");
        assert_eq!(e.to_string(), "s1__s2");
    }

    #[test]
    fn test_edge_id_rejects_self_loop() {
        assert!(matches!(
            EdgeId::new("s1", "s1"),
            Err(GraphError::SelfLoop { .. })
        ));
    }

    #[test]
    fn test_edge_id_parse_rejects_malformed() {
        assert!(matches!(
            EdgeId::parse("s1"),
            Err(GraphError::MalformedEdgeKey { .. })
        ));
        assert!(matches!(
            EdgeId::parse("s1__s2__s3"),
            Err(GraphError::MalformedEdgeKey { .. })
        ));
        assert!(matches!(
            EdgeId::parse("__s2"),
            Err(GraphError::MalformedEdgeKey { .. })
        ));
    }

    #[test]
    fn test_edge_id_parse_rejects_non_canonical() {
        assert!(matches!(
            EdgeId::parse("s2__s1"),
            Err(GraphError::NonCanonicalEdgeKey { .. })
        ));
        assert_eq!(EdgeId::parse("s1__s2").unwrap(), EdgeId::new("s1", "s2").unwrap());
    }

    #[test]
    fn test_graph_rejects_unknown_endpoint() {
        let err = SettlementGraph::new(
            [("s1".to_string(), "m1".to_string())],
            [("s1".to_string(), "s9".to_string())],
        )
        .unwrap_err();
        assert!(matches!(err, GraphError::UnknownSettlement { .. }));
    }

    #[test]
    fn test_neighbors_sorted_and_deduped() {
        let graph = SettlementGraph::new(
            [
                ("s1".to_string(), "m1".to_string()),
                ("s2".to_string(), "m1".to_string()),
                ("s3".to_string(), "m2".to_string()),
            ],
            [
                ("s3".to_string(), "s1".to_string()),
                ("s1".to_string(), "s2".to_string()),
                // Duplicate in reverse orientation collapses to one edge
                ("s2".to_string(), "s1".to_string()),
            ],
        )
        .unwrap();

        assert_eq!(graph.neighbors("s1"), ["s2".to_string(), "s3".to_string()]);
        assert_eq!(graph.edges().len(), 2);
        assert!(graph.has_edge(&EdgeId::new("s1", "s3").unwrap()));
    }

    #[test]
    fn test_edge_id_serde_round_trip() {
        let e = EdgeId::new("s1", "s2").unwrap();
        let json = serde_json::to_string(&e).unwrap();
        assert_eq!(json, "\"s1__s2\"");
        let back: EdgeId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, e);

        let bad: Result<EdgeId, _> = serde_json::from_str("\"s2__s1\"");
        assert!(bad.is_err());
    }
}
