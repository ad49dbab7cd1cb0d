//! Structured reports surfaced to the caller.
//!
//! Expected-in-normal-play conditions (rejected orders, auto-repairs,
//! advisory findings) are reported through these types rather than thrown;
//! hard errors are reserved for structural/precondition failures
//! ([`crate::step::FrontError`]).

use crate::graph::SettlementId;
use crate::state::FormationId;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

/// One validation finding: severity, stable machine code, human message,
/// optional path into the offending state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ValidationIssue {
    pub fn error(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            path: None,
        }
    }

    pub fn warning(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
            path: None,
        }
    }

    pub fn at(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// Result of initial AoR allocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AorReport {
    pub front_active_assigned: u32,
    pub rear_settlements: u32,
    pub brigade_counts: BTreeMap<FormationId, u32>,
}

/// One rejected reshape order with its reason, keyed by settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedReshape {
    pub settlement: SettlementId,
    pub reason: String,
}

/// Outcome of one turn's reshape order batch. Orders fail individually;
/// rejections never abort the remaining orders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReshapeReport {
    pub applied: u32,
    pub rejected: Vec<RejectedReshape>,
}

impl ReshapeReport {
    /// Rejection reasons keyed by settlement id, for audit surfaces.
    pub fn rejections_by_settlement(&self) -> BTreeMap<&SettlementId, &str> {
        self.rejected
            .iter()
            .map(|r| (&r.settlement, r.reason.as_str()))
            .collect()
    }
}

/// One contiguity repair: the formation whose AoR split, and where the
/// orphaned settlements went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContiguityRepair {
    pub formation: FormationId,
    pub kept: u32,
    /// Orphans and their new assignment (None = left unassigned).
    pub reassigned: BTreeMap<SettlementId, Option<FormationId>>,
}

/// Aggregate report for one full front turn.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TurnReport {
    /// Present only on the turn the AoR map was first allocated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aor_initialized: Option<AorReport>,
    pub brigade_repairs: Vec<ContiguityRepair>,
    pub corps_repairs: Vec<ContiguityRepair>,
    pub reshape: ReshapeReport,
    pub segments_active: u32,
    pub pressure_edges_updated: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejections_by_settlement() {
        let report = ReshapeReport {
            applied: 1,
            rejected: vec![
                RejectedReshape {
                    settlement: "s2".to_string(),
                    reason: "not adjacent".to_string(),
                },
                RejectedReshape {
                    settlement: "s1".to_string(),
                    reason: "not assigned".to_string(),
                },
            ],
        };
        let by_sid = report.rejections_by_settlement();
        assert_eq!(by_sid.len(), 2);
        assert_eq!(by_sid.iter().next().unwrap().0.as_str(), "s1");
    }

    #[test]
    fn test_issue_serializes_without_null_path() {
        let issue = ValidationIssue::warning("pressure.size.suspicious", "too many records");
        let json = serde_json::to_string(&issue).unwrap();
        assert!(!json.contains("path"));

        let with_path = ValidationIssue::error("pressure.sid.unknown", "bad id").at("front_pressure.a__b");
        let json = serde_json::to_string(&with_path).unwrap();
        assert!(json.contains("front_pressure.a__b"));
    }
}
