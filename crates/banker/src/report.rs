//! Decision and safety reporting
//!
//! Text lines for terminals and a serializable report for JSON consumers.
//!
//! ```text
//! GRANT
//! Safe sequence: P1 -> P3 -> P4 -> P0 -> P2
//! ```

use std::collections::BTreeSet;
use std::fmt;

use banker_core::{Decision, DenyReason, Outcome, ProcessId, SafetyReport, WaitReason};
use serde::{Deserialize, Serialize};

/// The one-line rendering of a decision (`GRANT`, `DENY(UnsafeState)`, ...)
pub struct DecisionLine<'a>(pub &'a Decision);

impl fmt::Display for DecisionLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.outcome())
    }
}

/// `P1 -> P3 -> P4`
pub fn format_sequence(sequence: &[ProcessId]) -> String {
    join(sequence.iter(), " -> ")
}

/// `P0, P2`
pub fn format_set(set: &BTreeSet<ProcessId>) -> String {
    join(set.iter(), ", ")
}

fn join<'a>(pids: impl Iterator<Item = &'a ProcessId>, sep: &str) -> String {
    pids.map(ToString::to_string).collect::<Vec<_>>().join(sep)
}

/// Human-readable explanation of a non-grant decision
pub fn explain(decision: &Decision) -> Option<String> {
    match decision {
        Decision::Grant(_) => None,
        Decision::Deny(DenyReason::ExceedsNeed {
            resource,
            requested,
            need,
        }) => Some(format!(
            "requested {} of {} but remaining need is {}",
            requested, resource, need
        )),
        Decision::Deny(DenyReason::UnsafeState { stuck }) => {
            Some(format!("could not finish: {}", format_set(stuck)))
        }
        Decision::Wait(WaitReason::InsufficientAvailable {
            resource,
            requested,
            available,
        }) => Some(format!(
            "requested {} of {} but only {} available",
            requested, resource, available
        )),
    }
}

/// Decision line, followed by the safe sequence when granted.
pub fn render_decision(decision: &Decision) -> String {
    match decision.sequence() {
        Some(sequence) => format!(
            "{}\nSafe sequence: {}",
            DecisionLine(decision),
            format_sequence(sequence)
        ),
        None => DecisionLine(decision).to_string(),
    }
}

/// `SAFE` with the sequence, or `UNSAFE` with the stuck processes.
pub fn render_safety(report: &SafetyReport) -> String {
    if report.safe {
        format!("SAFE\nSafe sequence: {}", format_sequence(&report.sequence))
    } else {
        format!("UNSAFE\nStuck: {}", format_set(&report.stuck))
    }
}

/// JSON shape of one evaluated request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionReport {
    pub pid: ProcessId,
    pub request: Vec<u32>,
    pub outcome: Outcome,
    /// `GRANT`, `DENY(ExceedsNeed)`, ...
    pub line: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<Vec<ProcessId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Available vector after the decision
    pub available: Vec<u32>,
}

impl DecisionReport {
    pub fn new(pid: ProcessId, request: &[u32], decision: &Decision, available: &[u32]) -> Self {
        Self {
            pid,
            request: request.to_vec(),
            outcome: decision.outcome(),
            line: DecisionLine(decision).to_string(),
            sequence: decision.sequence().map(<[ProcessId]>::to_vec),
            detail: explain(decision),
            available: available.to_vec(),
        }
    }
}
