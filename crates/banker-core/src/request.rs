//! Request admission - simulate, check, commit or discard
//!
//! [`evaluate_request`] decides one resource request against a state:
//!
//! 1. `request <= Need[pid]`, else [`DenyReason::ExceedsNeed`]
//! 2. `request <= Available`, else [`WaitReason::InsufficientAvailable`]
//! 3. build the tentative state and run the safety algorithm on it:
//!    safe gives [`Decision::Grant`] carrying the new state, unsafe gives
//!    [`DenyReason::UnsafeState`] and the tentative state is dropped.
//!
//! The input state is only borrowed. Nothing changes unless the caller
//! takes the state out of a `Grant` and installs it; every other outcome
//! is side-effect free by construction.

use alloc::collections::BTreeSet;
use core::fmt;
use serde::{Deserialize, Serialize};

use crate::error::RequestError;
use crate::safety::{is_safe, SafeSequence};
use crate::state::SystemState;
use crate::types::{ProcessId, ResourceId};

/// A granted request: the state to commit and the sequence proving it safe
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    /// New state with the request applied
    pub state: SystemState,
    /// Safe sequence of the new state
    pub sequence: SafeSequence,
}

/// Permanent refusals
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DenyReason {
    /// The process asked for more than it declared it would ever need
    ExceedsNeed {
        resource: ResourceId,
        requested: u32,
        need: u32,
    },
    /// Granting would leave no safe completion order
    UnsafeState {
        /// Processes that could not finish in the tentative state
        stuck: BTreeSet<ProcessId>,
    },
}

/// Transient refusals; the caller may retry later
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaitReason {
    /// Within Need, but not enough units are free right now
    InsufficientAvailable {
        resource: ResourceId,
        requested: u32,
        available: u32,
    },
}

/// Result of evaluating a request. Never an error.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// Request admitted; commit the carried state
    Grant(Grant),
    /// Request refused
    Deny(DenyReason),
    /// Request must wait for resources to be released
    Wait(WaitReason),
}

/// Flat outcome tag, for logs and reports
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// Granted
    Grant,
    /// Denied: request exceeds declared need
    DenyExceedsNeed,
    /// Denied: request would lead to an unsafe state
    DenyUnsafeState,
    /// Wait: not enough free units
    WaitInsufficientAvailable,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Outcome::Grant => "GRANT",
            Outcome::DenyExceedsNeed => "DENY(ExceedsNeed)",
            Outcome::DenyUnsafeState => "DENY(UnsafeState)",
            Outcome::WaitInsufficientAvailable => "WAIT(InsufficientAvailable)",
        };
        f.write_str(text)
    }
}

impl Decision {
    /// The outcome tag of this decision
    pub fn outcome(&self) -> Outcome {
        match self {
            Decision::Grant(_) => Outcome::Grant,
            Decision::Deny(DenyReason::ExceedsNeed { .. }) => Outcome::DenyExceedsNeed,
            Decision::Deny(DenyReason::UnsafeState { .. }) => Outcome::DenyUnsafeState,
            Decision::Wait(WaitReason::InsufficientAvailable { .. }) => {
                Outcome::WaitInsufficientAvailable
            }
        }
    }

    /// Whether the request was granted
    pub fn is_grant(&self) -> bool {
        matches!(self, Decision::Grant(_))
    }

    /// Safe sequence of the new state, when granted
    pub fn sequence(&self) -> Option<&[ProcessId]> {
        match self {
            Decision::Grant(grant) => Some(&grant.sequence),
            _ => None,
        }
    }

    /// Take the new state out of a grant
    pub fn into_state(self) -> Option<SystemState> {
        match self {
            Decision::Grant(grant) => Some(grant.state),
            _ => None,
        }
    }
}

/// Evaluate one request by `pid` against `state`.
///
/// Returns `Err` only when the call itself is malformed (unknown process,
/// wrong vector length). Grant, deny and wait are all `Ok`.
pub fn evaluate_request(
    state: &SystemState,
    pid: ProcessId,
    request: &[u32],
) -> Result<Decision, RequestError> {
    let need = state
        .need_of(pid)
        .ok_or(RequestError::UnknownProcess(pid))?;

    if request.len() != state.resource_count() {
        return Err(RequestError::RequestLength {
            expected: state.resource_count(),
            found: request.len(),
        });
    }

    // Step 1: request <= Need
    if let Some(j) = request.iter().zip(&need).position(|(r, n)| r > n) {
        return Ok(Decision::Deny(DenyReason::ExceedsNeed {
            resource: ResourceId(j),
            requested: request[j],
            need: need[j],
        }));
    }

    // Step 2: request <= Available
    let available = state.available();
    if let Some(j) = request.iter().zip(available).position(|(r, a)| r > a) {
        return Ok(Decision::Wait(WaitReason::InsufficientAvailable {
            resource: ResourceId(j),
            requested: request[j],
            available: available[j],
        }));
    }

    // Step 3: simulate, then check
    let tentative = state.with_tentative_grant(pid, request)?;
    let report = is_safe(&tentative);

    if report.safe {
        Ok(Decision::Grant(Grant {
            state: tentative,
            sequence: report.sequence,
        }))
    } else {
        Ok(Decision::Deny(DenyReason::UnsafeState {
            stuck: report.stuck,
        }))
    }
}
