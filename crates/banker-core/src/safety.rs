//! Safety algorithm - work-vector relaxation
//!
//! Decides whether every process of a [`SystemState`] can still run to
//! completion, and if so in which order.
//!
//! # Algorithm
//!
//! ```text
//! Work   := Available
//! Finish := false for all i
//! repeat
//!     for i in 0..n (ascending)
//!         if !Finish[i] and Need[i] <= Work
//!             Work += Allocation[i]; Finish[i] := true; sequence.push(i)
//! until a pass finishes nobody, or everybody has finished
//! ```
//!
//! Processes are always scanned in ascending id order, so when several are
//! runnable in the same pass the lowest id goes first. Two runs over the same
//! state produce the same sequence.
//!
//! Each pass either finishes at least one process or ends the loop, so the
//! loop runs at most `n` passes. The routine is pure: it reads the snapshot and
//! owns its scratch vectors.

use alloc::collections::BTreeSet;
use alloc::vec;
use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

use crate::error::SequenceError;
use crate::state::SystemState;
use crate::types::{ProcessId, ResourceId};

/// One valid completion order
pub type SafeSequence = Vec<ProcessId>;

/// Verdict of the safety algorithm
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyReport {
    /// Every process can finish
    pub safe: bool,
    /// Completion order found (complete when safe, partial otherwise)
    pub sequence: SafeSequence,
    /// Processes that could not finish (empty when safe)
    pub stuck: BTreeSet<ProcessId>,
    /// Number of full passes performed
    pub passes: usize,
}

/// Run the safety algorithm over `state`.
pub fn is_safe(state: &SystemState) -> SafetyReport {
    let n = state.process_count();
    let mut work: Vec<u32> = state.available().to_vec();
    let mut finish = vec![false; n];
    let mut sequence = Vec::with_capacity(n);
    let mut passes = 0;

    while sequence.len() < n {
        passes += 1;
        let mut progress = false;

        for i in 0..n {
            let pid = ProcessId(i);
            if finish[i] || !state.need_fits(pid, &work) {
                continue;
            }

            // Cannot overflow: work never exceeds the per-resource total,
            // which fits in u32.
            for (w, held) in work.iter_mut().zip(state.allocation().row(i)) {
                *w += *held;
            }
            finish[i] = true;
            sequence.push(pid);
            progress = true;
        }

        if !progress {
            break;
        }
    }

    let stuck: BTreeSet<ProcessId> = finish
        .iter()
        .enumerate()
        .filter(|(_, done)| !**done)
        .map(|(i, _)| ProcessId(i))
        .collect();

    SafetyReport {
        safe: stuck.is_empty(),
        sequence,
        stuck,
        passes,
    }
}

/// Check that `sequence` is a valid completion order for `state`.
///
/// Replays the sequence, releasing each process's allocation into Work in
/// order, and fails at the first step whose Need exceeds Work.
pub fn verify_sequence(state: &SystemState, sequence: &[ProcessId]) -> Result<(), SequenceError> {
    let n = state.process_count();
    if sequence.len() != n {
        return Err(SequenceError::Length {
            expected: n,
            found: sequence.len(),
        });
    }

    let mut seen = vec![false; n];
    let mut work: Vec<u32> = state.available().to_vec();

    for (step, &pid) in sequence.iter().enumerate() {
        if !state.contains(pid) {
            return Err(SequenceError::UnknownProcess(pid));
        }
        if seen[pid.0] {
            return Err(SequenceError::Duplicate(pid));
        }
        seen[pid.0] = true;

        for (j, w) in work.iter().enumerate() {
            let need = state.need_at(pid.0, j);
            if need > *w {
                return Err(SequenceError::NeedExceedsWork {
                    step,
                    pid,
                    resource: ResourceId(j),
                    need,
                    work: *w,
                });
            }
        }

        for (w, held) in work.iter_mut().zip(state.allocation().row(pid.0)) {
            *w += *held;
        }
    }

    Ok(())
}


// ============================================================================
// Kani proofs
// ============================================================================

#[cfg(kani)]
mod proofs {
    use super::*;

    /// Proof: a safe verdict always comes with a replayable sequence, and the
    /// check never changes its input.
    #[kani::proof]
    #[kani::unwind(4)]
    fn safe_verdict_has_valid_sequence() {
        let a0: u8 = kani::any();
        let a1: u8 = kani::any();
        let m0: u8 = kani::any();
        let m1: u8 = kani::any();
        let free: u8 = kani::any();
        kani::assume(a0 <= m0 && a1 <= m1);

        let state = SystemState::new(
            2,
            1,
            vec![vec![a0 as u32], vec![a1 as u32]],
            vec![vec![m0 as u32], vec![m1 as u32]],
            vec![free as u32],
        )
        .unwrap();
        let before = state.clone();

        let report = is_safe(&state);

        kani::assert(state == before, "is_safe must not mutate its input");
        kani::assert(report.passes <= 2, "at most n passes");
        if report.safe {
            kani::assert(
                verify_sequence(&state, &report.sequence).is_ok(),
                "safe sequence must replay",
            );
        }
    }
}
