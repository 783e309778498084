//! Formal invariants for allocator verification
//!
//! Runtime-checkable invariants that must hold for every `SystemState` and
//! across every committed transition. Used for:
//! 1. Runtime assertion checking after commits (when enabled)
//! 2. Tests over grant/release sequences
//! 3. Formal verification with Kani
//!
//! # Invariants
//!
//! 1. **Shape**: Allocation and Max are `n x m`, Available has `m` entries
//! 2. **Bounded Allocation**: `Allocation[i][j] <= Max[i][j]` (Need never negative)
//! 3. **Representable Totals**: `Available[j] + sum_i Allocation[i][j]` fits in `u32`
//! 4. **Conservation**: totals per resource are equal before and after a transition

use alloc::string::String;
use alloc::vec::Vec;

use crate::state::SystemState;

/// An invariant violation with details
#[derive(Clone, Debug)]
pub struct InvariantViolation {
    /// Name of the violated invariant
    pub invariant: &'static str,
    /// Description of what went wrong
    pub description: String,
}

/// Check all state invariants.
///
/// Returns a list of violations (empty if all invariants hold).
pub fn check_all_invariants(state: &SystemState) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    violations.extend(check_shape(state));
    violations.extend(check_bounded_allocation(state));
    violations.extend(check_representable_totals(state));

    violations
}

/// Invariant 1: matrix and vector dimensions agree
fn check_shape(state: &SystemState) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let n = state.process_count();
    let m = state.resource_count();

    for (name, matrix) in [("allocation", state.allocation()), ("max", state.max())] {
        if matrix.rows() != n || matrix.cols() != m {
            violations.push(InvariantViolation {
                invariant: "shape",
                description: alloc::format!(
                    "{} matrix is {}x{}, expected {}x{}",
                    name,
                    matrix.rows(),
                    matrix.cols(),
                    n,
                    m
                ),
            });
        }
    }

    violations
}

/// Invariant 2: no process holds more than it declared
fn check_bounded_allocation(state: &SystemState) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    for (i, (held, max)) in state
        .allocation()
        .iter_rows()
        .zip(state.max().iter_rows())
        .enumerate()
    {
        for (j, (h, mx)) in held.iter().zip(max).enumerate() {
            if h > mx {
                violations.push(InvariantViolation {
                    invariant: "bounded_allocation",
                    description: alloc::format!(
                        "P{} holds {} of R{} but declared max {}",
                        i,
                        h,
                        j,
                        mx
                    ),
                });
            }
        }
    }

    violations
}

/// Invariant 3: per-resource totals are representable
fn check_representable_totals(state: &SystemState) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    for (j, &free) in state.available().iter().enumerate() {
        let total = u64::from(free) + state.allocation().column_sum(j);
        if total > u64::from(u32::MAX) {
            violations.push(InvariantViolation {
                invariant: "representable_totals",
                description: alloc::format!("R{} total {} overflows u32", j, total),
            });
        }
    }

    violations
}

/// Invariant 4: a transition neither creates nor destroys resource units.
pub fn check_conservation(before: &SystemState, after: &SystemState) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    if before.process_count() != after.process_count()
        || before.resource_count() != after.resource_count()
    {
        violations.push(InvariantViolation {
            invariant: "conservation",
            description: alloc::format!(
                "shape changed from {}x{} to {}x{}",
                before.process_count(),
                before.resource_count(),
                after.process_count(),
                after.resource_count()
            ),
        });
        return violations;
    }

    for (j, (b, a)) in before.totals().iter().zip(after.totals()).enumerate() {
        if *b != a {
            violations.push(InvariantViolation {
                invariant: "conservation",
                description: alloc::format!("R{} total changed from {} to {}", j, b, a),
            });
        }
    }

    violations
}

/// Assert all invariants hold (panic if not)
pub fn assert_invariants(state: &SystemState) {
    let violations = check_all_invariants(state);
    if let Some(v) = violations.first() {
        panic!("Invariant violated: {} ({})", v.invariant, v.description);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::evaluate_request;
    use crate::testing::classic_state;
    use crate::types::ProcessId;
    use alloc::vec;

    #[test]
    fn test_classic_state_satisfies_invariants() {
        let state = classic_state();
        assert!(check_all_invariants(&state).is_empty());
        assert_invariants(&state);
    }

    #[test]
    fn test_conservation_across_grant_and_release() {
        let state = classic_state();
        let granted = evaluate_request(&state, ProcessId(1), &[1, 0, 2])
            .unwrap()
            .into_state()
            .unwrap();
        let released = granted.with_release(ProcessId(1), &[3, 0, 2]).unwrap();

        assert!(check_conservation(&state, &granted).is_empty());
        assert!(check_conservation(&granted, &released).is_empty());
        assert!(check_all_invariants(&released).is_empty());
    }

    #[test]
    fn test_conservation_detects_changed_totals() {
        let state = classic_state();
        let other = SystemState::new(
            5,
            3,
            state.allocation().to_rows(),
            state.max().to_rows(),
            vec![3, 3, 3],
        )
        .unwrap();

        let violations = check_conservation(&state, &other);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].invariant, "conservation");
    }

    #[test]
    fn test_conservation_detects_shape_change() {
        let state = classic_state();
        let small = SystemState::new(1, 3, vec![vec![0, 0, 0]], vec![vec![1, 1, 1]], vec![1, 1, 1])
            .unwrap();
        let violations = check_conservation(&state, &small);
        assert_eq!(violations.len(), 1);
    }
}

// ============================================================================
// Kani proofs for invariants
// ============================================================================

#[cfg(kani)]
mod proofs {
    use super::*;
    use crate::request::evaluate_request;
    use crate::types::ProcessId;
    use alloc::vec;

    /// Proof: any committed grant conserves totals and keeps invariants
    #[kani::proof]
    #[kani::unwind(4)]
    fn grant_maintains_invariants() {
        let a0: u8 = kani::any();
        let a1: u8 = kani::any();
        let m0: u8 = kani::any();
        let m1: u8 = kani::any();
        let free: u8 = kani::any();
        let req: u8 = kani::any();
        kani::assume(a0 <= m0 && a1 <= m1);

        let state = SystemState::new(
            2,
            1,
            vec![vec![a0 as u32], vec![a1 as u32]],
            vec![vec![m0 as u32], vec![m1 as u32]],
            vec![free as u32],
        )
        .unwrap();

        let decision = evaluate_request(&state, ProcessId(0), &[req as u32]).unwrap();
        if let Some(next) = decision.into_state() {
            kani::assert(
                check_all_invariants(&next).is_empty(),
                "grant must keep invariants",
            );
            kani::assert(
                check_conservation(&state, &next).is_empty(),
                "grant must conserve totals",
            );
        }
    }
}
