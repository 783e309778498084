//! Banker Core - Pure Deadlock-Avoidance Allocator
//!
//! This crate contains the **pure, I/O-free** Banker's algorithm: the system
//! state, the safety check and the request-admission protocol.
//!
//! # Design Principles
//!
//! 1. **No I/O or side effects**: pure state transformations only
//! 2. **Copy-on-evaluate**: requests build a tentative state; the caller
//!    commits it only on grant, so rollback is just dropping a value
//! 3. **Deterministic**: same state and request always give the same decision
//! 4. **Verifiable**: small enough for Kani proofs
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       banker-core                           │
//! │                                                             │
//! │   ┌───────────────┐    ┌────────────────────┐               │
//! │   │  SystemState  │───▶│ evaluate_request() │               │
//! │   │  - allocation │    │  need / available  │               │
//! │   │  - max        │    │  tentative grant   │               │
//! │   │  - available  │    └─────────┬──────────┘               │
//! │   └───────────────┘              │                          │
//! │                                  ▼                          │
//! │   ┌───────────────┐    ┌────────────────────┐               │
//! │   │  Invariants   │    │     is_safe()      │               │
//! │   │  Assertions   │    │  work relaxation   │               │
//! │   └───────────────┘    └────────────────────┘               │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              │ used by
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          banker                             │
//! │   - Exclusive lock around evaluate → commit                 │
//! │   - Journal and hash-chained CommitLog, replay              │
//! │   - Descriptor loader and decision reporter                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Module Organization
//!
//! - `types` - Identifiers and the dense `Matrix`
//! - `state` - `SystemState` with validated construction and pure transitions
//! - `safety` - `is_safe` and `verify_sequence`
//! - `request` - `evaluate_request` and the `Decision` value
//! - `invariants` - Invariant assertions for tests and verification
//! - `error` - Construction and call-shape errors

#![no_std]
extern crate alloc;

pub mod error;
pub mod invariants;
pub mod request;
pub mod safety;
pub mod state;
pub mod types;

// Re-export all public types for convenient access
pub use error::{RequestError, SequenceError, StateError};
pub use invariants::{assert_invariants, check_all_invariants, check_conservation, InvariantViolation};
pub use request::{evaluate_request, Decision, DenyReason, Grant, Outcome, WaitReason};
pub use safety::{is_safe, verify_sequence, SafeSequence, SafetyReport};
pub use state::{StateDescriptor, SystemState};
pub use types::{Matrix, ProcessId, ResourceId};

#[cfg(test)]
pub(crate) mod testing {
    use crate::state::SystemState;
    use alloc::vec;

    /// The textbook 5-process, 3-resource instance
    pub fn classic_state() -> SystemState {
        SystemState::new(
            5,
            3,
            vec![
                vec![0, 1, 0],
                vec![2, 0, 0],
                vec![3, 0, 2],
                vec![2, 1, 1],
                vec![0, 0, 2],
            ],
            vec![
                vec![7, 5, 3],
                vec![3, 2, 2],
                vec![9, 0, 2],
                vec![2, 2, 2],
                vec![4, 3, 3],
            ],
            vec![3, 3, 2],
        )
        .unwrap()
    }
}
