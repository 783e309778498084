//! Error types for the allocator core
//!
//! Decisions (grant, deny, wait) are not errors and never appear here.
//! These types only describe malformed states and malformed calls.

use crate::types::{ProcessId, ResourceId};

/// A state that cannot be constructed or a transition that would break
/// the structural invariants.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    /// Zero processes or zero resource types
    #[error("state must have at least one process and one resource type (got {processes}x{resources})")]
    Empty { processes: usize, resources: usize },

    /// A matrix has the wrong number of rows
    #[error("{matrix} matrix has {found} rows, expected {expected}")]
    RowCount {
        matrix: &'static str,
        expected: usize,
        found: usize,
    },

    /// A matrix row has the wrong number of entries
    #[error("{matrix} row {row} has {found} entries, expected {expected}")]
    RowLength {
        matrix: &'static str,
        row: usize,
        expected: usize,
        found: usize,
    },

    /// A vector argument has the wrong length
    #[error("{vector} vector has {found} entries, expected {expected}")]
    VectorLength {
        vector: &'static str,
        expected: usize,
        found: usize,
    },

    /// Allocation exceeds declared maximum (negative need)
    #[error("allocation exceeds max demand for {pid}, {resource}: {allocated} > {max}")]
    AllocationExceedsMax {
        pid: ProcessId,
        resource: ResourceId,
        allocated: u32,
        max: u32,
    },

    /// Total instances of a resource type do not fit in a `u32`
    #[error("total instances of {resource} overflow")]
    TotalOverflow { resource: ResourceId },

    /// Process id out of range
    #[error("unknown process {0}")]
    UnknownProcess(ProcessId),

    /// Grant would push allocation above max
    #[error("grant to {pid} exceeds remaining need for {resource}")]
    GrantExceedsNeed { pid: ProcessId, resource: ResourceId },

    /// Grant would drive available below zero
    #[error("grant to {pid} exceeds available units of {resource}")]
    GrantExceedsAvailable { pid: ProcessId, resource: ResourceId },

    /// Release of units the process does not hold
    #[error("release by {pid} of {released} units of {resource} exceeds allocation {allocated}")]
    ReleaseExceedsAllocation {
        pid: ProcessId,
        resource: ResourceId,
        released: u32,
        allocated: u32,
    },
}

/// A request call that cannot be evaluated at all.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    /// Requesting process does not exist
    #[error("unknown process {0}")]
    UnknownProcess(ProcessId),

    /// Request vector length differs from the number of resource types
    #[error("request has {found} entries, expected {expected}")]
    RequestLength { expected: usize, found: usize },

    /// Building the tentative state failed
    #[error(transparent)]
    State(#[from] StateError),
}

/// Why a candidate completion order is not a valid safe sequence.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SequenceError {
    /// Sequence does not name every process exactly once
    #[error("sequence has {found} entries, expected {expected}")]
    Length { expected: usize, found: usize },

    /// Sequence names a process that does not exist
    #[error("unknown process {0} in sequence")]
    UnknownProcess(ProcessId),

    /// Sequence names a process twice
    #[error("process {0} appears twice in sequence")]
    Duplicate(ProcessId),

    /// Replaying the sequence stalls at `step`
    #[error("step {step}: {pid} needs {need} of {resource} but only {work} are free")]
    NeedExceedsWork {
        step: usize,
        pid: ProcessId,
        resource: ResourceId,
        need: u32,
        work: u32,
    },
}
