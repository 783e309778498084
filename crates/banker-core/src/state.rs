//! System state - immutable-per-version allocation snapshot
//!
//! `SystemState` holds the Allocation and Max matrices and the Available
//! vector. Need is always derived (`Max - Allocation`) and never stored.
//!
//! A state is only ever built through [`SystemState::new`], which rejects
//! any shape mismatch and any `Allocation > Max` cell, so every value of this
//! type satisfies the structural invariants. Transitions (`with_tentative_grant`,
//! `with_release`) return a fresh state and leave the receiver untouched.

use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

use crate::error::StateError;
use crate::types::{first_excess, Matrix, ProcessId, ResourceId};

/// Serialized shape of a [`SystemState`].
///
/// Deserializing a `SystemState` goes through this type and then through
/// validated construction, so invalid JSON states are rejected on load.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDescriptor {
    /// Allocation[i][j]: units of resource j held by process i
    pub allocation: Vec<Vec<u32>>,
    /// Max[i][j]: declared maximum demand of process i for resource j
    pub max: Vec<Vec<u32>>,
    /// Available[j]: free units of resource j
    pub available: Vec<u32>,
}

/// The allocator state: who holds what, who may still ask for what, and
/// what is free.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "StateDescriptor", into = "StateDescriptor")]
pub struct SystemState {
    allocation: Matrix,
    max: Matrix,
    available: Vec<u32>,
}

impl SystemState {
    /// Build a validated state for `processes` processes and `resources`
    /// resource types.
    pub fn new(
        processes: usize,
        resources: usize,
        allocation: Vec<Vec<u32>>,
        max: Vec<Vec<u32>>,
        available: Vec<u32>,
    ) -> Result<Self, StateError> {
        if processes == 0 || resources == 0 {
            return Err(StateError::Empty {
                processes,
                resources,
            });
        }

        let allocation = Matrix::from_rows("allocation", allocation, processes, resources)?;
        let max = Matrix::from_rows("max", max, processes, resources)?;

        if available.len() != resources {
            return Err(StateError::VectorLength {
                vector: "available",
                expected: resources,
                found: available.len(),
            });
        }

        for i in 0..processes {
            if let Some(resource) = first_excess(allocation.row(i), max.row(i)) {
                return Err(StateError::AllocationExceedsMax {
                    pid: ProcessId(i),
                    resource,
                    allocated: allocation.row(i)[resource.0],
                    max: max.row(i)[resource.0],
                });
            }
        }

        for (j, &free) in available.iter().enumerate() {
            let total = u64::from(free) + allocation.column_sum(j);
            if total > u64::from(u32::MAX) {
                return Err(StateError::TotalOverflow {
                    resource: ResourceId(j),
                });
            }
        }

        Ok(Self {
            allocation,
            max,
            available,
        })
    }

    // ========================================================================
    // Read-only accessors
    // ========================================================================

    /// Number of processes (n)
    pub fn process_count(&self) -> usize {
        self.allocation.rows()
    }

    /// Number of resource types (m)
    pub fn resource_count(&self) -> usize {
        self.available.len()
    }

    /// Whether `pid` names a process of this state
    pub fn contains(&self, pid: ProcessId) -> bool {
        pid.0 < self.process_count()
    }

    /// All process ids in ascending order
    pub fn processes(&self) -> impl Iterator<Item = ProcessId> {
        (0..self.process_count()).map(ProcessId)
    }

    /// The Allocation matrix
    pub fn allocation(&self) -> &Matrix {
        &self.allocation
    }

    /// The Max matrix
    pub fn max(&self) -> &Matrix {
        &self.max
    }

    /// The Available vector
    pub fn available(&self) -> &[u32] {
        &self.available
    }

    /// Allocation row of one process
    pub fn allocation_of(&self, pid: ProcessId) -> Option<&[u32]> {
        self.contains(pid).then(|| self.allocation.row(pid.0))
    }

    /// Max row of one process
    pub fn max_of(&self, pid: ProcessId) -> Option<&[u32]> {
        self.contains(pid).then(|| self.max.row(pid.0))
    }

    /// Need row of one process, computed on demand
    pub fn need_of(&self, pid: ProcessId) -> Option<Vec<u32>> {
        self.contains(pid)
            .then(|| (0..self.resource_count()).map(|j| self.need_at(pid.0, j)).collect())
    }

    /// The whole Need matrix, computed on demand
    pub fn need(&self) -> Matrix {
        let mut need = Matrix::zeros(self.process_count(), self.resource_count());
        for i in 0..self.process_count() {
            for (j, cell) in need.row_mut(i).iter_mut().enumerate() {
                *cell = self.need_at(i, j);
            }
        }
        need
    }

    /// Total instances per resource type (`Available + sum of Allocation`)
    pub fn totals(&self) -> Vec<u32> {
        self.available
            .iter()
            .enumerate()
            .map(|(j, &free)| {
                // Fits: checked at construction and preserved by every transition.
                (u64::from(free) + self.allocation.column_sum(j)) as u32
            })
            .collect()
    }

    /// `Need[pid] <= work` for every resource.
    ///
    /// `pid` must be in range.
    pub(crate) fn need_fits(&self, pid: ProcessId, work: &[u32]) -> bool {
        (0..self.resource_count()).all(|j| self.need_at(pid.0, j) <= work[j])
    }

    pub(crate) fn need_at(&self, row: usize, col: usize) -> u32 {
        self.max.row(row)[col] - self.allocation.row(row)[col]
    }

    // ========================================================================
    // Pure transitions
    // ========================================================================

    /// Return a new state in which `pid` has been handed `request`.
    ///
    /// `Available -= request`, `Allocation[pid] += request`. The receiver is
    /// not modified. Fails if the grant would exceed Need or Available.
    pub fn with_tentative_grant(
        &self,
        pid: ProcessId,
        request: &[u32],
    ) -> Result<Self, StateError> {
        self.check_vector(pid, "request", request)?;

        if let Some(j) = (0..self.resource_count()).find(|&j| request[j] > self.need_at(pid.0, j)) {
            return Err(StateError::GrantExceedsNeed {
                pid,
                resource: ResourceId(j),
            });
        }
        if let Some(resource) = first_excess(request, &self.available) {
            return Err(StateError::GrantExceedsAvailable { pid, resource });
        }

        let mut next = self.clone();
        for (j, &units) in request.iter().enumerate() {
            next.available[j] -= units;
            next.allocation.row_mut(pid.0)[j] += units;
        }
        Ok(next)
    }

    /// Return a new state in which `pid` has given back `release`.
    ///
    /// `Allocation[pid] -= release`, `Available += release`.
    pub fn with_release(&self, pid: ProcessId, release: &[u32]) -> Result<Self, StateError> {
        self.check_vector(pid, "release", release)?;

        let held = self.allocation.row(pid.0);
        if let Some(resource) = first_excess(release, held) {
            return Err(StateError::ReleaseExceedsAllocation {
                pid,
                resource,
                released: release[resource.0],
                allocated: held[resource.0],
            });
        }

        let mut next = self.clone();
        for (j, &units) in release.iter().enumerate() {
            next.allocation.row_mut(pid.0)[j] -= units;
            next.available[j] += units;
        }
        Ok(next)
    }

    fn check_vector(
        &self,
        pid: ProcessId,
        vector: &'static str,
        values: &[u32],
    ) -> Result<(), StateError> {
        if !self.contains(pid) {
            return Err(StateError::UnknownProcess(pid));
        }
        if values.len() != self.resource_count() {
            return Err(StateError::VectorLength {
                vector,
                expected: self.resource_count(),
                found: values.len(),
            });
        }
        Ok(())
    }
}

impl TryFrom<StateDescriptor> for SystemState {
    type Error = StateError;

    fn try_from(descriptor: StateDescriptor) -> Result<Self, Self::Error> {
        let processes = descriptor.allocation.len();
        let resources = descriptor.available.len();
        Self::new(
            processes,
            resources,
            descriptor.allocation,
            descriptor.max,
            descriptor.available,
        )
    }
}

impl From<SystemState> for StateDescriptor {
    fn from(state: SystemState) -> Self {
        Self {
            allocation: state.allocation.to_rows(),
            max: state.max.to_rows(),
            available: state.available,
        }
    }
}
