//! Commit Log for Deterministic Replay
//!
//! Records every state replacement (grant or release) as a commit. Each
//! commit links to the previous via hash chain and carries the hash of the
//! state it produced.
//!
//! # Core Invariant
//!
//! > `reduce(genesis, commits) -> state`
//!
//! Replaying the same CommitLog always produces the same state.

use banker_core::{ProcessId, SystemState};
use serde::{Deserialize, Serialize};

use crate::hasher::{state_hash, write_pid, Hash32, StateHasher};
use crate::journal::EventId;

/// Commit identifier (hash)
pub type CommitId = Hash32;

/// A state mutation record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Hash of this commit (computed from contents + prev_commit)
    pub id: CommitId,
    /// Hash of the previous commit (chain integrity)
    pub prev_commit: CommitId,
    /// Sequence number (monotonic, genesis is 0)
    pub seq: u64,
    /// The type of state mutation
    pub commit_type: CommitType,
    /// Hash of the state after this commit
    pub state_hash: Hash32,
    /// Optional: the journal event that caused this commit
    pub caused_by: Option<EventId>,
}

/// Types of state mutations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommitType {
    /// Initial state, loaded from a descriptor
    Genesis { state: SystemState },
    /// A request was granted
    Granted { pid: ProcessId, request: Vec<u32> },
    /// A process released units
    Released { pid: ProcessId, release: Vec<u32> },
}

/// Append-only, hash-chained commit log.
pub struct CommitLog {
    /// Commit entries, genesis first
    commits: Vec<Commit>,
    /// Next sequence number
    next_seq: u64,
    /// Hash of the last commit
    last_hash: CommitId,
}

impl CommitLog {
    /// Create a log whose genesis commit records `genesis`.
    pub fn new(genesis: &SystemState) -> Self {
        let mut log = Self {
            commits: Vec::new(),
            next_seq: 0,
            last_hash: [0u8; 32],
        };
        log.append(
            CommitType::Genesis {
                state: genesis.clone(),
            },
            state_hash(genesis),
            None,
        );
        log
    }

    /// Append a commit. Returns its id.
    pub fn append(
        &mut self,
        commit_type: CommitType,
        state_hash: Hash32,
        caused_by: Option<EventId>,
    ) -> CommitId {
        let seq = self.next_seq;
        let prev_commit = self.last_hash;
        let id = compute_commit_id(&prev_commit, seq, &commit_type, &state_hash);

        self.commits.push(Commit {
            id,
            prev_commit,
            seq,
            commit_type,
            state_hash,
            caused_by,
        });
        self.next_seq += 1;
        self.last_hash = id;
        id
    }

    /// All commits, genesis first
    pub fn commits(&self) -> &[Commit] {
        &self.commits
    }

    /// Commits after `seq` (exclusive)
    pub fn since(&self, seq: u64) -> &[Commit] {
        let start = self
            .commits
            .iter()
            .position(|c| c.seq > seq)
            .unwrap_or(self.commits.len());
        &self.commits[start..]
    }

    /// Number of commits, genesis included
    pub fn len(&self) -> usize {
        self.commits.len()
    }

    /// Whether the log has no commits
    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    /// Hash of the most recent commit
    pub fn head(&self) -> CommitId {
        self.last_hash
    }

    /// Sequence number of the most recent commit
    pub fn current_seq(&self) -> u64 {
        self.next_seq.saturating_sub(1)
    }

    /// Recompute the hash chain and check every link.
    pub fn verify_integrity(&self) -> bool {
        verify_chain(&self.commits)
    }
}

/// Check the hash chain of a commit sequence.
pub fn verify_chain(commits: &[Commit]) -> bool {
    let mut prev = [0u8; 32];
    for (index, commit) in commits.iter().enumerate() {
        if commit.seq != index as u64 || commit.prev_commit != prev {
            return false;
        }
        let expected =
            compute_commit_id(&commit.prev_commit, commit.seq, &commit.commit_type, &commit.state_hash);
        if commit.id != expected {
            return false;
        }
        prev = commit.id;
    }
    true
}

fn compute_commit_id(
    prev: &CommitId,
    seq: u64,
    commit_type: &CommitType,
    state_hash: &Hash32,
) -> CommitId {
    let mut hasher = StateHasher::new();
    hasher.write_hash(prev);
    hasher.write_u64(seq);

    match commit_type {
        CommitType::Genesis { state } => {
            hasher.write_u8(0);
            hasher.write_hash(&crate::hasher::state_hash(state));
        }
        CommitType::Granted { pid, request } => {
            hasher.write_u8(1);
            write_pid(&mut hasher, *pid);
            hasher.write_counts(request);
        }
        CommitType::Released { pid, release } => {
            hasher.write_u8(2);
            write_pid(&mut hasher, *pid);
            hasher.write_counts(release);
        }
    }

    hasher.write_hash(state_hash);
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genesis() -> SystemState {
        SystemState::new(2, 1, vec![vec![0], vec![1]], vec![vec![2], vec![2]], vec![2]).unwrap()
    }

    #[test]
    fn test_new_log_has_genesis() {
        let log = CommitLog::new(&genesis());

        assert_eq!(log.len(), 1);
        assert_eq!(log.current_seq(), 0);
        assert!(matches!(
            log.commits()[0].commit_type,
            CommitType::Genesis { .. }
        ));
        assert_eq!(log.commits()[0].state_hash, state_hash(&genesis()));
        assert!(log.verify_integrity());
    }

    #[test]
    fn test_append_chains_hashes() {
        let mut log = CommitLog::new(&genesis());
        let genesis_id = log.head();

        let id = log.append(
            CommitType::Granted {
                pid: ProcessId(0),
                request: vec![1],
            },
            [7u8; 32],
            Some(3),
        );

        assert_eq!(log.head(), id);
        assert_eq!(log.commits()[1].prev_commit, genesis_id);
        assert_eq!(log.commits()[1].caused_by, Some(3));
        assert_eq!(log.since(0).len(), 1);
        assert!(log.verify_integrity());
    }

    #[test]
    fn test_tampering_breaks_integrity() {
        let mut log = CommitLog::new(&genesis());
        log.append(
            CommitType::Granted {
                pid: ProcessId(0),
                request: vec![1],
            },
            [7u8; 32],
            None,
        );

        let mut commits = log.commits().to_vec();
        commits[1].commit_type = CommitType::Granted {
            pid: ProcessId(1),
            request: vec![1],
        };
        assert!(!verify_chain(&commits));
    }
}
