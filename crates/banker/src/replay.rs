//! Deterministic replay of a commit log.
//!
//! Rebuilds a `SystemState` from its genesis commit by re-applying every
//! grant and release through the same pure transitions the live allocator
//! uses, checking the recorded state hash after each step.

use banker_core::{StateError, SystemState};

use crate::commitlog::{verify_chain, Commit, CommitType};
use crate::hasher::{state_hash, Hash32};

/// Why a commit log could not be replayed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ReplayError {
    /// Log is empty or does not start with a genesis commit
    #[error("commit log does not start with a genesis commit")]
    MissingGenesis,

    /// A second genesis commit appears mid-log
    #[error("unexpected genesis commit at seq {0}")]
    UnexpectedGenesis(u64),

    /// The hash chain does not verify
    #[error("commit hash chain is broken")]
    BrokenChain,

    /// Re-applying a commit failed
    #[error("commit {seq} cannot be applied: {source}")]
    Transition {
        seq: u64,
        #[source]
        source: StateError,
    },

    /// The replayed state differs from the recorded one
    #[error("state hash mismatch at seq {seq}")]
    HashMismatch {
        seq: u64,
        expected: Hash32,
        found: Hash32,
    },
}

/// Result alias for replay operations
pub type ReplayResult<T> = Result<T, ReplayError>;

/// Replay `commits` from genesis and return the final state.
pub fn replay(commits: &[Commit]) -> ReplayResult<SystemState> {
    if !verify_chain(commits) {
        return Err(ReplayError::BrokenChain);
    }

    let (first, rest) = commits.split_first().ok_or(ReplayError::MissingGenesis)?;
    let mut state = match &first.commit_type {
        CommitType::Genesis { state } => state.clone(),
        _ => return Err(ReplayError::MissingGenesis),
    };
    check_hash(first, &state)?;

    for commit in rest {
        state = apply(&state, commit)?;
        check_hash(commit, &state)?;
    }

    Ok(state)
}

fn apply(state: &SystemState, commit: &Commit) -> ReplayResult<SystemState> {
    let next = match &commit.commit_type {
        CommitType::Genesis { .. } => return Err(ReplayError::UnexpectedGenesis(commit.seq)),
        CommitType::Granted { pid, request } => state.with_tentative_grant(*pid, request),
        CommitType::Released { pid, release } => state.with_release(*pid, release),
    };
    next.map_err(|source| ReplayError::Transition {
        seq: commit.seq,
        source,
    })
}

fn check_hash(commit: &Commit, state: &SystemState) -> ReplayResult<()> {
    let found = state_hash(state);
    if found != commit.state_hash {
        return Err(ReplayError::HashMismatch {
            seq: commit.seq,
            expected: commit.state_hash,
            found,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commitlog::CommitLog;
    use banker_core::ProcessId;

    fn genesis() -> SystemState {
        SystemState::new(2, 1, vec![vec![0], vec![1]], vec![vec![2], vec![2]], vec![2]).unwrap()
    }

    #[test]
    fn test_replay_genesis_only() {
        let log = CommitLog::new(&genesis());
        assert_eq!(replay(log.commits()), Ok(genesis()));
    }

    #[test]
    fn test_replay_grant_and_release() {
        let start = genesis();
        let mut log = CommitLog::new(&start);

        let granted = start.with_tentative_grant(ProcessId(0), &[2]).unwrap();
        log.append(
            CommitType::Granted {
                pid: ProcessId(0),
                request: vec![2],
            },
            state_hash(&granted),
            None,
        );
        let released = granted.with_release(ProcessId(0), &[2]).unwrap();
        log.append(
            CommitType::Released {
                pid: ProcessId(0),
                release: vec![2],
            },
            state_hash(&released),
            None,
        );

        assert_eq!(replay(log.commits()), Ok(released));
    }

    #[test]
    fn test_replay_empty_log() {
        assert_eq!(replay(&[]), Err(ReplayError::MissingGenesis));
    }

    #[test]
    fn test_replay_detects_hash_mismatch() {
        let mut log = CommitLog::new(&genesis());
        log.append(
            CommitType::Granted {
                pid: ProcessId(0),
                request: vec![1],
            },
            [0u8; 32],
            None,
        );

        assert!(matches!(
            replay(log.commits()),
            Err(ReplayError::HashMismatch { seq: 1, .. })
        ));
    }

    #[test]
    fn test_replay_detects_invalid_transition() {
        let start = genesis();
        let mut log = CommitLog::new(&start);
        // P1 holds 1 unit; releasing 2 cannot be applied.
        log.append(
            CommitType::Released {
                pid: ProcessId(1),
                release: vec![2],
            },
            state_hash(&start),
            None,
        );

        assert!(matches!(
            replay(log.commits()),
            Err(ReplayError::Transition { seq: 1, .. })
        ));
    }

    #[test]
    fn test_replay_rejects_tampered_chain() {
        let mut log = CommitLog::new(&genesis());
        log.append(
            CommitType::Granted {
                pid: ProcessId(0),
                request: vec![1],
            },
            [0u8; 32],
            None,
        );
        let mut commits = log.commits().to_vec();
        commits[1].seq = 5;

        assert_eq!(replay(&commits), Err(ReplayError::BrokenChain));
    }
}
