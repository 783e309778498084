//! Banker - the serialized allocator.
//!
//! Wraps one `SystemState` behind a single lock together with its Journal
//! (audit trail) and CommitLog (state mutations).
//!
//! ```text
//! caller ──▶ Banker::request()
//!              │ lock
//!              ├─ 1. Journal: log request
//!              ├─ 2. evaluate_request(&state)      (pure)
//!              ├─ 3. on Grant: check, swap state, CommitLog: append
//!              ├─ 4. Journal: log decision
//!              │ unlock
//!              ▼
//!           Decision
//! ```
//!
//! Evaluation and commit happen under the same critical section, so a grant
//! always commits against the exact state it was evaluated on. Callers that
//! receive `Wait` retry later; the allocator does not park them.

use banker_core::{
    check_all_invariants, check_conservation, evaluate_request, is_safe, Decision, InvariantViolation,
    ProcessId, SafetyReport, SystemState,
};
use log::{debug, info, warn};

use crate::commitlog::{Commit, CommitLog, CommitType};
use crate::config::BankerConfig;
use crate::error::{BankerError, BankerResult};
use crate::hasher::{short_hex, state_hash};
use crate::journal::{EventId, Journal, JournalEvent, RequestPhase};
use crate::replay::{replay, ReplayError};
use crate::sync::{Mutex, MutexGuard};

/// Everything guarded by the allocator lock
struct Inner {
    state: SystemState,
    journal: Journal,
    commits: CommitLog,
    /// Bumped on every committed transition
    version: u64,
}

impl Inner {
    fn commit(&mut self, next: SystemState, commit_type: CommitType, caused_by: EventId) {
        let hash = state_hash(&next);
        let id = self.commits.append(commit_type, hash, Some(caused_by));
        self.state = next;
        self.version += 1;
        debug!(
            "commit {} seq={} state={}",
            short_hex(&id),
            self.commits.current_seq(),
            short_hex(&hash)
        );
    }
}

/// A state and the version it was read at, taken under one lock.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub version: u64,
    pub state: SystemState,
}

/// Thread-safe Banker's algorithm allocator.
pub struct Banker {
    inner: Mutex<Inner>,
    config: BankerConfig,
}

impl Banker {
    /// Create an allocator over `state` with default settings.
    pub fn new(state: SystemState) -> Self {
        Self::with_config(state, BankerConfig::default())
    }

    /// Create an allocator over `state`.
    pub fn with_config(state: SystemState, config: BankerConfig) -> Self {
        info!(
            "banker ready: {} processes x {} resources, available {:?}",
            state.process_count(),
            state.resource_count(),
            state.available()
        );
        let inner = Inner {
            commits: CommitLog::new(&state),
            journal: Journal::new(config.journal_capacity),
            state,
            version: 0,
        };
        Self {
            inner: Mutex::new(inner),
            config,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &BankerConfig {
        &self.config
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// Evaluate a request from `pid` and commit it if granted.
    ///
    /// `Deny` and `Wait` leave the state untouched. Only malformed calls
    /// (unknown process, wrong vector length) return `Err`.
    pub fn request(&self, pid: ProcessId, request: &[u32]) -> BankerResult<Decision> {
        self.request_with_snapshot(pid, request)
            .map(|(decision, _)| decision)
    }

    /// Like [`Banker::request`], also returning the state in force once the
    /// decision was made: the committed state for a grant, the evaluated
    /// state otherwise.
    pub fn request_with_snapshot(
        &self,
        pid: ProcessId,
        request: &[u32],
    ) -> BankerResult<(Decision, Snapshot)> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        let version = inner.version;
        let event = inner.journal.log_request(pid, request, version);

        let decision = match evaluate_request(&inner.state, pid, request) {
            Ok(decision) => decision,
            Err(e) => {
                warn!("rejected request from {}: {}", pid, e);
                inner.journal.log_rejected(event, e.to_string(), version);
                return Err(e.into());
            }
        };

        if let Decision::Grant(grant) = &decision {
            if let Err(e) = self.check_transition(&inner.state, &grant.state) {
                inner.journal.log_rejected(event, e.to_string(), version);
                return Err(e);
            }
            inner.commit(
                grant.state.clone(),
                CommitType::Granted {
                    pid,
                    request: request.to_vec(),
                },
                event,
            );
        }

        inner.journal.log_decision(event, decision.outcome(), version);
        match &decision {
            Decision::Grant(grant) => info!(
                "{} {:?}: {} (sequence {:?})",
                pid,
                request,
                decision.outcome(),
                grant.sequence
            ),
            _ => info!("{} {:?}: {}", pid, request, decision.outcome()),
        }
        let snapshot = Snapshot {
            version: inner.version,
            state: inner.state.clone(),
        };
        Ok((decision, snapshot))
    }

    /// Return units held by `pid` and commit the new state.
    ///
    /// Releasing can never make a safe state unsafe, so no safety check runs.
    /// Returns the committed state with its version.
    pub fn release(&self, pid: ProcessId, release: &[u32]) -> BankerResult<Snapshot> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        let version = inner.version;
        let event = inner.journal.log_release(pid, release, version);

        let next = match inner.state.with_release(pid, release) {
            Ok(next) => next,
            Err(e) => {
                warn!("rejected release from {}: {}", pid, e);
                inner.journal.log_rejected(event, e.to_string(), version);
                return Err(BankerError::InvalidRelease(e));
            }
        };
        if let Err(e) = self.check_transition(&inner.state, &next) {
            inner.journal.log_rejected(event, e.to_string(), version);
            return Err(e);
        }

        inner.commit(
            next.clone(),
            CommitType::Released {
                pid,
                release: release.to_vec(),
            },
            event,
        );
        info!("{} released {:?}, available {:?}", pid, release, next.available());
        Ok(Snapshot {
            version: inner.version,
            state: next,
        })
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Copy of the current state
    pub fn snapshot(&self) -> SystemState {
        self.lock().state.clone()
    }

    /// Current state together with its version
    pub fn versioned(&self) -> Snapshot {
        let inner = self.lock();
        Snapshot {
            version: inner.version,
            state: inner.state.clone(),
        }
    }

    /// Run the safety algorithm on the current state.
    pub fn safety(&self) -> SafetyReport {
        is_safe(&self.lock().state)
    }

    /// Number of committed transitions
    pub fn version(&self) -> u64 {
        self.lock().version
    }

    /// Retained journal events, oldest first
    pub fn journal(&self) -> Vec<JournalEvent> {
        self.lock().journal.events().to_vec()
    }

    /// The most recent `count` journal events, newest first
    pub fn recent_events(&self, count: usize) -> Vec<JournalEvent> {
        self.lock()
            .journal
            .get_recent(count)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Lifecycle phase of a journaled request
    pub fn phase_of(&self, request_id: EventId) -> RequestPhase {
        self.lock().journal.phase_of(request_id)
    }

    /// All commits, genesis first
    pub fn commits(&self) -> Vec<Commit> {
        self.lock().commits.commits().to_vec()
    }

    /// Commits after `seq` (exclusive)
    pub fn commits_since(&self, seq: u64) -> Vec<Commit> {
        self.lock().commits.since(seq).to_vec()
    }

    /// Check the commit hash chain.
    pub fn verify_integrity(&self) -> bool {
        self.lock().commits.verify_integrity()
    }

    /// Replay the commit log and check it reproduces the live state.
    pub fn verify_replay(&self) -> BankerResult<SystemState> {
        let (commits, live, seq) = {
            let inner = self.lock();
            (
                inner.commits.commits().to_vec(),
                inner.state.clone(),
                inner.commits.current_seq(),
            )
        };

        let replayed = replay(&commits)?;
        if replayed != live {
            return Err(ReplayError::HashMismatch {
                seq,
                expected: state_hash(&live),
                found: state_hash(&replayed),
            }
            .into());
        }
        Ok(replayed)
    }

    fn check_transition(&self, before: &SystemState, after: &SystemState) -> BankerResult<()> {
        if !self.config.check_invariants {
            return Ok(());
        }

        let mut violations = check_all_invariants(after);
        violations.extend(check_conservation(before, after));
        match violations.into_iter().next() {
            Some(InvariantViolation {
                invariant,
                description,
            }) => {
                warn!("refusing commit: {}: {}", invariant, description);
                Err(BankerError::InvariantViolated {
                    invariant,
                    description,
                })
            }
            None => Ok(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
