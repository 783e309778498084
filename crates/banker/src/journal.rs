//! Request Journal
//!
//! Records every request (and release) the allocator sees together with its
//! outcome, for auditing. This is separate from the CommitLog: the journal
//! is for auditing and keeps denied and waiting requests too, the CommitLog
//! only keeps state mutations and is used for replay.

use banker_core::{Outcome, ProcessId};
use serde::{Deserialize, Serialize};

/// Monotonic journal event id
pub type EventId = u64;

/// Where one request is in its lifecycle.
///
/// ```text
/// Idle ──▶ Evaluating ──┬──▶ Granted
///                       ├──▶ Denied
///                       └──▶ Waiting
/// ```
///
/// Evaluation runs under the allocator lock, so outside observers only ever
/// see a request as `Evaluating` if they read the journal from inside the
/// critical section; once the lock is released every request is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestPhase {
    /// No evaluation recorded (unknown id, or the call was rejected)
    Idle,
    /// Logged, not yet decided
    Evaluating,
    /// Granted and committed
    Granted,
    /// Denied (exceeds need or unsafe)
    Denied,
    /// Must wait for free units
    Waiting,
}

impl From<Outcome> for RequestPhase {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Grant => RequestPhase::Granted,
            Outcome::DenyExceedsNeed | Outcome::DenyUnsafeState => RequestPhase::Denied,
            Outcome::WaitInsufficientAvailable => RequestPhase::Waiting,
        }
    }
}

/// A journal event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEvent {
    /// Unique event ID (monotonic)
    pub id: EventId,
    /// State version the event was evaluated against
    pub version: u64,
    /// What happened
    pub entry: JournalEntry,
}

/// Journal event payloads.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JournalEntry {
    /// A request entered evaluation
    Request {
        /// Requesting process
        pid: ProcessId,
        /// Requested units per resource
        request: Vec<u32>,
    },
    /// A request reached a decision
    Decided {
        /// ID of the request entry
        request_id: EventId,
        /// The decision reached
        outcome: Outcome,
    },
    /// A request or release was malformed and never evaluated
    Rejected {
        /// ID of the request or release entry
        request_id: EventId,
        /// Error text
        reason: String,
    },
    /// A process handed units back
    Release {
        /// Releasing process
        pid: ProcessId,
        /// Released units per resource
        release: Vec<u32>,
    },
}

/// Default number of events to keep in memory
pub const DEFAULT_JOURNAL_CAPACITY: usize = 10_000;

/// Bounded, append-only request journal.
pub struct Journal {
    /// Event entries (append-only, oldest trimmed first)
    events: Vec<JournalEvent>,
    /// Next event ID to assign
    next_id: EventId,
    /// Maximum events kept
    capacity: usize,
}

impl Journal {
    /// Create a new empty journal keeping at most `capacity` events.
    pub fn new(capacity: usize) -> Self {
        Self {
            events: Vec::new(),
            next_id: 0,
            capacity: capacity.max(1),
        }
    }

    /// Log a request entering evaluation.
    ///
    /// Returns the event ID for correlating with the decision.
    pub fn log_request(&mut self, pid: ProcessId, request: &[u32], version: u64) -> EventId {
        self.push(
            version,
            JournalEntry::Request {
                pid,
                request: request.to_vec(),
            },
        )
    }

    /// Log the decision for a request.
    pub fn log_decision(&mut self, request_id: EventId, outcome: Outcome, version: u64) {
        self.push(version, JournalEntry::Decided { request_id, outcome });
    }

    /// Log a rejected (malformed) request or release.
    pub fn log_rejected(&mut self, request_id: EventId, reason: String, version: u64) {
        self.push(version, JournalEntry::Rejected { request_id, reason });
    }

    /// Log a release.
    pub fn log_release(&mut self, pid: ProcessId, release: &[u32], version: u64) -> EventId {
        self.push(
            version,
            JournalEntry::Release {
                pid,
                release: release.to_vec(),
            },
        )
    }

    /// Lifecycle phase of a request, derived from the journal.
    pub fn phase_of(&self, request_id: EventId) -> RequestPhase {
        let mut phase = RequestPhase::Idle;
        for event in &self.events {
            match &event.entry {
                JournalEntry::Request { .. } if event.id == request_id => {
                    phase = RequestPhase::Evaluating;
                }
                JournalEntry::Decided {
                    request_id: id,
                    outcome,
                } if *id == request_id => return RequestPhase::from(*outcome),
                JournalEntry::Rejected { request_id: id, .. } if *id == request_id => {
                    return RequestPhase::Idle;
                }
                _ => {}
            }
        }
        phase
    }

    /// Get all retained events.
    pub fn events(&self) -> &[JournalEvent] {
        &self.events
    }

    /// Get the most recent N events, newest first.
    pub fn get_recent(&self, count: usize) -> Vec<&JournalEvent> {
        self.events.iter().rev().take(count).collect()
    }

    /// Get the number of retained events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if the journal is empty.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Get the next event ID.
    pub fn next_id(&self) -> EventId {
        self.next_id
    }

    fn push(&mut self, version: u64, entry: JournalEntry) -> EventId {
        let id = self.next_id;
        self.next_id += 1;
        self.events.push(JournalEvent { id, version, entry });
        self.trim_if_needed();
        id
    }

    /// Trim old events if exceeding capacity.
    fn trim_if_needed(&mut self) {
        if self.events.len() > self.capacity {
            let drain_count = self.events.len() - self.capacity;
            self.events.drain(0..drain_count);
        }
    }
}

impl Default for Journal {
    fn default() -> Self {
        Self::new(DEFAULT_JOURNAL_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_monotonic() {
        let mut journal = Journal::default();
        let a = journal.log_request(ProcessId(0), &[1, 0], 0);
        journal.log_decision(a, Outcome::Grant, 0);
        let b = journal.log_release(ProcessId(0), &[1, 0], 1);

        assert_eq!((a, b), (0, 2));
        assert_eq!(journal.len(), 3);
        assert_eq!(journal.next_id(), 3);
    }

    #[test]
    fn test_phase_follows_lifecycle() {
        let mut journal = Journal::default();
        assert_eq!(journal.phase_of(0), RequestPhase::Idle);

        let id = journal.log_request(ProcessId(1), &[0, 1], 0);
        assert_eq!(journal.phase_of(id), RequestPhase::Evaluating);

        journal.log_decision(id, Outcome::WaitInsufficientAvailable, 0);
        assert_eq!(journal.phase_of(id), RequestPhase::Waiting);

        let denied = journal.log_request(ProcessId(1), &[9, 9], 0);
        journal.log_decision(denied, Outcome::DenyUnsafeState, 0);
        assert_eq!(journal.phase_of(denied), RequestPhase::Denied);

        let rejected = journal.log_request(ProcessId(7), &[0, 0], 0);
        journal.log_rejected(rejected, "unknown process P7".into(), 0);
        assert_eq!(journal.phase_of(rejected), RequestPhase::Idle);
    }

    #[test]
    fn test_trims_to_capacity() {
        let mut journal = Journal::new(3);
        for i in 0..5 {
            journal.log_request(ProcessId(i), &[0], 0);
        }

        assert_eq!(journal.len(), 3);
        assert_eq!(journal.events()[0].id, 2);
        assert_eq!(journal.get_recent(1)[0].id, 4);
    }
}
