//! Banker - serialized deadlock-avoidance allocator
//!
//! Runtime around `banker-core`:
//! - `Banker`: one lock around evaluate → commit
//! - Journal (audit trail) and hash-chained CommitLog with replay
//! - Descriptor loader and decision reporter
//! - Configuration from JSON or the environment

mod sync;

pub mod commitlog;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod hasher;
pub mod journal;
pub mod replay;
pub mod report;
pub mod system;

#[cfg(any(test, feature = "loom"))]
mod loom_tests;

pub use banker_core;

pub use commitlog::{verify_chain, Commit, CommitId, CommitLog, CommitType};
pub use config::BankerConfig;
pub use descriptor::DescriptorError;
pub use error::{BankerError, BankerResult};
pub use hasher::{state_hash, Hash32, StateHasher};
pub use journal::{EventId, Journal, JournalEntry, JournalEvent, RequestPhase};
pub use replay::{replay, ReplayError, ReplayResult};
pub use report::{DecisionLine, DecisionReport};
pub use system::{Banker, Snapshot};
