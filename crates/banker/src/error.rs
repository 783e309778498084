//! Error types for the allocator runtime
//!
//! `BankerError` is the umbrella returned by the runtime, the loader and the
//! replay engine. Grant, deny and wait are decisions, not errors, and never
//! show up here.

use banker_core::{RequestError, StateError};

use crate::descriptor::DescriptorError;
use crate::replay::ReplayError;

/// Errors surfaced by the runtime and its collaborators.
#[derive(Debug, thiserror::Error)]
pub enum BankerError {
    /// The input descriptor could not be parsed.
    #[error("malformed input: {0}")]
    MalformedInput(#[from] DescriptorError),

    /// The described state violates the structural invariants.
    #[error("invalid state: {0}")]
    InvalidState(#[from] StateError),

    /// The request call itself is malformed (unknown process, wrong length).
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] RequestError),

    /// A release asked to return units the process does not hold.
    #[error("invalid release: {0}")]
    InvalidRelease(StateError),

    /// A commit would have broken a state invariant.
    #[error("invariant violated: {invariant}: {description}")]
    InvariantViolated {
        invariant: &'static str,
        description: String,
    },

    /// Replaying the commit log failed.
    #[error("replay failed: {0}")]
    Replay(#[from] ReplayError),

    /// Reading a descriptor or config file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON document could not be decoded or encoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias for runtime operations
pub type BankerResult<T> = Result<T, BankerError>;
