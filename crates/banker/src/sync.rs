//! Lock primitive used by the allocator.
//!
//! Resolves to loom's model-checked mutex under the `loom` feature and to
//! `std::sync::Mutex` otherwise.

#[cfg(feature = "loom")]
pub(crate) use loom::sync::{Mutex, MutexGuard};

#[cfg(not(feature = "loom"))]
pub(crate) use std::sync::{Mutex, MutexGuard};
