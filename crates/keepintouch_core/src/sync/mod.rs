//! Reconciliation between the external directory and the local cache.
//!
//! # Responsibility
//! - Decide when the cache is imported from the directory.
//! - Own the in-memory merged contact set and its change notifications.
//!
//! # Invariants
//! - An empty cache is the only import trigger; once populated the cache
//!   wins over later directory edits.
//! - At most one import is in flight; concurrent callers share its outcome.

pub mod engine;
pub mod events;
