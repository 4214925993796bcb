//! Domain model for the contact cache and its directory overlay.
//!
//! # Responsibility
//! - Define the cached `ContactRecord` and its reminder cadence.
//! - Define ephemeral directory-side shapes (groups, contact summaries).
//! - Define the parsed note journal entry.
//!
//! # Invariants
//! - Every cached contact is identified by a stable `ContactId`.
//! - Directory-side shapes are never persisted in the cache.

pub mod contact;
pub mod directory;
pub mod note;
