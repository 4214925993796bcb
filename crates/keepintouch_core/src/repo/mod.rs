//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the local contact cache contract.
//! - Isolate SQLite query details from sync/service orchestration.
//!
//! # Invariants
//! - Repository writes must enforce `ContactRecord::validate()` before
//!   persistence.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod contact_repo;
