//! Derived subsystems operating on the merged contact set.
//!
//! # Responsibility
//! - Group display order, birthday views and the note journal.
//! - Keep presentation callers decoupled from storage and directory details.

pub mod birthday_index;
pub mod group_order;
pub mod note_journal;
