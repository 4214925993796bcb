//! Change notifications emitted by the sync engine.

use crate::model::contact::{ContactId, ReminderGroup};
use std::sync::Arc;

/// Fired after a mutation has been confirmed by its owning store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactsEvent {
    /// Bulk import finished and the in-memory set was reloaded.
    Imported { count: usize },
    GroupChanged {
        contact_id: ContactId,
        group: ReminderGroup,
    },
    ContactEdited { contact_id: ContactId },
    ContactDeleted { contact_id: ContactId },
    /// The directory confirmed a note append or replace.
    NoteChanged { contact_id: ContactId },
}

/// Handle returned by `SyncEngine::subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

pub type ContactsListener = Arc<dyn Fn(&ContactsEvent) + Send + Sync>;
