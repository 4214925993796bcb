//! Adapter over the external contact directory.
//!
//! # Responsibility
//! - Define the provider contract (`ContactDirectory`) that platform
//!   integrations implement.
//! - Gate every read/write behind the single per-session access decision.
//! - Validate and compose note mutations before they reach the provider.
//!
//! # Invariants
//! - No provider read is issued before access is granted.
//! - Blank note text is rejected before any external call.
//! - Note read-modify-write sequences are serialized; the returned text is
//!   what the provider confirmed, never an optimistic guess.

mod memory;

pub use memory::{DirectorySnapshot, InMemoryDirectory, SnapshotGroup};

use crate::model::directory::{ContactSummary, GroupDescriptor};
use crate::model::note::compose_entry;
use chrono::{DateTime, Local};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex};

pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Source of "now" for note timestamps.
pub type Clock = Arc<dyn Fn() -> DateTime<Local> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// Access to the directory was refused (or never granted).
    PermissionDenied,
    /// Contact or group id is unknown to the directory.
    NotFound(String),
    /// Blank text rejected before reaching the directory.
    EmptyInput,
    /// The provider failed for another reason.
    Unavailable(String),
}

impl Display for DirectoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PermissionDenied => write!(f, "contact directory access denied"),
            Self::NotFound(id) => write!(f, "directory entry not found: {id}"),
            Self::EmptyInput => write!(f, "note text cannot be empty"),
            Self::Unavailable(message) => write!(f, "contact directory unavailable: {message}"),
        }
    }
}

impl Error for DirectoryError {}

/// Outcome of the most recent access request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessStatus {
    NotDetermined,
    Granted,
    Denied,
}

/// Contract implemented by the platform address book integration.
///
/// Implementations do not check authorization themselves; `DirectoryClient`
/// does that before calling any read or write.
pub trait ContactDirectory: Send + Sync {
    /// Asks the platform for access. `Ok(true)` means granted.
    fn request_access(&self) -> DirectoryResult<bool>;
    fn groups(&self) -> DirectoryResult<Vec<GroupDescriptor>>;
    /// Every contact, in directory order.
    fn contacts(&self) -> DirectoryResult<Vec<ContactSummary>>;
    /// `NotFound` for an unknown group id.
    fn contacts_in_group(&self, group_id: &str) -> DirectoryResult<Vec<ContactSummary>>;
    fn contact(&self, id: &str) -> DirectoryResult<Option<ContactSummary>>;
    /// Overwrites the note field. `NotFound` for an unknown id.
    fn write_note(&self, id: &str, note: &str) -> DirectoryResult<()>;
}

/// Access-gated client used by the rest of the core.
pub struct DirectoryClient {
    provider: Arc<dyn ContactDirectory>,
    access: Mutex<AccessStatus>,
    note_writes: Mutex<()>,
    clock: Clock,
}

impl DirectoryClient {
    pub fn new(provider: Arc<dyn ContactDirectory>) -> Self {
        Self::with_clock(provider, Arc::new(Local::now))
    }

    pub fn with_clock(provider: Arc<dyn ContactDirectory>, clock: Clock) -> Self {
        Self {
            provider,
            access: Mutex::new(AccessStatus::NotDetermined),
            note_writes: Mutex::new(()),
            clock,
        }
    }

    /// Asks the provider for access and records the answer for this session.
    ///
    /// Concurrent callers wait for the in-flight request instead of issuing
    /// their own.
    pub fn request_access(&self) -> DirectoryResult<AccessStatus> {
        let mut access = self.lock_access()?;
        let status = self.ask_provider()?;
        *access = status;
        Ok(status)
    }

    /// Requests access only if no decision was made yet this session.
    pub fn ensure_access(&self) -> DirectoryResult<AccessStatus> {
        let mut access = self.lock_access()?;
        if *access == AccessStatus::NotDetermined {
            *access = self.ask_provider()?;
        }
        Ok(*access)
    }

    pub fn access_status(&self) -> AccessStatus {
        self.access
            .lock()
            .map(|access| *access)
            .unwrap_or(AccessStatus::NotDetermined)
    }

    pub fn list_groups(&self) -> DirectoryResult<Vec<GroupDescriptor>> {
        self.require_access()?;
        self.provider.groups()
    }

    pub fn list_contacts_in_group(&self, group_id: &str) -> DirectoryResult<Vec<ContactSummary>> {
        self.require_access()?;
        self.provider.contacts_in_group(group_id)
    }

    pub fn list_all_contacts(&self) -> DirectoryResult<Vec<ContactSummary>> {
        self.require_access()?;
        self.provider.contacts()
    }

    pub fn fetch_contact(&self, id: &str) -> DirectoryResult<ContactSummary> {
        self.require_access()?;
        self.provider
            .contact(id)?
            .ok_or_else(|| DirectoryError::NotFound(id.to_string()))
    }

    /// Prepends a timestamped entry to the contact's note and returns the
    /// confirmed note text.
    ///
    /// Blank lines inside `text` are dropped; see [`compose_entry`].
    pub fn append_note(&self, id: &str, text: &str) -> DirectoryResult<String> {
        if text.trim().is_empty() {
            return Err(DirectoryError::EmptyInput);
        }
        self.require_access()?;

        let _guard = self
            .note_writes
            .lock()
            .map_err(|_| DirectoryError::Unavailable("note lock poisoned".to_string()))?;
        let current = self.fetch_contact(id)?;
        let entry = compose_entry(&(self.clock)(), text);
        let updated = format!("{entry}{}", current.note);
        self.provider.write_note(id, &updated)?;

        info!(
            "event=note_append module=directory status=ok entry_chars={} note_chars={}",
            entry.chars().count(),
            updated.chars().count()
        );
        Ok(updated)
    }

    /// Unconditionally overwrites the contact's note.
    pub fn replace_note(&self, id: &str, text: &str) -> DirectoryResult<String> {
        self.require_access()?;

        let _guard = self
            .note_writes
            .lock()
            .map_err(|_| DirectoryError::Unavailable("note lock poisoned".to_string()))?;
        self.fetch_contact(id)?;
        self.provider.write_note(id, text)?;

        info!(
            "event=note_replace module=directory status=ok note_chars={}",
            text.chars().count()
        );
        Ok(text.to_string())
    }

    fn require_access(&self) -> DirectoryResult<()> {
        match *self.lock_access()? {
            AccessStatus::Granted => Ok(()),
            AccessStatus::NotDetermined | AccessStatus::Denied => {
                Err(DirectoryError::PermissionDenied)
            }
        }
    }

    fn ask_provider(&self) -> DirectoryResult<AccessStatus> {
        let status = if self.provider.request_access()? {
            AccessStatus::Granted
        } else {
            AccessStatus::Denied
        };
        match status {
            AccessStatus::Granted => info!("event=directory_access module=directory status=granted"),
            _ => warn!("event=directory_access module=directory status=denied"),
        }
        Ok(status)
    }

    fn lock_access(&self) -> DirectoryResult<std::sync::MutexGuard<'_, AccessStatus>> {
        self.access
            .lock()
            .map_err(|_| DirectoryError::Unavailable("access lock poisoned".to_string()))
    }
}

impl std::fmt::Debug for DirectoryClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryClient")
            .field("access", &self.access_status())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::{AccessStatus, DirectoryClient, DirectoryError, InMemoryDirectory};
    use crate::model::directory::ContactSummary;
    use std::sync::Arc;

    fn summary(id: &str) -> ContactSummary {
        ContactSummary {
            id: id.to_string(),
            name: format!("Contact {id}"),
            phone_number: None,
            birthday: None,
            note: String::new(),
        }
    }

    #[test]
    fn reads_fail_before_access_is_requested() {
        let directory = Arc::new(InMemoryDirectory::new());
        directory.add_contact(summary("c1"), &[]);
        let client = DirectoryClient::new(directory);

        assert_eq!(
            client.list_all_contacts().unwrap_err(),
            DirectoryError::PermissionDenied
        );
        assert_eq!(client.ensure_access().unwrap(), AccessStatus::Granted);
        assert_eq!(client.list_all_contacts().unwrap().len(), 1);
    }

    #[test]
    fn ensure_access_asks_provider_once() {
        let directory = Arc::new(InMemoryDirectory::new());
        directory.set_access_granted(false);
        let client = DirectoryClient::new(directory.clone());

        assert_eq!(client.ensure_access().unwrap(), AccessStatus::Denied);
        directory.set_access_granted(true);
        assert_eq!(client.ensure_access().unwrap(), AccessStatus::Denied);
        assert_eq!(directory.access_requests(), 1);

        assert_eq!(client.request_access().unwrap(), AccessStatus::Granted);
        assert_eq!(directory.access_requests(), 2);
    }

    #[test]
    fn blank_note_is_rejected_before_access_check() {
        let client = DirectoryClient::new(Arc::new(InMemoryDirectory::new()));
        assert_eq!(
            client.append_note("c1", "  \n").unwrap_err(),
            DirectoryError::EmptyInput
        );
    }

    #[test]
    fn unknown_contact_is_not_found() {
        let client = DirectoryClient::new(Arc::new(InMemoryDirectory::new()));
        client.request_access().unwrap();
        assert_eq!(
            client.fetch_contact("missing").unwrap_err(),
            DirectoryError::NotFound("missing".to_string())
        );
        assert_eq!(
            client.append_note("missing", "hi").unwrap_err(),
            DirectoryError::NotFound("missing".to_string())
        );
    }
}
