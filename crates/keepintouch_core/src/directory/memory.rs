//! In-process directory provider backed by a loadable JSON snapshot.
//!
//! Used by tests and the CLI smoke binary in place of a platform address book.

use super::{ContactDirectory, DirectoryError, DirectoryResult};
use crate::model::directory::{ContactSummary, GroupDescriptor};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

/// Serialized directory export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectorySnapshot {
    #[serde(default = "default_access_granted")]
    pub access_granted: bool,
    #[serde(default)]
    pub groups: Vec<SnapshotGroup>,
    #[serde(default)]
    pub contacts: Vec<ContactSummary>,
}

/// Group entry of a snapshot with its member contact ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub members: Vec<String>,
}

fn default_access_granted() -> bool {
    true
}

/// Thread-safe in-memory `ContactDirectory`.
#[derive(Debug)]
pub struct InMemoryDirectory {
    state: RwLock<DirectorySnapshot>,
    access_requests: AtomicUsize,
}

impl Default for InMemoryDirectory {
    fn default() -> Self {
        Self::from_snapshot(DirectorySnapshot {
            access_granted: true,
            ..DirectorySnapshot::default()
        })
    }
}

impl InMemoryDirectory {
    /// Empty directory that grants access.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: DirectorySnapshot) -> Self {
        Self {
            state: RwLock::new(snapshot),
            access_requests: AtomicUsize::new(0),
        }
    }

    /// Parses a JSON directory export.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::from_snapshot(serde_json::from_str(text)?))
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> DirectorySnapshot {
        self.read(|state| state.clone())
    }

    pub fn set_access_granted(&self, granted: bool) {
        self.write(|state| state.access_granted = granted);
    }

    /// Number of times access was requested from this provider.
    pub fn access_requests(&self) -> usize {
        self.access_requests.load(Ordering::SeqCst)
    }

    pub fn add_group(&self, group: GroupDescriptor) {
        self.write(|state| {
            state.groups.push(SnapshotGroup {
                id: group.id,
                name: group.name,
                members: Vec::new(),
            })
        });
    }

    /// Adds a contact and makes it a member of the listed groups.
    pub fn add_contact(&self, contact: ContactSummary, group_ids: &[&str]) {
        self.write(|state| {
            for group in state
                .groups
                .iter_mut()
                .filter(|group| group_ids.contains(&group.id.as_str()))
            {
                group.members.push(contact.id.clone());
            }
            state.contacts.push(contact);
        });
    }

    /// Applies an external edit to one contact, as the user would in the
    /// platform address book. Returns `false` for an unknown id.
    pub fn edit_contact(&self, id: &str, edit: impl FnOnce(&mut ContactSummary)) -> bool {
        self.write(|state| match state.contacts.iter_mut().find(|c| c.id == id) {
            Some(contact) => {
                edit(contact);
                true
            }
            None => false,
        })
    }

    fn read<T>(&self, f: impl FnOnce(&DirectorySnapshot) -> T) -> T {
        match self.state.read() {
            Ok(guard) => f(&guard),
            Err(poisoned) => f(&poisoned.into_inner()),
        }
    }

    fn write<T>(&self, f: impl FnOnce(&mut DirectorySnapshot) -> T) -> T {
        match self.state.write() {
            Ok(mut guard) => f(&mut guard),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }
}

impl ContactDirectory for InMemoryDirectory {
    fn request_access(&self) -> DirectoryResult<bool> {
        self.access_requests.fetch_add(1, Ordering::SeqCst);
        Ok(self.read(|state| state.access_granted))
    }

    fn groups(&self) -> DirectoryResult<Vec<GroupDescriptor>> {
        Ok(self.read(|state| {
            state
                .groups
                .iter()
                .map(|group| GroupDescriptor::new(group.id.clone(), group.name.clone()))
                .collect()
        }))
    }

    fn contacts(&self) -> DirectoryResult<Vec<ContactSummary>> {
        Ok(self.read(|state| state.contacts.clone()))
    }

    fn contacts_in_group(&self, group_id: &str) -> DirectoryResult<Vec<ContactSummary>> {
        self.read(|state| {
            let group = state
                .groups
                .iter()
                .find(|group| group.id == group_id)
                .ok_or_else(|| DirectoryError::NotFound(group_id.to_string()))?;
            Ok(group
                .members
                .iter()
                .filter_map(|member| state.contacts.iter().find(|c| &c.id == member))
                .cloned()
                .collect())
        })
    }

    fn contact(&self, id: &str) -> DirectoryResult<Option<ContactSummary>> {
        Ok(self.read(|state| state.contacts.iter().find(|c| c.id == id).cloned()))
    }

    fn write_note(&self, id: &str, note: &str) -> DirectoryResult<()> {
        let found = self.edit_contact(id, |contact| contact.note = note.to_string());
        if found {
            Ok(())
        } else {
            Err(DirectoryError::NotFound(id.to_string()))
        }
    }
}
