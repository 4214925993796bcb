//! Sync engine: cache import, reload and mutation orchestration.
//!
//! # Responsibility
//! - Import every directory contact into an empty cache.
//! - Serve the merged contact set through `current_contacts()`.
//! - Apply cache mutations and notify subscribers once they are confirmed.
//!
//! # Invariants
//! - `fetch_all` fails with `PermissionDenied` before touching the cache
//!   when directory access is not granted.
//! - Import states move `Empty -> Importing -> Populated`. A failed import
//!   leaves `Empty` only when nothing was committed. Only one `Importing`
//!   at a time.
//! - `Populated` becomes observable only after the import wrote every row
//!   and the in-memory set was reloaded.
//! - Every single-field mutation is followed by a full reload. At personal
//!   contact-list scale this is cheap and keeps one code path for state.

use crate::directory::{AccessStatus, DirectoryClient, DirectoryError};
use crate::error::ErrorKind;
use crate::model::contact::{ContactId, ContactRecord, ReminderGroup};
use crate::repo::contact_repo::{ContactRepository, RepoError};
use crate::sync::events::{ContactsEvent, ContactsListener, SubscriptionId};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, RwLock};
use std::thread::JoinHandle;
use std::time::Instant;

pub type SyncResult<T> = Result<T, SyncError>;

#[derive(Debug)]
pub enum SyncError {
    PermissionDenied,
    NotFound(ContactId),
    Directory(DirectoryError),
    Storage(RepoError),
    /// The import this call waited on failed with `kind`; it will be
    /// retried on the next fetch.
    ImportFailed { kind: ErrorKind, reason: String },
    Internal(String),
}

impl SyncError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PermissionDenied => ErrorKind::PermissionDenied,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Directory(err) => err.kind(),
            Self::Storage(err) => err.kind(),
            Self::ImportFailed { kind, .. } => *kind,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PermissionDenied => write!(f, "contact directory access denied"),
            Self::NotFound(id) => write!(f, "contact not found: {id}"),
            Self::Directory(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "{err}"),
            Self::ImportFailed { reason, .. } => write!(f, "contact import failed: {reason}"),
            Self::Internal(reason) => write!(f, "sync engine failure: {reason}"),
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Directory(err) => Some(err),
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DirectoryError> for SyncError {
    fn from(value: DirectoryError) -> Self {
        match value {
            DirectoryError::PermissionDenied => Self::PermissionDenied,
            other => Self::Directory(other),
        }
    }
}

impl From<RepoError> for SyncError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            other => Self::Storage(other),
        }
    }
}

/// Cache import lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportState {
    Empty,
    Importing,
    Populated,
}

/// What `import_all` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOutcome {
    /// This call imported `count` contacts.
    Imported { count: usize },
    /// The cache already held a prior import.
    Skipped,
    /// Another caller's import was in flight; this call waited for it.
    Coalesced,
}

#[derive(Debug)]
struct ImportGate {
    state: ImportState,
    /// Bumped every time an import finishes, successfully or not.
    generation: u64,
    last_failure: Option<(ErrorKind, String)>,
}

/// Orchestrates the directory, the cache and the in-memory contact set.
pub struct SyncEngine {
    directory: Arc<DirectoryClient>,
    cache: Arc<dyn ContactRepository>,
    contacts: RwLock<Vec<ContactRecord>>,
    gate: Mutex<ImportGate>,
    import_finished: Condvar,
    listeners: Mutex<Vec<(SubscriptionId, ContactsListener)>>,
    next_subscription: AtomicU64,
}

impl SyncEngine {
    pub fn new(directory: Arc<DirectoryClient>, cache: Arc<dyn ContactRepository>) -> Self {
        Self {
            directory,
            cache,
            contacts: RwLock::new(Vec::new()),
            gate: Mutex::new(ImportGate {
                state: ImportState::Empty,
                generation: 0,
                last_failure: None,
            }),
            import_finished: Condvar::new(),
            listeners: Mutex::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
        }
    }

    pub fn directory(&self) -> &Arc<DirectoryClient> {
        &self.directory
    }

    /// Loads the merged contact set, importing from the directory first when
    /// the cache is empty.
    pub fn fetch_all(&self) -> SyncResult<Vec<ContactRecord>> {
        match self.import_all()? {
            ImportOutcome::Imported { .. } => Ok(self.current_contacts()),
            ImportOutcome::Skipped | ImportOutcome::Coalesced => self.reload_from_cache(),
        }
    }

    /// Imports every directory contact when the cache is empty.
    ///
    /// A no-op (`Skipped`) for a populated cache, even if the directory has
    /// changed since. Callers arriving during an import wait for it and get
    /// `Coalesced`, or its failure.
    pub fn import_all(&self) -> SyncResult<ImportOutcome> {
        self.require_access()?;

        let mut gate = self.lock_gate()?;
        if gate.state == ImportState::Importing {
            let observed = gate.generation;
            while gate.generation == observed {
                gate = self
                    .import_finished
                    .wait(gate)
                    .map_err(|_| SyncError::Internal("import gate poisoned".to_string()))?;
            }
            return match gate.last_failure.clone() {
                Some((kind, reason)) => Err(SyncError::ImportFailed { kind, reason }),
                None => Ok(ImportOutcome::Coalesced),
            };
        }

        if !self.cache.is_empty()? {
            gate.state = ImportState::Populated;
            return Ok(ImportOutcome::Skipped);
        }

        gate.state = ImportState::Importing;
        drop(gate);

        let result = self.run_import();

        let mut gate = self.lock_gate()?;
        gate.generation += 1;
        match &result {
            Ok(_) => {
                gate.state = ImportState::Populated;
                gate.last_failure = None;
            }
            Err(err) => {
                // Rows may already be committed if only the reload failed.
                gate.state = match self.cache.is_empty() {
                    Ok(false) => ImportState::Populated,
                    _ => ImportState::Empty,
                };
                gate.last_failure = Some((err.kind(), err.to_string()));
            }
        }
        drop(gate);
        self.import_finished.notify_all();

        let count = result?;
        self.emit(&ContactsEvent::Imported { count });
        Ok(ImportOutcome::Imported { count })
    }

    /// Runs `fetch_all` on a worker thread so the caller is not blocked by
    /// an import.
    pub fn spawn_fetch_all(self: &Arc<Self>) -> SyncResult<JoinHandle<SyncResult<Vec<ContactRecord>>>> {
        let engine = Arc::clone(self);
        std::thread::Builder::new()
            .name("contact-import".to_string())
            .spawn(move || engine.fetch_all())
            .map_err(|err| SyncError::Internal(format!("failed to spawn import worker: {err}")))
    }

    pub fn import_state(&self) -> ImportState {
        self.gate
            .lock()
            .map(|gate| gate.state)
            .unwrap_or(ImportState::Empty)
    }

    /// Snapshot of the merged contact set as of the last reload.
    pub fn current_contacts(&self) -> Vec<ContactRecord> {
        match self.contacts.read() {
            Ok(contacts) => contacts.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn contact(&self, id: ContactId) -> Option<ContactRecord> {
        self.read_contacts(|contacts| contacts.iter().find(|c| c.id == id).cloned())
    }

    /// Directory id of a cached contact; `NotFound` when the record is
    /// missing or was never linked to the directory.
    pub fn directory_id_for(&self, id: ContactId) -> SyncResult<String> {
        self.read_contacts(|contacts| {
            contacts
                .iter()
                .find(|c| c.id == id)
                .and_then(|c| c.directory_id.clone())
        })
        .ok_or(SyncError::NotFound(id))
    }

    /// Contacts sectioned by reminder group in display order; empty
    /// sections are omitted.
    pub fn contacts_by_group(&self) -> Vec<(ReminderGroup, Vec<ContactRecord>)> {
        let contacts = self.current_contacts();
        ReminderGroup::ALL
            .into_iter()
            .filter_map(|group| {
                let members: Vec<ContactRecord> = contacts
                    .iter()
                    .filter(|contact| contact.group == group)
                    .cloned()
                    .collect();
                (!members.is_empty()).then_some((group, members))
            })
            .collect()
    }

    /// Reassigns a contact's reminder group, then reloads everything.
    pub fn update_group(&self, contact_id: ContactId, group: ReminderGroup) -> SyncResult<()> {
        self.require_access()?;
        self.cache.update_group(contact_id, group).inspect_err(|err| {
            error!(
                "event=contact_update_group module=sync status=error error_code={} error={}",
                err.kind(),
                err
            );
        })?;
        self.fetch_all()?;
        info!(
            "event=contact_update_group module=sync status=ok group={}",
            group.as_str()
        );
        self.emit(&ContactsEvent::GroupChanged { contact_id, group });
        Ok(())
    }

    /// Applies an explicit edit to an existing cached contact.
    ///
    /// Only the cache is written; the directory entry is left untouched.
    pub fn edit_contact(&self, contact: &ContactRecord) -> SyncResult<()> {
        self.cache.update_contact(contact)?;
        self.reload_from_cache()?;
        info!("event=contact_edit module=sync status=ok");
        self.emit(&ContactsEvent::ContactEdited {
            contact_id: contact.id,
        });
        Ok(())
    }

    /// Removes a contact from the cache only. The directory keeps it.
    pub fn delete_contact(&self, contact_id: ContactId) -> SyncResult<()> {
        self.cache.delete_contact(contact_id)?;
        self.reload_from_cache()?;
        info!("event=contact_delete module=sync status=ok");
        self.emit(&ContactsEvent::ContactDeleted { contact_id });
        Ok(())
    }

    /// Registers a listener called after every confirmed mutation.
    pub fn subscribe(&self, listener: impl Fn(&ContactsEvent) + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::SeqCst));
        match self.listeners.lock() {
            Ok(mut listeners) => listeners.push((id, Arc::new(listener))),
            Err(poisoned) => poisoned.into_inner().push((id, Arc::new(listener))),
        }
        id
    }

    /// Returns whether the subscription existed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = match self.listeners.lock() {
            Ok(listeners) => listeners,
            Err(poisoned) => poisoned.into_inner(),
        };
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Notifies subscribers. Listeners run outside the registry lock so they
    /// may call back into the engine.
    pub(crate) fn emit(&self, event: &ContactsEvent) {
        let listeners: Vec<ContactsListener> = match self.listeners.lock() {
            Ok(listeners) => listeners.iter().map(|(_, l)| Arc::clone(l)).collect(),
            Err(poisoned) => poisoned
                .into_inner()
                .iter()
                .map(|(_, l)| Arc::clone(l))
                .collect(),
        };
        for listener in listeners {
            listener(event);
        }
    }

    fn run_import(&self) -> SyncResult<usize> {
        let started_at = Instant::now();
        info!("event=contact_import module=sync status=start");

        let summaries = self.directory.list_all_contacts().map_err(|err| {
            warn!(
                "event=contact_import module=sync status=error error_code=directory_enumeration_failed error={}",
                err
            );
            SyncError::from(err)
        })?;

        let records: Vec<ContactRecord> = summaries
            .iter()
            .map(|summary| {
                ContactRecord::imported(
                    summary.id.as_str(),
                    &summary.name,
                    summary.phone_number.as_deref(),
                    summary.birthday,
                )
            })
            .collect();

        let count = self.cache.create_contacts(&records).map_err(|err| {
            error!(
                "event=contact_import module=sync status=error error_code=cache_write_failed error={}",
                err
            );
            SyncError::from(err)
        })?;
        self.reload_from_cache()?;

        info!(
            "event=contact_import module=sync status=ok count={} duration_ms={}",
            count,
            started_at.elapsed().as_millis()
        );
        Ok(count)
    }

    fn reload_from_cache(&self) -> SyncResult<Vec<ContactRecord>> {
        let loaded = self.cache.list_contacts().inspect_err(|err| {
            error!(
                "event=contact_reload module=sync status=error error_code={} error={}",
                err.kind(),
                err
            );
        })?;
        match self.contacts.write() {
            Ok(mut contacts) => *contacts = loaded.clone(),
            Err(poisoned) => *poisoned.into_inner() = loaded.clone(),
        }
        Ok(loaded)
    }

    fn require_access(&self) -> SyncResult<()> {
        match self.directory.ensure_access()? {
            AccessStatus::Granted => Ok(()),
            AccessStatus::Denied | AccessStatus::NotDetermined => Err(SyncError::PermissionDenied),
        }
    }

    fn lock_gate(&self) -> SyncResult<MutexGuard<'_, ImportGate>> {
        self.gate
            .lock()
            .map_err(|_| SyncError::Internal("import gate poisoned".to_string()))
    }

    fn read_contacts<T>(&self, f: impl FnOnce(&[ContactRecord]) -> T) -> T {
        match self.contacts.read() {
            Ok(contacts) => f(&contacts),
            Err(poisoned) => f(&poisoned.into_inner()),
        }
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("import_state", &self.import_state())
            .finish_non_exhaustive()
    }
}
