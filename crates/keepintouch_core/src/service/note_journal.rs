//! Append-only note journal per contact.
//!
//! # Responsibility
//! - Resolve cache contact ids to directory entries.
//! - Append timestamped entries or replace the whole note field.
//!
//! # Invariants
//! - `append_entry` never reorders or drops prior content.
//! - Only `replace_all` can shrink a note, and it has no undo.
//! - Subscribers hear about a note change only after the directory
//!   confirmed it.

use crate::directory::{DirectoryClient, DirectoryError};
use crate::error::ErrorKind;
use crate::model::contact::ContactId;
use crate::model::note::{parse_entries, NoteEntry};
use crate::sync::engine::SyncEngine;
use crate::sync::events::ContactsEvent;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type JournalResult<T> = Result<T, JournalError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalError {
    EmptyInput,
    /// No cached contact, no directory link, or the directory entry is gone.
    NotFound(ContactId),
    PermissionDenied,
    Directory(DirectoryError),
}

impl JournalError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyInput => ErrorKind::EmptyInput,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::PermissionDenied => ErrorKind::PermissionDenied,
            Self::Directory(err) => err.kind(),
        }
    }

    fn from_directory(contact_id: ContactId, err: DirectoryError) -> Self {
        match err {
            DirectoryError::EmptyInput => Self::EmptyInput,
            DirectoryError::NotFound(_) => Self::NotFound(contact_id),
            DirectoryError::PermissionDenied => Self::PermissionDenied,
            other => Self::Directory(other),
        }
    }
}

impl Display for JournalError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "note text cannot be empty"),
            Self::NotFound(id) => write!(f, "no directory entry for contact {id}"),
            Self::PermissionDenied => write!(f, "contact directory access denied"),
            Self::Directory(err) => write!(f, "{err}"),
        }
    }
}

impl Error for JournalError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Directory(err) => Some(err),
            _ => None,
        }
    }
}

pub struct NoteJournal {
    engine: Arc<SyncEngine>,
}

impl NoteJournal {
    pub fn new(engine: Arc<SyncEngine>) -> Self {
        Self { engine }
    }

    /// Prepends a timestamped entry and returns the confirmed entries,
    /// newest first.
    ///
    /// The text is not stored verbatim: surrounding whitespace and blank
    /// lines inside it are removed, since a blank line ends an entry.
    /// `"a\n\nb"` is stored as `"a\nb"`.
    pub fn append_entry(&self, contact_id: ContactId, text: &str) -> JournalResult<Vec<NoteEntry>> {
        if text.trim().is_empty() {
            return Err(JournalError::EmptyInput);
        }
        let directory_id = self.directory_id(contact_id)?;
        let confirmed = self
            .directory()
            .append_note(&directory_id, text)
            .map_err(|err| JournalError::from_directory(contact_id, err))?;

        self.engine.emit(&ContactsEvent::NoteChanged { contact_id });
        Ok(parse_entries(&confirmed))
    }

    /// Overwrites the whole note. Used by explicit edit mode only.
    pub fn replace_all(&self, contact_id: ContactId, text: &str) -> JournalResult<Vec<NoteEntry>> {
        let directory_id = self.directory_id(contact_id)?;
        let confirmed = self
            .directory()
            .replace_note(&directory_id, text)
            .map_err(|err| JournalError::from_directory(contact_id, err))?;

        self.engine.emit(&ContactsEvent::NoteChanged { contact_id });
        Ok(parse_entries(&confirmed))
    }

    /// Raw note field as stored in the directory.
    pub fn note_text(&self, contact_id: ContactId) -> JournalResult<String> {
        let directory_id = self.directory_id(contact_id)?;
        self.directory()
            .fetch_contact(&directory_id)
            .map(|summary| summary.note)
            .map_err(|err| JournalError::from_directory(contact_id, err))
    }

    /// Parsed entries, newest first.
    pub fn entries(&self, contact_id: ContactId) -> JournalResult<Vec<NoteEntry>> {
        Ok(parse_entries(&self.note_text(contact_id)?))
    }

    fn directory(&self) -> &DirectoryClient {
        self.engine.directory()
    }

    fn directory_id(&self, contact_id: ContactId) -> JournalResult<String> {
        self.engine
            .directory_id_for(contact_id)
            .map_err(|_| JournalError::NotFound(contact_id))
    }
}
