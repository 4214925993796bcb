//! Process-wide wiring of stores, directory client and services.
//!
//! # Responsibility
//! - Open the contact store and settings exactly once.
//! - Hand explicit references to every component that needs them.
//!
//! # Invariants
//! - All services share one `Store`, one `DirectoryClient` and one
//!   `SyncEngine`.

use crate::config::{ConfigError, CoreConfig};
use crate::db::{DbError, Store};
use crate::directory::{ContactDirectory, DirectoryClient};
use crate::error::ErrorKind;
use crate::repo::contact_repo::SqliteContactRepository;
use crate::service::group_order::GroupOrderStore;
use crate::service::note_journal::NoteJournal;
use crate::settings::{JsonFileSettings, MemorySettings, SettingsError, SettingsStore};
use crate::sync::engine::SyncEngine;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

#[derive(Debug)]
pub enum ContextError {
    Config(ConfigError),
    Io(std::io::Error),
    Db(DbError),
    Settings(SettingsError),
}

impl ContextError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Db(err) => err.kind(),
            Self::Settings(err) => err.kind(),
            Self::Config(_) | Self::Io(_) => ErrorKind::StorageFailure,
        }
    }
}

impl Display for ContextError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "failed to prepare data directory: {err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Settings(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ContextError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Settings(err) => Some(err),
        }
    }
}

impl From<ConfigError> for ContextError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<DbError> for ContextError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<SettingsError> for ContextError {
    fn from(value: SettingsError) -> Self {
        Self::Settings(value)
    }
}

/// Fully wired core, built once at process start.
pub struct CoreContext {
    store: Store,
    directory: Arc<DirectoryClient>,
    engine: Arc<SyncEngine>,
    group_order: GroupOrderStore,
    journal: NoteJournal,
}

impl CoreContext {
    /// Opens the file-backed store and settings described by `config`.
    ///
    /// # Errors
    /// - Invalid config or an uncreatable data directory.
    /// - `DbError::ResetFailed` when the store could not be recreated after a
    ///   migration failure; the caller must not continue.
    pub fn bootstrap(
        config: &CoreConfig,
        provider: Arc<dyn ContactDirectory>,
    ) -> Result<Self, ContextError> {
        config.validate()?;
        std::fs::create_dir_all(&config.data_dir).map_err(ContextError::Io)?;

        let store = Store::open(config.db_path())?;
        let settings = JsonFileSettings::open(config.settings_path())?;
        info!("event=core_bootstrap module=context status=ok mode=file");
        Ok(Self::from_parts(
            store,
            Arc::new(settings),
            Arc::new(DirectoryClient::new(provider)),
        ))
    }

    /// In-memory store and settings; nothing survives the process.
    pub fn in_memory(provider: Arc<dyn ContactDirectory>) -> Result<Self, ContextError> {
        let store = Store::open_in_memory()?;
        Ok(Self::from_parts(
            store,
            Arc::new(MemorySettings::new()),
            Arc::new(DirectoryClient::new(provider)),
        ))
    }

    /// Wires services from already-constructed parts.
    pub fn from_parts(
        store: Store,
        settings: Arc<dyn SettingsStore>,
        directory: Arc<DirectoryClient>,
    ) -> Self {
        let cache = Arc::new(SqliteContactRepository::new(store.clone()));
        let engine = Arc::new(SyncEngine::new(Arc::clone(&directory), cache));
        Self {
            store,
            directory,
            group_order: GroupOrderStore::new(settings),
            journal: NoteJournal::new(Arc::clone(&engine)),
            engine,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn directory(&self) -> &Arc<DirectoryClient> {
        &self.directory
    }

    pub fn engine(&self) -> &Arc<SyncEngine> {
        &self.engine
    }

    pub fn group_order(&self) -> &GroupOrderStore {
        &self.group_order
    }

    pub fn journal(&self) -> &NoteJournal {
        &self.journal
    }
}
