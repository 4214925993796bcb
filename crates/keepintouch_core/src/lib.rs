//! Core domain logic for KeepInTouch.
//! This crate is the single source of truth for contact cache invariants.

pub mod config;
pub mod context;
pub mod db;
pub mod directory;
pub mod error;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod settings;
pub mod sync;

pub use config::{ConfigError, CoreConfig};
pub use context::{ContextError, CoreContext};
pub use directory::{
    AccessStatus, ContactDirectory, DirectoryClient, DirectoryError, DirectorySnapshot,
    InMemoryDirectory,
};
pub use error::ErrorKind;
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::contact::{Birthday, ContactId, ContactRecord, ContactValidationError, ReminderGroup};
pub use model::directory::{ContactSummary, GroupDescriptor};
pub use model::note::NoteEntry;
pub use repo::contact_repo::{ContactRepository, RepoError, RepoResult, SqliteContactRepository};
pub use service::birthday_index::{month_view, zodiac_sign, BirthdayEntry, ZodiacSign};
pub use service::group_order::{GroupOrderError, GroupOrderStore};
pub use service::note_journal::{JournalError, NoteJournal};
pub use settings::{JsonFileSettings, MemorySettings, SettingsError, SettingsStore};
pub use sync::engine::{ImportOutcome, ImportState, SyncEngine, SyncError, SyncResult};
pub use sync::events::{ContactsEvent, SubscriptionId};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
