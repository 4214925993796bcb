//! SQLite storage bootstrap, schema migrations and the shared store handle.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the contact cache.
//! - Apply schema migrations in deterministic order.
//! - Recover from an unusable schema by recreating the database file.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Core code must not read/write contact data before migrations succeed.
//! - Exactly one `Store` is opened per process and cloned into consumers.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod migrations;
mod open;
mod store;

pub use open::{open_db, open_db_in_memory, open_db_with_reset};
pub use store::Store;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    Migration {
        version: u32,
        source: rusqlite::Error,
    },
    /// Recreating the store after a migration failure did not succeed.
    /// Callers must treat this as fatal.
    ResetFailed {
        path: PathBuf,
        reason: String,
    },
    LockPoisoned,
}

impl DbError {
    /// Whether this failure means the on-disk schema cannot be used and the
    /// store should be destroyed and recreated.
    pub fn is_migration_failure(&self) -> bool {
        match self {
            Self::UnsupportedSchemaVersion { .. } | Self::Migration { .. } => true,
            Self::Sqlite(err) => matches!(
                err.sqlite_error_code(),
                Some(rusqlite::ErrorCode::NotADatabase) | Some(rusqlite::ErrorCode::DatabaseCorrupt)
            ),
            Self::ResetFailed { .. } | Self::LockPoisoned => false,
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::Migration { version, source } => {
                write!(f, "migration to schema version {version} failed: {source}")
            }
            Self::ResetFailed { path, reason } => write!(
                f,
                "failed to recreate contact store at `{}`: {reason}",
                path.display()
            ),
            Self::LockPoisoned => write!(f, "contact store lock poisoned"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Migration { source, .. } => Some(source),
            Self::UnsupportedSchemaVersion { .. } | Self::ResetFailed { .. } | Self::LockPoisoned => {
                None
            }
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
