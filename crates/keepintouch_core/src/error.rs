//! Caller-facing classification of core failures.
//!
//! Every layer keeps its own error enum; `ErrorKind` is the coarse category
//! the presentation layer branches on.

use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Directory access refused. Not retried automatically.
    PermissionDenied,
    /// Contact or record missing. Caller should refresh its view.
    NotFound,
    /// Blank input rejected before any external call.
    EmptyInput,
    /// Cache or settings read/write failed; prior state is intact.
    StorageFailure,
    /// Schema upgrade failed.
    MigrationFailure,
    /// Lock poisoning or worker startup failure.
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PermissionDenied => "permission_denied",
            Self::NotFound => "not_found",
            Self::EmptyInput => "empty_input",
            Self::StorageFailure => "storage_failure",
            Self::MigrationFailure => "migration_failure",
            Self::Internal => "internal",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl crate::db::DbError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::LockPoisoned => ErrorKind::Internal,
            _ if self.is_migration_failure() => ErrorKind::MigrationFailure,
            Self::ResetFailed { .. } => ErrorKind::MigrationFailure,
            _ => ErrorKind::StorageFailure,
        }
    }
}

impl crate::repo::contact_repo::RepoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Db(err) => err.kind(),
            Self::Validation(_) | Self::InvalidData(_) => ErrorKind::StorageFailure,
        }
    }
}

impl crate::directory::DirectoryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PermissionDenied => ErrorKind::PermissionDenied,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::EmptyInput => ErrorKind::EmptyInput,
            Self::Unavailable(_) => ErrorKind::StorageFailure,
        }
    }
}

impl crate::settings::SettingsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::LockPoisoned => ErrorKind::Internal,
            Self::Io(_) | Self::Json(_) | Self::TypeMismatch(_) => ErrorKind::StorageFailure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorKind;
    use crate::db::DbError;
    use crate::directory::DirectoryError;
    use crate::repo::contact_repo::RepoError;
    use uuid::Uuid;

    #[test]
    fn kinds_keep_permission_not_found_and_validation_apart() {
        assert_eq!(
            DirectoryError::PermissionDenied.kind(),
            ErrorKind::PermissionDenied
        );
        assert_eq!(
            DirectoryError::NotFound("x".to_string()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(DirectoryError::EmptyInput.kind(), ErrorKind::EmptyInput);
        assert_eq!(RepoError::NotFound(Uuid::nil()).kind(), ErrorKind::NotFound);
    }

    #[test]
    fn newer_schema_is_a_migration_failure() {
        let err = DbError::UnsupportedSchemaVersion {
            db_version: 9,
            latest_supported: 2,
        };
        assert_eq!(err.kind(), ErrorKind::MigrationFailure);
        assert_eq!(RepoError::Db(err).kind(), ErrorKind::MigrationFailure);
    }
}
