//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure connection pragmas required by core behavior.
//! - Trigger schema migrations before returning a usable connection.
//! - Destroy and recreate a file store whose schema cannot be migrated.
//!
//! # Invariants
//! - Returned connections have migrations fully applied.
//! - A reset only ever happens after a migration-class failure.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{error, info, warn};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const SIDECAR_SUFFIXES: &[&str] = &["-wal", "-shm", "-journal"];

/// Opens a SQLite database file and applies all pending migrations.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_with("file", || Connection::open(path.as_ref()))
}

/// Opens an in-memory SQLite database and applies all pending migrations.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_with("memory", Connection::open_in_memory)
}

/// Opens a database file; on a migration failure deletes the file and
/// recreates an empty store.
///
/// Losing cached rows is accepted here: the next sync re-imports them from
/// the directory. Only group assignments and local edits are lost.
///
/// # Errors
/// - Non-migration errors are returned unchanged.
/// - `DbError::ResetFailed` when deletion or recreation fails. This is fatal.
pub fn open_db_with_reset(path: impl AsRef<Path>) -> DbResult<Connection> {
    let path = path.as_ref();
    match open_db(path) {
        Ok(conn) => Ok(conn),
        Err(err) if err.is_migration_failure() => {
            warn!(
                "event=db_reset module=db status=start reason=migration_failure error={}",
                err
            );
            remove_store_files(path)?;
            open_db(path)
                .inspect(|_| info!("event=db_reset module=db status=ok data_loss=true"))
                .map_err(|reset_err| {
                    error!(
                        "event=db_reset module=db status=error error_code=db_reset_failed error={}",
                        reset_err
                    );
                    DbError::ResetFailed {
                        path: path.to_path_buf(),
                        reason: reset_err.to_string(),
                    }
                })
        }
        Err(err) => Err(err),
    }
}

fn open_with(
    mode: &'static str,
    opener: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let result = opener()
        .map_err(|err| {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_open_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            DbError::from(err)
        })
        .and_then(|mut conn| match bootstrap_connection(&mut conn) {
            Ok(()) => Ok(conn),
            Err(err) => {
                error!(
                    "event=db_open module=db status=error mode={} duration_ms={} error_code=db_bootstrap_failed error={}",
                    mode,
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        })?;

    info!(
        "event=db_open module=db status=ok mode={} duration_ms={}",
        mode,
        started_at.elapsed().as_millis()
    );
    Ok(result)
}

fn bootstrap_connection(conn: &mut Connection) -> DbResult<()> {
    conn.busy_timeout(Duration::from_secs(5))?;
    apply_migrations(conn)?;
    Ok(())
}

fn remove_store_files(path: &Path) -> DbResult<()> {
    let mut targets = vec![path.to_path_buf()];
    for suffix in SIDECAR_SUFFIXES {
        let mut sidecar = path.as_os_str().to_owned();
        sidecar.push(suffix);
        targets.push(sidecar.into());
    }

    for target in targets {
        match std::fs::remove_file(&target) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                error!(
                    "event=db_reset module=db status=error error_code=db_remove_failed error={}",
                    err
                );
                return Err(DbError::ResetFailed {
                    path: target,
                    reason: err.to_string(),
                });
            }
        }
    }
    Ok(())
}
