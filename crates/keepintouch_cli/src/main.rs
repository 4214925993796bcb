//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `keepintouch_core` linkage.
//! - Start core file logging under the CLI data directory.
//! - Optionally run one in-memory import against a directory snapshot file
//!   and print per-group counts.

use keepintouch_core::{init_logging_from_config, CoreConfig, CoreContext, InMemoryDirectory};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

/// Overrides the directory holding the CLI's logs.
const DATA_DIR_ENV: &str = "KEEPINTOUCH_DATA_DIR";

fn main() -> ExitCode {
    println!("keepintouch_core ping={}", keepintouch_core::ping());
    println!("keepintouch_core version={}", keepintouch_core::core_version());

    let config = CoreConfig::for_data_dir(data_dir());
    match start_logging(&config) {
        Ok(log_dir) => println!("logging dir={}", log_dir.display()),
        // Logging is diagnostics only; the import still runs without it.
        Err(message) => eprintln!("logging disabled: {message}"),
    }

    let Some(snapshot_path) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };

    match import_snapshot(&snapshot_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("import failed: {message}");
            ExitCode::FAILURE
        }
    }
}

fn data_dir() -> PathBuf {
    std::env::var_os(DATA_DIR_ENV)
        .map(PathBuf::from)
        .filter(|dir| dir.is_absolute())
        .unwrap_or_else(|| std::env::temp_dir().join("keepintouch"))
}

fn start_logging(config: &CoreConfig) -> Result<PathBuf, String> {
    config.validate().map_err(|err| err.to_string())?;
    init_logging_from_config(config)?;
    Ok(config.resolved_log_dir())
}

fn import_snapshot(path: &str) -> Result<(), String> {
    let text = std::fs::read_to_string(path).map_err(|err| format!("{path}: {err}"))?;
    let directory = InMemoryDirectory::from_json(&text).map_err(|err| err.to_string())?;
    let context = CoreContext::in_memory(Arc::new(directory)).map_err(|err| err.to_string())?;

    let contacts = context.engine().fetch_all().map_err(|err| err.to_string())?;
    println!("imported contacts={}", contacts.len());
    for (group, members) in context.engine().contacts_by_group() {
        println!("group={} contacts={}", group.as_str(), members.len());
    }
    Ok(())
}
