//! Lightweight key/value settings store.
//!
//! # Responsibility
//! - Persist small user preferences outside the contact cache.
//! - Offer a JSON-file store for the app and an in-memory one for tests.
//!
//! # Invariants
//! - Writes are serialized per store; the last completed write wins.
//! - The settings file is replaced atomically (temp file + rename), so a
//!   crashed write never leaves a truncated file behind.

use log::{error, info};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub type SettingsResult<T> = Result<T, SettingsError>;

#[derive(Debug)]
pub enum SettingsError {
    Io(std::io::Error),
    Json(serde_json::Error),
    /// Stored value exists but has a different shape than requested.
    TypeMismatch(String),
    LockPoisoned,
}

impl Display for SettingsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "settings io failed: {err}"),
            Self::Json(err) => write!(f, "settings file is not valid json: {err}"),
            Self::TypeMismatch(key) => write!(f, "settings key `{key}` has unexpected type"),
            Self::LockPoisoned => write!(f, "settings lock poisoned"),
        }
    }
}

impl Error for SettingsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::TypeMismatch(_) | Self::LockPoisoned => None,
        }
    }
}

impl From<std::io::Error> for SettingsError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Minimal settings contract: named keys holding ordered string lists.
pub trait SettingsStore: Send + Sync {
    fn string_list(&self, key: &str) -> SettingsResult<Option<Vec<String>>>;
    fn set_string_list(&self, key: &str, values: &[String]) -> SettingsResult<()>;
    fn remove(&self, key: &str) -> SettingsResult<()>;
}

/// Settings persisted as one JSON object on disk.
#[derive(Debug)]
pub struct JsonFileSettings {
    path: PathBuf,
    values: Mutex<Map<String, Value>>,
}

impl JsonFileSettings {
    /// Loads the settings file, starting empty when it does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> SettingsResult<Self> {
        let path = path.as_ref().to_path_buf();
        let values = match std::fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => Map::new(),
            Ok(text) => serde_json::from_str::<Map<String, Value>>(&text)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(err) => return Err(err.into()),
        };
        info!(
            "event=settings_open module=settings status=ok keys={}",
            values.len()
        );
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn mutate(&self, apply: impl FnOnce(&mut Map<String, Value>)) -> SettingsResult<()> {
        let mut values = self.values.lock().map_err(|_| SettingsError::LockPoisoned)?;
        let mut next = values.clone();
        apply(&mut next);
        write_atomically(&self.path, &next).inspect_err(|err| {
            error!(
                "event=settings_write module=settings status=error error={}",
                err
            );
        })?;
        *values = next;
        Ok(())
    }
}

impl SettingsStore for JsonFileSettings {
    fn string_list(&self, key: &str) -> SettingsResult<Option<Vec<String>>> {
        let values = self.values.lock().map_err(|_| SettingsError::LockPoisoned)?;
        values.get(key).map(|value| decode_string_list(key, value)).transpose()
    }

    fn set_string_list(&self, key: &str, list: &[String]) -> SettingsResult<()> {
        let encoded = Value::from(list.to_vec());
        self.mutate(|values| {
            values.insert(key.to_string(), encoded);
        })
    }

    fn remove(&self, key: &str) -> SettingsResult<()> {
        self.mutate(|values| {
            values.remove(key);
        })
    }
}

/// Non-persistent settings, for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemorySettings {
    values: Mutex<Map<String, Value>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettings {
    fn string_list(&self, key: &str) -> SettingsResult<Option<Vec<String>>> {
        let values = self.values.lock().map_err(|_| SettingsError::LockPoisoned)?;
        values.get(key).map(|value| decode_string_list(key, value)).transpose()
    }

    fn set_string_list(&self, key: &str, list: &[String]) -> SettingsResult<()> {
        let mut values = self.values.lock().map_err(|_| SettingsError::LockPoisoned)?;
        values.insert(key.to_string(), Value::from(list.to_vec()));
        Ok(())
    }

    fn remove(&self, key: &str) -> SettingsResult<()> {
        let mut values = self.values.lock().map_err(|_| SettingsError::LockPoisoned)?;
        values.remove(key);
        Ok(())
    }
}

fn decode_string_list(key: &str, value: &Value) -> SettingsResult<Vec<String>> {
    let items = value
        .as_array()
        .ok_or_else(|| SettingsError::TypeMismatch(key.to_string()))?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| SettingsError::TypeMismatch(key.to_string()))
        })
        .collect()
}

fn write_atomically(path: &Path, values: &Map<String, Value>) -> SettingsResult<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    let bytes = serde_json::to_vec_pretty(values)?;
    std::fs::write(&tmp_path, bytes)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{JsonFileSettings, MemorySettings, SettingsError, SettingsStore};

    #[test]
    fn json_settings_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let settings = JsonFileSettings::open(&path).unwrap();
        assert_eq!(settings.string_list("group_order").unwrap(), None);
        settings
            .set_string_list("group_order", &["b".to_string(), "a".to_string()])
            .unwrap();
        drop(settings);

        let reopened = JsonFileSettings::open(&path).unwrap();
        assert_eq!(
            reopened.string_list("group_order").unwrap(),
            Some(vec!["b".to_string(), "a".to_string()])
        );
    }

    #[test]
    fn wrong_shape_is_reported_not_coerced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"group_order": "a,b"}"#).unwrap();

        let settings = JsonFileSettings::open(&path).unwrap();
        assert!(matches!(
            settings.string_list("group_order"),
            Err(SettingsError::TypeMismatch(_))
        ));
    }

    #[test]
    fn memory_settings_remove_clears_key() {
        let settings = MemorySettings::new();
        settings.set_string_list("k", &["x".to_string()]).unwrap();
        settings.remove("k").unwrap();
        assert_eq!(settings.string_list("k").unwrap(), None);
    }
}
