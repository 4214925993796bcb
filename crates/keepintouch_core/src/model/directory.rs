//! Directory-side shapes. Rebuilt from the external directory on demand.

use crate::model::contact::{Birthday, BirthdayParts};
use serde::{Deserialize, Deserializer, Serialize};

/// Identifier assigned by the external directory.
pub type DirectoryContactId = String;

/// External contact group. Only its display order is ever persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupDescriptor {
    pub id: String,
    pub name: String,
}

impl GroupDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// One contact as the directory reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSummary {
    pub id: DirectoryContactId,
    pub name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    /// Placeholder years arrive as "year unknown"; impossible dates are
    /// dropped.
    #[serde(default, deserialize_with = "directory_birthday")]
    pub birthday: Option<Birthday>,
    /// Concatenated note journal text.
    #[serde(default)]
    pub note: String,
}

fn directory_birthday<'de, D>(deserializer: D) -> Result<Option<Birthday>, D::Error>
where
    D: Deserializer<'de>,
{
    let parts = Option::<BirthdayParts>::deserialize(deserializer)?;
    Ok(parts.and_then(|parts| {
        Birthday::from_directory_parts(parts.year, parts.month, parts.day).ok()
    }))
}
