//! User-defined display order for directory groups.
//!
//! # Responsibility
//! - Persist the ordered list of group ids under one settings key.
//! - Sort freshly fetched groups by that stored order.
//!
//! # Invariants
//! - The stored list is replaced as a whole; the last write wins.
//! - Groups missing from the stored order keep directory order and sort
//!   after every known group.

use crate::directory::{DirectoryClient, DirectoryError};
use crate::model::directory::GroupDescriptor;
use crate::settings::{SettingsError, SettingsResult, SettingsStore};
use log::{info, warn};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Settings key holding the ordered group ids.
pub const GROUP_ORDER_KEY: &str = "group_order";

#[derive(Debug)]
pub enum GroupOrderError {
    Directory(DirectoryError),
    Settings(SettingsError),
}

impl Display for GroupOrderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Directory(err) => write!(f, "{err}"),
            Self::Settings(err) => write!(f, "{err}"),
        }
    }
}

impl Error for GroupOrderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Directory(err) => Some(err),
            Self::Settings(err) => Some(err),
        }
    }
}

impl From<DirectoryError> for GroupOrderError {
    fn from(value: DirectoryError) -> Self {
        Self::Directory(value)
    }
}

impl From<SettingsError> for GroupOrderError {
    fn from(value: SettingsError) -> Self {
        Self::Settings(value)
    }
}

pub struct GroupOrderStore {
    settings: Arc<dyn SettingsStore>,
}

impl GroupOrderStore {
    pub fn new(settings: Arc<dyn SettingsStore>) -> Self {
        Self { settings }
    }

    /// Persists the full ordered sequence of group ids.
    ///
    /// Callers may drop the result; failures are already logged.
    pub fn reorder(&self, new_order: &[String]) -> SettingsResult<()> {
        self.settings
            .set_string_list(GROUP_ORDER_KEY, new_order)
            .inspect(|()| {
                info!(
                    "event=group_reorder module=group_order status=ok groups={}",
                    new_order.len()
                )
            })
            .inspect_err(|err| {
                warn!(
                    "event=group_reorder module=group_order status=error error={}",
                    err
                )
            })
    }

    /// Stored order, empty when the user never reordered.
    pub fn stored_order(&self) -> SettingsResult<Vec<String>> {
        Ok(self
            .settings
            .string_list(GROUP_ORDER_KEY)?
            .unwrap_or_default())
    }

    /// Sorts `candidates` by the stored order.
    pub fn resolve_order(
        &self,
        candidates: Vec<GroupDescriptor>,
    ) -> SettingsResult<Vec<GroupDescriptor>> {
        let order = self.stored_order()?;
        Ok(sort_by_stored_order(candidates, &order, |group| group.id.as_str()))
    }

    /// Refetches the directory groups and returns them in display order.
    pub fn ordered_groups(
        &self,
        directory: &DirectoryClient,
    ) -> Result<Vec<GroupDescriptor>, GroupOrderError> {
        let groups = directory.list_groups()?;
        Ok(self.resolve_order(groups)?)
    }
}

/// Orders items by the position of their id in `order`.
///
/// Ids absent from `order` sort last, keeping their input order. When an id
/// appears more than once in `order`, its first position counts.
pub fn sort_by_stored_order<T>(
    mut items: Vec<T>,
    order: &[String],
    id_of: impl Fn(&T) -> &str,
) -> Vec<T> {
    let mut positions: HashMap<&str, usize> = HashMap::with_capacity(order.len());
    for (index, id) in order.iter().enumerate() {
        positions.entry(id.as_str()).or_insert(index);
    }
    items.sort_by_key(|item| positions.get(id_of(item)).copied().unwrap_or(usize::MAX));
    items
}

#[cfg(test)]
mod tests {
    use super::sort_by_stored_order;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn unknown_ids_keep_relative_order_after_known_ones() {
        let sorted = sort_by_stored_order(ids(&["x", "a", "y", "b"]), &ids(&["b", "a"]), |s| s.as_str());
        assert_eq!(sorted, ids(&["b", "a", "x", "y"]));
    }

    #[test]
    fn duplicate_stored_ids_use_first_position() {
        let sorted = sort_by_stored_order(ids(&["a", "b"]), &ids(&["b", "a", "b"]), |s| s.as_str());
        assert_eq!(sorted, ids(&["b", "a"]));
    }

    #[test]
    fn empty_order_is_identity() {
        let sorted = sort_by_stored_order(ids(&["c", "a"]), &[], |s| s.as_str());
        assert_eq!(sorted, ids(&["c", "a"]));
    }
}
