//! Concurrent keyed storage shared by every repository.

use std::fmt::Display;
use std::hash::Hash;

use dashmap::DashMap;
use minerhub_domain::error::{MinerHubError, NotFoundError};
use tracing::warn;

pub(crate) struct Table<K, V> {
    entity: &'static str,
    rows: DashMap<K, V>,
}

impl<K, V> Table<K, V>
where
    K: Eq + Hash + Copy + Display,
    V: Clone,
{
    pub(crate) fn new(entity: &'static str) -> Self {
        Self {
            entity,
            rows: DashMap::new(),
        }
    }

    /// Store `value`, replacing any previous entry with the same id.
    pub(crate) fn insert(&self, id: K, value: V) {
        if self.rows.insert(id, value).is_some() {
            warn!(entity = self.entity, %id, "replaced existing entry");
        }
    }

    pub(crate) fn get(&self, id: &K) -> Option<V> {
        self.rows.get(id).map(|row| row.value().clone())
    }

    /// Every entry, ordered by `name`.
    pub(crate) fn all(&self, name: fn(&V) -> &str) -> Vec<V> {
        let mut values: Vec<V> = self.rows.iter().map(|row| row.value().clone()).collect();
        values.sort_by(|a, b| name(a).cmp(name(b)));
        values
    }

    /// Overwrite an existing entry.
    pub(crate) fn replace(&self, id: K, value: V) -> Result<(), MinerHubError> {
        let Some(mut row) = self.rows.get_mut(&id) else {
            return Err(NotFoundError {
                entity: self.entity,
                id: id.to_string(),
            }
            .into());
        };
        *row = value;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name<'a>(value: &'a (u8, &'static str)) -> &'a str {
        value.1
    }

    #[test]
    fn should_return_entries_sorted_by_name() {
        let table = Table::new("Thing");
        table.insert(1, (1, "zeta"));
        table.insert(2, (2, "alpha"));
        let names: Vec<_> = table.all(name).into_iter().map(|v| v.1).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn should_overwrite_on_duplicate_insert() {
        let table = Table::new("Thing");
        table.insert(1, (1, "old"));
        table.insert(1, (1, "new"));
        assert_eq!(table.get(&1), Some((1, "new")));
    }

    #[test]
    fn should_return_not_found_when_replacing_missing_entry() {
        let table: Table<u8, (u8, &str)> = Table::new("Thing");
        let result = table.replace(7, (7, "ghost"));
        assert!(matches!(
            result,
            Err(MinerHubError::NotFound(NotFoundError { entity: "Thing", ref id })) if id == "7"
        ));
    }
}
