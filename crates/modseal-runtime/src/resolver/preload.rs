use std::collections::HashMap;

use super::{ModuleName, SearchContext, SearchOutcome, Searcher};
use crate::engine::Engine;

/// Origin reported for modules served from the preload table.
pub const PRELOAD_ORIGIN: &str = ":preload:";

/// Compiled units registered ahead of time, keyed by module name.
#[derive(Debug, Clone)]
pub struct PreloadTable<U> {
    units: HashMap<String, U>,
}

impl<U> PreloadTable<U> {
    pub fn new() -> Self {
        Self {
            units: HashMap::new(),
        }
    }

    /// Register `unit` under `name`, returning the unit it replaced.
    pub fn insert(&mut self, name: impl Into<String>, unit: U) -> Option<U> {
        self.units.insert(name.into(), unit)
    }

    pub fn get(&self, name: &str) -> Option<&U> {
        self.units.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.units.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.units.keys().cloned().collect();
        names.sort();
        names
    }
}

impl<U> Default for PreloadTable<U> {
    fn default() -> Self {
        Self::new()
    }
}

/// Serves exact-name hits from the preload table.
#[derive(Debug, Default, Clone, Copy)]
pub struct PreloadSearcher;

impl<E: Engine> Searcher<E> for PreloadSearcher {
    fn label(&self) -> &str {
        "preload"
    }

    fn search(&self, name: &ModuleName, cx: &mut SearchContext<'_, E>) -> SearchOutcome<E::Unit> {
        match cx.preload.get(name.as_str()) {
            Some(unit) => SearchOutcome::Found {
                unit: unit.clone(),
                origin: PRELOAD_ORIGIN.to_string(),
            },
            None => SearchOutcome::NotFound(format!("no preloaded module '{}'", name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_insert_replace() {
        let mut table = PreloadTable::new();
        assert!(table.is_empty());
        assert_eq!(table.insert("main", 1), None);
        assert_eq!(table.insert("main", 2), Some(1));
        assert_eq!(table.get("main"), Some(&2));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_names_sorted() {
        let mut table = PreloadTable::new();
        table.insert("ui.list", ());
        table.insert("app", ());
        assert_eq!(table.names(), vec!["app".to_string(), "ui.list".to_string()]);
        assert!(table.contains("app"));
        assert!(!table.contains("ui"));
    }
}
