use crate::spec::types::hw::Addr;
use derive_more::Constructor;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Constructor)]
pub struct Label {
    pub name: String,
    pub addr: Addr,
}

/// Label names are case-sensitive and unscoped. Once recorded, a label is never
/// redefined: the first definition of a name wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelTable {
    labels: HashMap<String, Addr>,
}

impl LabelTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` (leaving the table untouched) if `name` was already defined.
    pub fn define(&mut self, name: &str, addr: Addr) -> bool {
        match self.labels.entry(name.to_owned()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(v) => {
                v.insert(addr);
                true
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Addr> {
        self.labels.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.labels.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// All labels, ordered by address (then name, for labels sharing an address).
    pub fn sorted(&self) -> Vec<Label> {
        let mut labels: Vec<Label> = self
            .labels
            .iter()
            .map(|(name, addr)| Label::new(name.clone(), *addr))
            .collect();
        labels.sort_unstable_by(|a, b| (a.addr, &a.name).cmp(&(b.addr, &b.name)));
        labels
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn first_definition_wins() {
        let mut labels = LabelTable::new();
        assert!(labels.define("loop", 4));
        assert!(!labels.define("loop", 10));
        assert_eq!(labels.get("loop"), Some(4));
        assert_eq!(labels.get("LOOP"), None);
        assert_eq!(labels.len(), 1);
    }

    #[test]
    fn sorted_by_address() {
        let mut labels = LabelTable::new();
        labels.define("end", 8);
        labels.define("start", 0);
        labels.define("also_start", 0);
        assert_eq!(
            labels.sorted(),
            vec![
                Label::new("also_start".to_owned(), 0),
                Label::new("start".to_owned(), 0),
                Label::new("end".to_owned(), 8),
            ]
        );
    }
}
