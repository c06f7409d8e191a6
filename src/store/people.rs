use crate::core::party::{PersonId, PersonRole};
use crate::store::{Result, StoreError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One registered person, as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonEntry {
    pub role: PersonRole,
    pub id: PersonId,
    pub name: String,
}

/// `(role, name) -> id` registry. Ids start at 1 and are unique across roles.
#[derive(Debug, Clone)]
pub struct PeopleRegistry {
    /// Keyed by role and upper-cased trimmed name.
    by_key: HashMap<(PersonRole, String), PersonEntry>,
    next_id: PersonId,
}

impl Default for PeopleRegistry {
    fn default() -> Self {
        Self {
            by_key: HashMap::new(),
            next_id: 1,
        }
    }
}

fn key(role: PersonRole, name: &str) -> (PersonRole, String) {
    (role, name.trim().to_uppercase())
}

impl PeopleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a previously persisted entry, keeping id allocation ahead of it.
    pub fn insert(&mut self, entry: PersonEntry) {
        self.next_id = self.next_id.max(entry.id + 1);
        self.by_key.insert(key(entry.role, &entry.name), entry);
    }

    pub fn lookup(&self, role: PersonRole, name: &str) -> Option<PersonId> {
        self.by_key.get(&key(role, name)).map(|entry| entry.id)
    }

    /// The id for `(role, name)` and whether it was newly assigned.
    pub fn ensure(&mut self, role: PersonRole, name: &str) -> Result<(PersonId, bool)> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(StoreError::InvalidName(name.to_string()));
        }
        if let Some(id) = self.lookup(role, trimmed) {
            return Ok((id, false));
        }
        let entry = PersonEntry {
            role,
            id: self.next_id,
            name: trimmed.to_string(),
        };
        self.next_id += 1;
        let id = entry.id;
        self.by_key.insert(key(role, trimmed), entry);
        Ok((id, true))
    }

    /// Every entry, ordered by id.
    pub fn entries(&self) -> Vec<PersonEntry> {
        let mut entries: Vec<PersonEntry> = self.by_key.values().cloned().collect();
        entries.sort_by_key(|entry| entry.id);
        entries
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_stable_and_case_insensitive() {
        let mut registry = PeopleRegistry::new();
        let (alice, created) = registry.ensure(PersonRole::Client, "Alice").unwrap();
        assert!(created);
        assert_eq!(alice, 1);

        let (again, created) = registry.ensure(PersonRole::Client, "  aLiCe ").unwrap();
        assert!(!created);
        assert_eq!(again, alice);
    }

    #[test]
    fn test_roles_are_separate_namespaces() {
        let mut registry = PeopleRegistry::new();
        let (client, _) = registry.ensure(PersonRole::Client, "Sam").unwrap();
        let (cashier, _) = registry.ensure(PersonRole::Cashier, "Sam").unwrap();
        assert_ne!(client, cashier);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_blank_name_rejected() {
        let mut registry = PeopleRegistry::new();
        assert!(matches!(
            registry.ensure(PersonRole::Manager, "   "),
            Err(StoreError::InvalidName(_))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_insert_advances_allocation() {
        let mut registry = PeopleRegistry::new();
        registry.insert(PersonEntry {
            role: PersonRole::Manager,
            id: 41,
            name: "Mia".to_string(),
        });
        let (id, _) = registry.ensure(PersonRole::Client, "Noah").unwrap();
        assert_eq!(id, 42);
        assert_eq!(registry.lookup(PersonRole::Manager, "MIA"), Some(41));
        let ids: Vec<PersonId> = registry.entries().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![41, 42]);
    }
}
