//! Name -> position lookup shared by both schema models.

use crate::error::{ModelError, Result};
use indexmap::IndexMap;

/// Position of an entity (or relation) inside the owning model's storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(pub usize);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityIndex {
    lookup: IndexMap<String, EntityId>,
}

impl EntityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` at the next free position. Fails if the name is taken.
    pub fn insert(&mut self, kind: &'static str, name: &str) -> Result<EntityId> {
        if self.lookup.contains_key(name) {
            return Err(ModelError::DuplicateName {
                kind,
                name: name.to_string(),
            });
        }
        let id = EntityId(self.lookup.len());
        self.lookup.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn get(&self, name: &str) -> Option<EntityId> {
        self.lookup.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup.contains_key(name)
    }

    /// Like [`get`](Self::get), but an absent name is an `UnresolvedReference`.
    pub fn resolve(&self, name: &str, context: impl FnOnce() -> String) -> Result<EntityId> {
        self.get(name).ok_or_else(|| ModelError::UnresolvedReference {
            context: context(),
            name: name.to_string(),
        })
    }

    /// Names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.lookup.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }
}
