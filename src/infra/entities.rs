//! In-memory entity repository.

use std::collections::HashMap;

use crate::core::{EntityRepository, TargetEntity};
use crate::util::serde::EntityRef;

/// Repository backed by a map, for tests and fixtures.
#[derive(Debug, Default)]
pub struct InMemoryEntities {
    entities: HashMap<EntityRef, TargetEntity>,
}

impl InMemoryEntities {
    /// Empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an entity.
    pub fn insert(&mut self, entity: TargetEntity) {
        self.entities.insert(entity.reference.clone(), entity);
    }

    /// Remove an entity, simulating deletion upstream.
    pub fn remove(&mut self, reference: &EntityRef) -> Option<TargetEntity> {
        self.entities.remove(reference)
    }
}

impl EntityRepository for InMemoryEntities {
    fn load(&self, reference: &EntityRef) -> Option<TargetEntity> {
        self.entities.get(reference).cloned()
    }
}
