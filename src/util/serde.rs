//! Serializable identifiers shared across the crate.

use serde::{Deserialize, Serialize};

/// Identifier assigned to a raw item by the queue store.
pub type ItemId = u64;

/// Reference to an entity living outside this subsystem (the subscription
/// target or source).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    /// Entity type machine name, e.g. `node` or `taxonomy_term`.
    pub entity_type: String,
    /// Entity identifier.
    pub id: u64,
}

impl EntityRef {
    /// Build a reference from its parts.
    pub fn new(entity_type: impl Into<String>, id: u64) -> Self {
        Self {
            entity_type: entity_type.into(),
            id,
        }
    }
}

impl std::fmt::Display for EntityRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.entity_type, self.id)
    }
}
