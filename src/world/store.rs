//! Store - resource holdings of a structure, an agent, or a whole colony

use crate::world::resources::ResourceType;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Resources held against a shared total capacity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Store {
    contents: AHashMap<ResourceType, u32>,
    capacity: u32,
}

impl Store {
    pub fn new(capacity: u32) -> Self {
        Self {
            contents: AHashMap::new(),
            capacity,
        }
    }

    /// A store with no practical capacity limit, used for aggregate holdings
    pub fn unbounded() -> Self {
        Self::new(u32::MAX)
    }

    /// Builder-style insertion of an initial amount
    pub fn with(mut self, resource: ResourceType, amount: u32) -> Self {
        self.add(resource, amount);
        self
    }

    /// Get current amount of a resource
    pub fn get(&self, resource: ResourceType) -> u32 {
        self.contents.get(&resource).copied().unwrap_or(0)
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Total amount held across all resources
    pub fn used(&self) -> u32 {
        self.contents
            .values()
            .fold(0u32, |acc, amount| acc.saturating_add(*amount))
    }

    pub fn free_capacity(&self) -> u32 {
        self.capacity.saturating_sub(self.used())
    }

    pub fn is_empty(&self) -> bool {
        self.used() == 0
    }

    /// Try to add resources, returns amount actually added
    pub fn add(&mut self, resource: ResourceType, amount: u32) -> u32 {
        let added = amount.min(self.free_capacity());
        if added > 0 {
            *self.contents.entry(resource).or_insert(0) += added;
        }
        added
    }

    /// Try to remove resources, returns amount actually removed
    pub fn remove(&mut self, resource: ResourceType, amount: u32) -> u32 {
        let Some(current) = self.contents.get_mut(&resource) else {
            return 0;
        };
        let removed = amount.min(*current);
        *current -= removed;
        if *current == 0 {
            self.contents.remove(&resource);
        }
        removed
    }

    /// Check if the store has enough of all required materials
    pub fn has_materials(&self, requirements: &[(ResourceType, u32)]) -> bool {
        requirements.iter().all(|(res, amount)| self.get(*res) >= *amount)
    }

    /// Add every resource of another store, ignoring this store's capacity
    pub fn absorb(&mut self, other: &Store) {
        for (resource, amount) in other.iter() {
            let entry = self.contents.entry(resource).or_insert(0);
            *entry = entry.saturating_add(amount);
        }
    }

    /// Non-empty resources, in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = (ResourceType, u32)> + '_ {
        self.contents
            .iter()
            .filter(|(_, amount)| **amount > 0)
            .map(|(res, amount)| (*res, *amount))
    }
}
