//! World objects as capability-tagged variants
//!
//! An `Entity` is a snapshot handle fetched from the world for one tick.
//! Code that holds entities across ticks must re-resolve them by id.

use crate::cache::Identified;
use crate::core::constants::{LAB_ENERGY_CAPACITY, LAB_MINERAL_CAPACITY};
use crate::core::types::{ObjectId, Position};
use crate::world::resources::ResourceType;
use crate::world::store::Store;
use serde::{Deserialize, Serialize};

/// Lab internals: one mineral slot plus an energy slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabState {
    pub mineral: Option<ResourceType>,
    pub mineral_amount: u32,
    pub mineral_capacity: u32,
    pub energy: u32,
    pub energy_capacity: u32,
    pub cooldown: u32,
}

impl Default for LabState {
    fn default() -> Self {
        Self {
            mineral: None,
            mineral_amount: 0,
            mineral_capacity: LAB_MINERAL_CAPACITY,
            energy: 0,
            energy_capacity: LAB_ENERGY_CAPACITY,
            cooldown: 0,
        }
    }
}

impl LabState {
    pub fn with_mineral(mut self, mineral: ResourceType, amount: u32) -> Self {
        self.mineral = Some(mineral);
        self.mineral_amount = amount;
        self
    }

    pub fn with_energy(mut self, energy: u32) -> Self {
        self.energy = energy;
        self
    }

    pub fn is_full(&self) -> bool {
        self.mineral_capacity > 0 && self.mineral_amount >= self.mineral_capacity
    }

    /// Holds something other than `expected`
    pub fn holds_other_than(&self, expected: ResourceType) -> bool {
        self.mineral_amount > 0 && self.mineral != Some(expected)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityKind {
    Container { store: Store },
    Storage { store: Store },
    Terminal { store: Store },
    Link { energy: u32, capacity: u32 },
    Dropped { resource: ResourceType, amount: u32 },
    Lab(LabState),
    Source { energy: u32, capacity: u32 },
    Road { hits: u32, hits_max: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: ObjectId,
    pub pos: Position,
    pub kind: EntityKind,
}

impl Identified for Entity {
    fn id(&self) -> ObjectId {
        self.id
    }
}

impl Entity {
    pub fn new(id: ObjectId, pos: Position, kind: EntityKind) -> Self {
        Self { id, pos, kind }
    }

    pub fn store(&self) -> Option<&Store> {
        match &self.kind {
            EntityKind::Container { store }
            | EntityKind::Storage { store }
            | EntityKind::Terminal { store } => Some(store),
            _ => None,
        }
    }

    pub fn as_lab(&self) -> Option<&LabState> {
        match &self.kind {
            EntityKind::Lab(lab) => Some(lab),
            _ => None,
        }
    }

    pub fn is_lab(&self) -> bool {
        matches!(self.kind, EntityKind::Lab(_))
    }

    pub fn is_dropped(&self) -> bool {
        matches!(self.kind, EntityKind::Dropped { .. })
    }

    /// Amount of `resource` currently held
    pub fn amount_of(&self, resource: ResourceType) -> u32 {
        match &self.kind {
            EntityKind::Container { store }
            | EntityKind::Storage { store }
            | EntityKind::Terminal { store } => store.get(resource),
            EntityKind::Link { energy, .. } | EntityKind::Source { energy, .. } => {
                if resource == ResourceType::Energy {
                    *energy
                } else {
                    0
                }
            }
            EntityKind::Dropped {
                resource: dropped,
                amount,
            } => {
                if *dropped == resource {
                    *amount
                } else {
                    0
                }
            }
            EntityKind::Lab(lab) => {
                if resource == ResourceType::Energy {
                    lab.energy
                } else if lab.mineral == Some(resource) {
                    lab.mineral_amount
                } else {
                    0
                }
            }
            EntityKind::Road { .. } => 0,
        }
    }

    /// Room left for `resource`
    pub fn free_capacity(&self, resource: ResourceType) -> u32 {
        match &self.kind {
            EntityKind::Container { store }
            | EntityKind::Storage { store }
            | EntityKind::Terminal { store } => store.free_capacity(),
            EntityKind::Link { energy, capacity } => {
                if resource == ResourceType::Energy {
                    capacity.saturating_sub(*energy)
                } else {
                    0
                }
            }
            EntityKind::Lab(lab) => {
                if resource == ResourceType::Energy {
                    lab.energy_capacity.saturating_sub(lab.energy)
                } else if lab.mineral.is_none() || lab.mineral == Some(resource) {
                    lab.mineral_capacity.saturating_sub(lab.mineral_amount)
                } else {
                    0
                }
            }
            EntityKind::Dropped { .. } | EntityKind::Source { .. } | EntityKind::Road { .. } => 0,
        }
    }

    /// Whether an agent can draw energy from this object
    pub fn is_rechargeable(&self) -> bool {
        match &self.kind {
            EntityKind::Container { .. }
            | EntityKind::Storage { .. }
            | EntityKind::Terminal { .. }
            | EntityKind::Link { .. } => true,
            EntityKind::Dropped { resource, .. } => *resource == ResourceType::Energy,
            _ => false,
        }
    }

    pub fn hits(&self) -> Option<(u32, u32)> {
        match &self.kind {
            EntityKind::Road { hits, hits_max } => Some((*hits, *hits_max)),
            _ => None,
        }
    }
}
