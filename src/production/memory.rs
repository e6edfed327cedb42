//! Persisted colony memory
//!
//! Everything that must survive a restart lives here, keyed by colony name.
//! Values are stored raw (the pipeline status as a `u8`) so a corrupt file
//! still loads; the pipeline validates and repairs it on its next tick.

use crate::core::error::{CoreError, Result};
use crate::core::types::{ObjectId, Tick};
use crate::production::boosts::BoostQueues;
use crate::production::status::PipelineStatus;
use crate::world::resources::ResourceType;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::path::Path;

/// One production order: make `amount` of `product`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub product: ResourceType,
    pub amount: u32,
}

impl Reaction {
    pub fn new(product: ResourceType, amount: u32) -> Self {
        Self { product, amount }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChamberStats {
    pub total_production: BTreeMap<ResourceType, u32>,
    /// Rolling fraction of product labs busy per tick
    pub avg_usage: f64,
}

impl Default for ChamberStats {
    fn default() -> Self {
        Self {
            total_production: BTreeMap::new(),
            avg_usage: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChamberMemory {
    pub status: u8,
    pub status_tick: Tick,
    pub active_reaction: Option<Reaction>,
    pub reaction_queue: VecDeque<Reaction>,
    /// Mineral each lab is currently designated to hold
    pub lab_mineral_types: BTreeMap<ObjectId, ResourceType>,
    pub boost_queues: BoostQueues,
    pub stats: ChamberStats,
}

impl Default for ChamberMemory {
    fn default() -> Self {
        Self {
            status: PipelineStatus::Idle as u8,
            status_tick: 0,
            active_reaction: None,
            reaction_queue: VecDeque::new(),
            lab_mineral_types: BTreeMap::new(),
            boost_queues: BoostQueues::new(),
            stats: ChamberStats::default(),
        }
    }
}

impl ChamberMemory {
    /// Decoded status; `None` if the stored value is not a known stage
    pub fn status(&self) -> Option<PipelineStatus> {
        PipelineStatus::try_from(self.status).ok()
    }

    pub fn set_status(&mut self, status: PipelineStatus, tick: Tick) {
        self.status = status as u8;
        self.status_tick = tick;
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ColonyMemory {
    pub evolution_chamber: ChamberMemory,
}

/// Memory of every colony, injected into each subsystem step
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryStore {
    colonies: BTreeMap<String, ColonyMemory>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Memory of `colony`, created with defaults on first use
    pub fn colony_mut(&mut self, colony: &str) -> &mut ColonyMemory {
        self.colonies.entry(colony.to_string()).or_default()
    }

    pub fn colony(&self, colony: &str) -> Result<&ColonyMemory> {
        self.colonies
            .get(colony)
            .ok_or_else(|| CoreError::UnknownColony(colony.to_string()))
    }

    pub fn colonies(&self) -> impl Iterator<Item = &str> {
        self.colonies.keys().map(String::as_str)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from `path`; a missing file is an empty store
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
