//! Core configuration with documented constants
//!
//! All tunables are collected here with explanations of their purpose.
//! The config is loaded once (from TOML or defaults) and passed explicitly to
//! each subsystem at construction.

use crate::core::constants::{CACHE_TIMEOUT, SHORT_CACHE_TIMEOUT};
use crate::core::error::{CoreError, Result};
use crate::core::types::{Role, Tick};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration for one colony core
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Seed for the cache jitter RNG, so runs are reproducible
    pub seed: u64,
    pub cache: CacheConfig,
    pub pipeline: PipelineConfig,
    pub dispenser: DispenserConfig,
    pub roads: RoadConfig,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            seed: 0x5eed,
            cache: CacheConfig::default(),
            pipeline: PipelineConfig::default(),
            dispenser: DispenserConfig::default(),
            roads: RoadConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Lifetime of object collections, positions and lists
    ///
    /// Structure lists change rarely, so these live longest.
    pub default_timeout: Tick,

    /// Lifetime of scalar aggregates
    ///
    /// Scalars such as "energy to repave" drift every tick and go stale fast.
    pub short_timeout: Tick,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_timeout: CACHE_TIMEOUT,
            short_timeout: SHORT_CACHE_TIMEOUT,
        }
    }
}

/// Maximum dwell time per pipeline stage; `None` means unbounded
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StageTimeouts {
    pub idle: Option<Tick>,
    pub acquiring_inputs: Option<Tick>,
    pub loading: Option<Tick>,
    /// Two orders of magnitude above the others: long production runs
    /// should almost never be treated as stalled.
    pub processing: Option<Tick>,
    pub unloading: Option<Tick>,
}

impl Default for StageTimeouts {
    fn default() -> Self {
        Self {
            idle: None,
            acquiring_inputs: Some(100),
            loading: Some(50),
            processing: Some(10_000),
            unloading: Some(1_000),
        }
    }
}

impl StageTimeouts {
    /// Sum of every bounded cap; the longest a single order can take
    /// before the pipeline is guaranteed back in Idle
    pub fn bounded_total(&self) -> Tick {
        [
            self.idle,
            self.acquiring_inputs,
            self.loading,
            self.processing,
            self.unloading,
        ]
        .iter()
        .flatten()
        .sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub stage_timeouts: StageTimeouts,

    /// Window (ticks) of the rolling lab usage average
    pub usage_window: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stage_timeouts: StageTimeouts::default(),
            usage_window: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispenserConfig {
    /// Beyond this range a harvest-capable agent prefers harvesting
    /// over walking to the best recharge target
    pub max_recharge_range: u32,

    /// Role that never self-harvests; other agents mine for it
    pub non_harvesting_role: Role,

    /// Minimum energy a target must hold to be considered
    pub min_energy: u32,
}

impl Default for DispenserConfig {
    fn default() -> Self {
        Self {
            max_recharge_range: 40,
            non_harvesting_role: Role::Worker,
            min_energy: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoadConfig {
    pub allowed_pavers_per_room: usize,

    /// Roads under this fraction of max hits force a repair trip
    pub critical_threshold: f64,

    /// Roads under this fraction of max hits are worth repairing
    pub repair_threshold: f64,

    pub cache_timeout: Tick,
}

impl Default for RoadConfig {
    fn default() -> Self {
        Self {
            allowed_pavers_per_room: 1,
            critical_threshold: 0.25,
            repair_threshold: 0.9,
            cache_timeout: 25,
        }
    }
}

impl CoreConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a config from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: CoreConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.cache.default_timeout == 0 || self.cache.short_timeout == 0 {
            return Err(CoreError::InvalidConfig(
                "cache timeouts must be positive".into(),
            ));
        }

        let timeouts = &self.pipeline.stage_timeouts;
        let caps = [
            ("idle", timeouts.idle),
            ("acquiring_inputs", timeouts.acquiring_inputs),
            ("loading", timeouts.loading),
            ("processing", timeouts.processing),
            ("unloading", timeouts.unloading),
        ];
        for (name, cap) in caps {
            if cap == Some(0) {
                return Err(CoreError::InvalidConfig(format!(
                    "stage timeout `{}` must be positive or unbounded",
                    name
                )));
            }
        }

        // Processing stays the most patient bounded stage
        if let Some(processing) = timeouts.processing {
            let longest_other = caps
                .iter()
                .filter(|(name, _)| *name != "processing")
                .filter_map(|(_, cap)| *cap)
                .max()
                .unwrap_or(0);
            if processing < longest_other {
                return Err(CoreError::InvalidConfig(format!(
                    "processing timeout ({}) should not be shorter than other stages ({})",
                    processing, longest_other
                )));
            }
        }

        if self.pipeline.usage_window == 0 {
            return Err(CoreError::InvalidConfig("usage_window must be positive".into()));
        }

        let roads = &self.roads;
        if !(0.0..=1.0).contains(&roads.repair_threshold)
            || roads.critical_threshold >= roads.repair_threshold
        {
            return Err(CoreError::InvalidConfig(format!(
                "road thresholds must satisfy 0 <= critical ({}) < repair ({}) <= 1",
                roads.critical_threshold, roads.repair_threshold
            )));
        }

        Ok(())
    }
}
