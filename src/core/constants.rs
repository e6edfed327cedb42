//! World constants the core schedules against
//!
//! These mirror the external simulation's rules. The core never enforces
//! them itself; it only plans around them.

use crate::core::types::Tick;

// Labs
pub const LAB_REACTION_AMOUNT: u32 = 5;
pub const LAB_BOOST_MINERAL: u32 = 30;
pub const LAB_BOOST_ENERGY: u32 = 20;
pub const LAB_MINERAL_CAPACITY: u32 = 3000;
pub const LAB_ENERGY_CAPACITY: u32 = 2000;
pub const LAB_REACTION_COOLDOWN: u32 = 10;
pub const LAB_REACTION_RANGE: u32 = 2;

// Agents
pub const AGENT_LIFETIME: u32 = 1500;

// Repair
pub const REPAIR_POWER: u32 = 100;

// Boost queue urgency for requesters that do not exist yet or cannot be found
pub const UNSPAWNED_URGENCY_BASE: u32 = 5000;
pub const UNKNOWN_URGENCY: u32 = 9999;

// Stats
pub const STATS_DECIMALS: u32 = 5;

// Cache
pub const CACHE_TIMEOUT: Tick = 50;
pub const SHORT_CACHE_TIMEOUT: Tick = 10;
