//! Production layer - lab reactions, boosts, and the memory they persist

pub mod boosts;
pub mod layout;
pub mod memory;
pub mod pipeline;
pub mod planner;
pub mod status;

pub use boosts::{boost_amount, boost_urgency, can_boost, BoostQueue, BoostQueues, LabReservation, QueuedBoost};
pub use layout::LabLayout;
pub use memory::{ChamberMemory, ChamberStats, ColonyMemory, MemoryStore, Reaction};
pub use pipeline::{PipelineContext, ProductionPipeline};
pub use planner::{
    missing_basic_minerals, missing_reagents, required_reagents, ReactionPlanner, StockTargetPlanner,
};
pub use status::PipelineStatus;
