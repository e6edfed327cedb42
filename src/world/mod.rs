//! World boundary - what the core reads from and commands in the simulation
//!
//! The core never owns world physics. It reads snapshots through
//! `WorldView` and issues the few commands it needs through `WorldActions`.

pub mod entity;
pub mod resources;
pub mod sim;
pub mod store;

pub use entity::{Entity, EntityKind, LabState};
pub use resources::{reaction_product, BodyPart, ResourceType};
pub use sim::SimWorld;
pub use store::Store;

use crate::core::types::{ObjectId, Position, RoomCoord, Tick};
use thiserror::Error;

/// Read-only world queries, valid for the current tick only
pub trait WorldView {
    fn time(&self) -> Tick;

    /// Resolve an object by stable identity; `None` once it is destroyed
    fn object(&self, id: ObjectId) -> Option<Entity>;

    fn objects_in_room(&self, room: RoomCoord) -> Vec<Entity>;

    /// Terrain check only; agents standing on a tile do not make it unwalkable
    fn is_walkable(&self, pos: Position) -> bool;
}

/// Commands the core issues to the world
pub trait WorldActions: WorldView {
    /// Run one reaction in `lab` from the two reagent labs, returning the amount produced
    fn run_reaction(
        &mut self,
        lab: ObjectId,
        reagent_a: ObjectId,
        reagent_b: ObjectId,
    ) -> Result<u32, ReactionError>;

    /// Spend `amount` of `compound` (and the matching energy) from `lab` on a boost
    fn boost_from_lab(
        &mut self,
        lab: ObjectId,
        compound: ResourceType,
        amount: u32,
    ) -> Result<u32, ReactionError>;
}

/// Why a reaction could not run this tick
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReactionError {
    #[error("object {0} is not a lab")]
    InvalidTarget(ObjectId),

    #[error("lab is on cooldown for {0} more ticks")]
    Cooldown(u32),

    #[error("reagent labs are out of range")]
    NotInRange,

    #[error("reagent labs do not hold enough minerals")]
    NotEnoughReagents,

    #[error("reagents do not react")]
    InvalidReagents,

    #[error("lab is full or holds another mineral")]
    Full,

    #[error("lab does not hold enough {0} or energy to boost")]
    NotEnoughBoost(ResourceType),
}
