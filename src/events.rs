//! Events emitted by one colony tick, for callers that report or react

use crate::core::types::{AgentId, ObjectId, RoomCoord};
use crate::production::status::PipelineStatus;
use crate::tasks::TaskKind;
use crate::world::resources::ResourceType;
use crate::world::ReactionError;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ColonyEvent {
    /// The pipeline picked up a new order
    ReactionStarted {
        product: ResourceType,
        amount: u32,
    },
    StageChanged {
        from: PipelineStatus,
        to: PipelineStatus,
    },
    /// Dwell cap exceeded; the pipeline was reset and its queue discarded
    Stalled {
        status: PipelineStatus,
        ticks: u64,
    },
    /// Persisted pipeline state was inconsistent and has been reset
    StateRepaired {
        raw_status: u8,
    },
    ReactionRun {
        lab: ObjectId,
        product: ResourceType,
        amount: u32,
    },
    ReactionFailed {
        lab: ObjectId,
        #[serde(skip)]
        error: ReactionError,
    },
    LabReserved {
        lab: ObjectId,
        resource: ResourceType,
        amount: u32,
        requester: AgentId,
    },
    AgentBoosted {
        agent: AgentId,
        lab: ObjectId,
        resource: ResourceType,
        parts: u32,
    },
    ResourceRequested {
        resource: ResourceType,
        amount: u32,
        urgent: bool,
    },
    TaskAssigned {
        agent: AgentId,
        kind: TaskKind,
        target: ObjectId,
    },
    RepaveAssigned {
        agent: AgentId,
        room: RoomCoord,
    },
}
