//! Concrete tasks agents execute
//!
//! A task always names a world object and where it stood when the task was
//! assigned. Intents like "go get energy" are not tasks; they are resolved
//! into one of these at assignment time (see `recharge`).

pub mod recharge;

pub use recharge::{resolve_recharge, RechargeContext};

use crate::core::types::{ObjectId, Position, Tick};
use crate::world::entity::Entity;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Withdraw,
    Pickup,
    Harvest,
    Repair,
}

impl TaskKind {
    /// Tasks that drain their target's resources
    pub fn is_resource_outflux(&self) -> bool {
        matches!(self, TaskKind::Withdraw | TaskKind::Pickup)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub kind: TaskKind,
    pub target: ObjectId,
    pub target_pos: Position,
    pub created_tick: Tick,
}

impl Task {
    pub fn new(kind: TaskKind, target: &Entity, tick: Tick) -> Self {
        Self {
            kind,
            target: target.id,
            target_pos: target.pos,
            created_tick: tick,
        }
    }

    pub fn withdraw(target: &Entity, tick: Tick) -> Self {
        Self::new(TaskKind::Withdraw, target, tick)
    }

    pub fn pickup(target: &Entity, tick: Tick) -> Self {
        Self::new(TaskKind::Pickup, target, tick)
    }

    pub fn harvest(target: &Entity, tick: Tick) -> Self {
        Self::new(TaskKind::Harvest, target, tick)
    }

    pub fn repair(target: &Entity, tick: Tick) -> Self {
        Self::new(TaskKind::Repair, target, tick)
    }

    pub fn is_resource_outflux(&self) -> bool {
        self.kind.is_resource_outflux()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::entity::EntityKind;

    #[test]
    fn test_outflux_kinds() {
        assert!(TaskKind::Withdraw.is_resource_outflux());
        assert!(TaskKind::Pickup.is_resource_outflux());
        assert!(!TaskKind::Harvest.is_resource_outflux());
        assert!(!TaskKind::Repair.is_resource_outflux());
    }

    #[test]
    fn test_task_records_target() {
        let source = Entity::new(
            ObjectId(4),
            Position::new(3, 7),
            EntityKind::Source {
                energy: 3000,
                capacity: 3000,
            },
        );
        let task = Task::harvest(&source, 12);
        assert_eq!(task.kind, TaskKind::Harvest);
        assert_eq!(task.target, ObjectId(4));
        assert_eq!(task.target_pos, Position::new(3, 7));
        assert_eq!(task.created_tick, 12);
    }
}
