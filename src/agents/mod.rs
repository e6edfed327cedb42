//! Agent registry - the mobile workers of a colony
//!
//! Agents are owned by the registry and addressed by `AgentId`. An agent that
//! is still being produced has no remaining lifetime yet, only an estimate of
//! when it will exist.

use crate::core::constants::AGENT_LIFETIME;
use crate::core::types::{AgentId, ObjectId, Position, Role};
use crate::tasks::Task;
use crate::world::resources::{BodyPart, ResourceType};
use crate::world::store::Store;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One body part and the compound applied to it, if any
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodySlot {
    pub part: BodyPart,
    pub boost: Option<ResourceType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub role: Role,
    pub pos: Position,
    pub body: Vec<BodySlot>,
    pub carry: Store,
    /// `None` while the agent is still being spawned
    pub ticks_to_live: Option<u32>,
    /// Estimated ticks until a spawning agent exists
    pub ticks_until_spawned: Option<u32>,
    pub task: Option<Task>,
}

impl Agent {
    pub fn new(id: AgentId, role: Role, pos: Position) -> Self {
        Self {
            id,
            role,
            pos,
            body: Vec::new(),
            carry: Store::new(0),
            ticks_to_live: Some(AGENT_LIFETIME),
            ticks_until_spawned: None,
            task: None,
        }
    }

    pub fn with_body(mut self, parts: &[BodyPart]) -> Self {
        self.body = parts
            .iter()
            .map(|&part| BodySlot { part, boost: None })
            .collect();
        self
    }

    pub fn with_carry_capacity(mut self, capacity: u32) -> Self {
        self.carry = Store::new(capacity);
        self
    }

    pub fn with_energy(mut self, amount: u32) -> Self {
        self.carry.add(ResourceType::Energy, amount);
        self
    }

    pub fn with_ticks_to_live(mut self, ticks: u32) -> Self {
        self.ticks_to_live = Some(ticks);
        self.ticks_until_spawned = None;
        self
    }

    /// Mark the agent as queued for spawning, available in `ticks`
    pub fn spawning(mut self, ticks: u32) -> Self {
        self.ticks_to_live = None;
        self.ticks_until_spawned = Some(ticks);
        self
    }

    pub fn with_task(mut self, task: Task) -> Self {
        self.task = Some(task);
        self
    }

    pub fn is_spawned(&self) -> bool {
        self.ticks_to_live.is_some()
    }

    pub fn carry_capacity(&self) -> u32 {
        self.carry.capacity()
    }

    /// Room left in the agent's carry
    pub fn free_carry(&self) -> u32 {
        self.carry.free_capacity()
    }

    pub fn active_parts(&self, part: BodyPart) -> u32 {
        self.body.iter().filter(|slot| slot.part == part).count() as u32
    }

    pub fn boosted_parts(&self, part: BodyPart) -> u32 {
        self.body
            .iter()
            .filter(|slot| slot.part == part && slot.boost.is_some())
            .count() as u32
    }

    pub fn can_harvest(&self) -> bool {
        self.active_parts(BodyPart::Work) > 0
    }

    pub fn is_idle(&self) -> bool {
        self.task.is_none()
    }

    /// Apply `compound` to every unboosted part it affects; returns parts boosted
    pub fn apply_boost(&mut self, compound: ResourceType) -> u32 {
        let Some(part) = compound.boosted_part() else {
            return 0;
        };
        let mut boosted = 0;
        for slot in self.body.iter_mut().filter(|s| s.part == part && s.boost.is_none()) {
            slot.boost = Some(compound);
            boosted += 1;
        }
        boosted
    }
}

/// All agents of a colony, iterated in id order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentRegistry {
    agents: BTreeMap<AgentId, Agent>,
    next_id: u32,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a fresh id for an agent about to be added
    pub fn next_id(&mut self) -> AgentId {
        self.next_id += 1;
        AgentId(self.next_id)
    }

    pub fn add(&mut self, agent: Agent) -> AgentId {
        let id = agent.id;
        self.next_id = self.next_id.max(id.0);
        self.agents.insert(id, agent);
        id
    }

    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(&id)
    }

    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Agents whose current task names `target`
    pub fn targeting(&self, target: ObjectId) -> impl Iterator<Item = &Agent> {
        self.agents
            .values()
            .filter(move |a| a.task.as_ref().is_some_and(|t| t.target == target))
    }

    /// Whether a spawned agent stands on `pos`
    pub fn occupied(&self, pos: Position) -> bool {
        self.agents.values().any(|a| a.is_spawned() && a.pos == pos)
    }

    /// Spawned agents without a task, in id order
    pub fn idle(&self) -> Vec<AgentId> {
        self.agents
            .values()
            .filter(|a| a.is_spawned() && a.is_idle())
            .map(|a| a.id)
            .collect()
    }

    pub fn with_role(&self, role: Role) -> impl Iterator<Item = &Agent> {
        self.agents.values().filter(move |a| a.role == role)
    }

    /// Age every agent by one tick
    ///
    /// Spawning agents count down and come alive with a full lifetime;
    /// agents reaching the end of their lifetime are removed and returned.
    pub fn advance(&mut self) -> Vec<AgentId> {
        let mut expired = Vec::new();
        for agent in self.agents.values_mut() {
            match (agent.ticks_to_live, agent.ticks_until_spawned) {
                (Some(ttl), _) => {
                    agent.ticks_to_live = Some(ttl.saturating_sub(1));
                    if ttl <= 1 {
                        expired.push(agent.id);
                    }
                }
                (None, Some(eta)) if eta <= 1 => {
                    agent.ticks_until_spawned = None;
                    agent.ticks_to_live = Some(AGENT_LIFETIME);
                }
                (None, Some(eta)) => agent.ticks_until_spawned = Some(eta - 1),
                (None, None) => {}
            }
        }
        for id in &expired {
            self.agents.remove(id);
        }
        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::TaskKind;
    use crate::world::entity::{Entity, EntityKind};

    fn drone(registry: &mut AgentRegistry, pos: Position) -> AgentId {
        let id = registry.next_id();
        registry.add(
            Agent::new(id, Role::Drone, pos)
                .with_body(&[BodyPart::Work, BodyPart::Carry, BodyPart::Move])
                .with_carry_capacity(50),
        )
    }

    #[test]
    fn test_targeting_and_occupancy() {
        let mut registry = AgentRegistry::new();
        let a = drone(&mut registry, Position::new(1, 1));
        let b = drone(&mut registry, Position::new(2, 2));
        let container = Entity::new(
            ObjectId(9),
            Position::new(5, 5),
            EntityKind::Container {
                store: Store::new(2000),
            },
        );
        registry.get_mut(a).unwrap().task = Some(Task::withdraw(&container, 0));

        let targeting: Vec<AgentId> = registry.targeting(ObjectId(9)).map(|a| a.id).collect();
        assert_eq!(targeting, vec![a]);
        assert!(registry.occupied(Position::new(2, 2)));
        assert!(!registry.occupied(Position::new(5, 5)));
        assert_eq!(registry.idle(), vec![b]);
        assert_eq!(
            registry.get(a).and_then(|a| a.task.as_ref()).map(|t| t.kind),
            Some(TaskKind::Withdraw)
        );
    }

    #[test]
    fn test_spawning_agents_are_not_idle_or_blocking() {
        let mut registry = AgentRegistry::new();
        let id = registry.next_id();
        registry.add(Agent::new(id, Role::Worker, Position::new(3, 3)).spawning(2));
        assert!(registry.idle().is_empty());
        assert!(!registry.occupied(Position::new(3, 3)));

        registry.advance();
        assert!(!registry.get(id).unwrap().is_spawned());
        registry.advance();
        let agent = registry.get(id).unwrap();
        assert_eq!(agent.ticks_to_live, Some(AGENT_LIFETIME));
        assert_eq!(agent.ticks_until_spawned, None);
    }

    #[test]
    fn test_advance_removes_expired() {
        let mut registry = AgentRegistry::new();
        let id = registry.next_id();
        registry.add(Agent::new(id, Role::Queen, Position::new(0, 0)).with_ticks_to_live(1));
        assert_eq!(registry.advance(), vec![id]);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_apply_boost_counts_parts() {
        let mut agent = Agent::new(AgentId(1), Role::Upgrader, Position::new(0, 0)).with_body(&[
            BodyPart::Work,
            BodyPart::Work,
            BodyPart::Carry,
            BodyPart::Move,
        ]);
        assert_eq!(agent.apply_boost(ResourceType::GhodiumHydride), 2);
        assert_eq!(agent.boosted_parts(BodyPart::Work), 2);
        // Already boosted parts are not boosted twice
        assert_eq!(agent.apply_boost(ResourceType::GhodiumHydride), 0);
    }
}
