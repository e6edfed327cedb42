//! Boost queues and lab reservations
//!
//! Each lab keeps a queue of agents waiting to be boosted there, most urgent
//! first. Urgency is the requester's remaining lifetime; agents that do not
//! exist yet are scored from their spawn estimate and land behind every
//! living agent, and requesters that cannot be found land last.

use crate::agents::{Agent, AgentRegistry};
use crate::core::constants::{LAB_BOOST_MINERAL, UNKNOWN_URGENCY, UNSPAWNED_URGENCY_BASE};
use crate::core::types::{AgentId, ObjectId};
use crate::world::resources::ResourceType;
use crate::world::store::Store;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};

/// Lower is more urgent
pub fn boost_urgency(agent: Option<&Agent>) -> u32 {
    let Some(agent) = agent else {
        return UNKNOWN_URGENCY;
    };
    agent
        .ticks_to_live
        .filter(|&ttl| ttl > 0)
        .or_else(|| {
            agent
                .ticks_until_spawned
                .map(|eta| UNSPAWNED_URGENCY_BASE + eta)
        })
        .unwrap_or(UNKNOWN_URGENCY)
}

/// Compound needed to boost every not-yet-boosted part `resource` applies to
pub fn boost_amount(agent: &Agent, resource: ResourceType) -> u32 {
    resource.boosted_part().map_or(0, |part| {
        LAB_BOOST_MINERAL * agent.active_parts(part).saturating_sub(agent.boosted_parts(part))
    })
}

/// Whether the colony can source enough of `resource` to boost `agent`
///
/// Either the colony holds it, or the wider network holds at least twice
/// the amount so one colony does not drain it.
pub fn can_boost(agent: &Agent, resource: ResourceType, holdings: &Store, network_assets: u32) -> bool {
    let amount = boost_amount(agent, resource);
    holdings.get(resource) >= amount || network_assets >= 2 * amount
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedBoost {
    pub resource: ResourceType,
    pub requester: AgentId,
    pub urgency: u32,
    seq: u64,
}

// The heap pops its greatest element, so lower urgency compares greater;
// equal urgency falls back to the earlier registration
impl Ord for QueuedBoost {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .urgency
            .cmp(&self.urgency)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for QueuedBoost {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Boost requests waiting at one lab
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoostQueue {
    heap: BinaryHeap<QueuedBoost>,
    next_seq: u64,
}

impl BoostQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `requester` for `resource`; returns false if already queued
    pub fn push(&mut self, resource: ResourceType, requester: AgentId, urgency: u32) -> bool {
        if self
            .heap
            .iter()
            .any(|q| q.requester == requester && q.resource == resource)
        {
            return false;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(QueuedBoost {
            resource,
            requester,
            urgency,
            seq,
        });
        true
    }

    pub fn head(&self) -> Option<&QueuedBoost> {
        self.heap.peek()
    }

    /// Remove the head and re-score everyone still waiting
    pub fn pop_and_rescore(&mut self, agents: &AgentRegistry) -> Option<QueuedBoost> {
        let head = self.heap.pop()?;
        let rescored: Vec<QueuedBoost> = self
            .heap
            .drain()
            .map(|mut queued| {
                queued.urgency = boost_urgency(agents.get(queued.requester));
                queued
            })
            .collect();
        self.heap.extend(rescored);
        Some(head)
    }

    /// Queue entries from most to least urgent
    pub fn ordered(&self) -> Vec<&QueuedBoost> {
        let mut entries: Vec<&QueuedBoost> = self.heap.iter().collect();
        entries.sort_by(|a, b| b.cmp(a));
        entries
    }

    /// Zero-based position of `requester`, if queued
    pub fn position(&self, requester: AgentId) -> Option<usize> {
        self.ordered().iter().position(|q| q.requester == requester)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

/// Boost queues of every lab in a colony
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoostQueues {
    queues: BTreeMap<ObjectId, BoostQueue>,
}

impl BoostQueues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for `agent` to be boosted with `resource` at `lab`
    ///
    /// Repeating a request already in the queue is a no-op.
    pub fn request(&mut self, lab: ObjectId, resource: ResourceType, agent: &Agent) -> bool {
        self.queues
            .entry(lab)
            .or_default()
            .push(resource, agent.id, boost_urgency(Some(agent)))
    }

    pub fn position(&self, agent: AgentId, lab: ObjectId) -> Option<usize> {
        self.queues.get(&lab).and_then(|q| q.position(agent))
    }

    pub fn head(&self, lab: ObjectId) -> Option<&QueuedBoost> {
        self.queues.get(&lab).and_then(BoostQueue::head)
    }

    /// Consume the head of `lab`'s queue; an emptied queue is dropped
    pub fn complete(&mut self, lab: ObjectId, agents: &AgentRegistry) -> Option<QueuedBoost> {
        let queue = self.queues.get_mut(&lab)?;
        let head = queue.pop_and_rescore(agents);
        if queue.is_empty() {
            self.queues.remove(&lab);
        }
        head
    }

    /// Drop every queue for a lab that no longer exists
    pub fn retain_labs(&mut self, labs: &[ObjectId]) {
        self.queues.retain(|lab, _| labs.contains(lab));
    }

    pub fn labs(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.queues.keys().copied()
    }

    pub fn get(&self, lab: ObjectId) -> Option<&BoostQueue> {
        self.queues.get(&lab)
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }
}

/// A lab taken out of the product pool to serve its head boost request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabReservation {
    pub lab: ObjectId,
    pub resource: ResourceType,
    pub amount: u32,
    pub requester: AgentId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Position, Role};
    use crate::world::resources::BodyPart;

    fn agent(id: u32, ttl: Option<u32>, eta: Option<u32>) -> Agent {
        let mut agent = Agent::new(AgentId(id), Role::Upgrader, Position::new(0, 0))
            .with_body(&[BodyPart::Work, BodyPart::Work, BodyPart::Work, BodyPart::Move]);
        agent.ticks_to_live = ttl;
        agent.ticks_until_spawned = eta;
        agent
    }

    #[test]
    fn test_urgency_scores() {
        assert_eq!(boost_urgency(Some(&agent(1, Some(300), None))), 300);
        assert_eq!(boost_urgency(Some(&agent(1, None, Some(40)))), 5040);
        assert_eq!(boost_urgency(Some(&agent(1, None, None))), UNKNOWN_URGENCY);
        assert_eq!(boost_urgency(None), UNKNOWN_URGENCY);
    }

    #[test]
    fn test_queue_orders_by_urgency() {
        let mut queues = BoostQueues::new();
        let lab = ObjectId(1);
        let old = agent(1, Some(1200), None);
        let dying = agent(2, Some(100), None);
        let unborn = agent(3, None, Some(10));
        queues.request(lab, ResourceType::GhodiumHydride, &unborn);
        queues.request(lab, ResourceType::GhodiumHydride, &old);
        queues.request(lab, ResourceType::GhodiumHydride, &dying);

        assert_eq!(queues.head(lab).map(|q| q.requester), Some(AgentId(2)));
        assert_eq!(queues.position(AgentId(1), lab), Some(1));
        assert_eq!(queues.position(AgentId(3), lab), Some(2));
        assert_eq!(queues.position(AgentId(9), lab), None);
    }

    #[test]
    fn test_duplicate_request_ignored() {
        let mut queues = BoostQueues::new();
        let a = agent(1, Some(500), None);
        assert!(queues.request(ObjectId(1), ResourceType::GhodiumHydride, &a));
        assert!(!queues.request(ObjectId(1), ResourceType::GhodiumHydride, &a));
        assert_eq!(queues.get(ObjectId(1)).map(BoostQueue::len), Some(1));
    }

    #[test]
    fn test_complete_rescores_remaining() {
        let mut registry = AgentRegistry::new();
        let first = agent(1, Some(50), None);
        let unborn = agent(2, None, Some(100));
        let alive = agent(3, Some(900), None);
        let mut queues = BoostQueues::new();
        let lab = ObjectId(4);
        for a in [&first, &unborn, &alive] {
            queues.request(lab, ResourceType::GhodiumHydride, a);
            registry.add(a.clone());
        }

        // The unborn agent spawns and is now the shortest-lived
        registry.get_mut(AgentId(2)).unwrap().ticks_to_live = Some(20);
        let done = queues.complete(lab, &registry).unwrap();
        assert_eq!(done.requester, AgentId(1));
        assert_eq!(queues.head(lab).map(|q| q.requester), Some(AgentId(2)));

        queues.complete(lab, &registry);
        queues.complete(lab, &registry);
        assert!(queues.is_empty());
        assert!(queues.complete(lab, &registry).is_none());
    }

    #[test]
    fn test_boost_amount_and_can_boost() {
        let mut upgrader = agent(1, Some(500), None);
        assert_eq!(boost_amount(&upgrader, ResourceType::GhodiumHydride), 90);
        upgrader.body[0].boost = Some(ResourceType::GhodiumHydride);
        assert_eq!(boost_amount(&upgrader, ResourceType::GhodiumHydride), 60);
        assert_eq!(boost_amount(&upgrader, ResourceType::Energy), 0);

        let holdings = Store::unbounded().with(ResourceType::GhodiumHydride, 60);
        assert!(can_boost(&upgrader, ResourceType::GhodiumHydride, &holdings, 0));
        let empty = Store::unbounded();
        assert!(!can_boost(&upgrader, ResourceType::GhodiumHydride, &empty, 119));
        assert!(can_boost(&upgrader, ResourceType::GhodiumHydride, &empty, 120));
    }
}
