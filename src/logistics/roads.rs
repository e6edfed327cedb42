//! Road network upkeep
//!
//! Groups every road of a colony so repairs are requested per room instead of
//! per road. Road lists are cached; worker assignments are rebuilt each tick.

use crate::agents::{Agent, AgentRegistry};
use crate::cache::ExpiringCache;
use crate::core::config::RoadConfig;
use crate::core::constants::REPAIR_POWER;
use crate::core::types::{AgentId, Position, RoomCoord};
use crate::tasks::TaskKind;
use crate::world::entity::Entity;
use crate::world::WorldView;
use ahash::AHashMap;

#[derive(Debug, Clone)]
pub struct RoadLogistics {
    owner: String,
    rooms: Vec<RoomCoord>,
    anchor: Position,
    config: RoadConfig,
    assigned: AHashMap<RoomCoord, Vec<AgentId>>,
}

impl RoadLogistics {
    pub fn new(colony: &str, rooms: Vec<RoomCoord>, anchor: Position, config: RoadConfig) -> Self {
        Self {
            owner: format!("{}:roadLogistics", colony),
            rooms,
            anchor,
            config,
            assigned: AHashMap::new(),
        }
    }

    /// Rebuild worker assignments from the repair tasks agents currently hold
    pub fn init(&mut self, agents: &AgentRegistry) {
        self.assigned.clear();
        for agent in agents.iter() {
            if let Some(task) = agent.task.as_ref().filter(|t| t.kind == TaskKind::Repair) {
                self.register_worker_assignment(agent.id, task.target_pos.room());
            }
        }
    }

    /// Roads below the critical threshold, closest to the colony first
    pub fn critical_roads(
        &self,
        room: RoomCoord,
        world: &dyn WorldView,
        cache: &mut ExpiringCache,
    ) -> Vec<Entity> {
        self.roads_below(room, self.config.critical_threshold, "criticalRoads", world, cache)
    }

    /// Roads worth repairing, closest to the colony first
    pub fn repairable_roads(
        &self,
        room: RoomCoord,
        world: &dyn WorldView,
        cache: &mut ExpiringCache,
    ) -> Vec<Entity> {
        self.roads_below(room, self.config.repair_threshold, "repairableRoads", world, cache)
    }

    fn roads_below(
        &self,
        room: RoomCoord,
        threshold: f64,
        query: &str,
        world: &dyn WorldView,
        cache: &mut ExpiringCache,
    ) -> Vec<Entity> {
        let anchor = self.anchor;
        cache.objects(
            &self.owner,
            &format!("{}:{}", query, room),
            Some(self.config.cache_timeout),
            |id| world.object(id),
            || {
                let mut roads: Vec<Entity> = world
                    .objects_in_room(room)
                    .into_iter()
                    .filter(|e| {
                        e.hits()
                            .is_some_and(|(hits, max)| (hits as f64) < max as f64 * threshold)
                    })
                    .collect();
                roads.sort_by_key(|road| road.pos.range_to(&anchor));
                roads
            },
        )
    }

    /// Energy needed to bring every repairable road in `room` back to full
    pub fn energy_to_repave(
        &self,
        room: RoomCoord,
        world: &dyn WorldView,
        cache: &mut ExpiringCache,
    ) -> f64 {
        let roads = self.repairable_roads(room, world, cache);
        cache.number(&self.owner, &format!("energyToRepave:{}", room), None, || {
            roads
                .iter()
                .filter_map(Entity::hits)
                .map(|(hits, max)| max.saturating_sub(hits) as f64 / REPAIR_POWER as f64)
                .sum()
        })
    }

    fn worker_should_repave_room(
        &self,
        worker: &Agent,
        room: RoomCoord,
        world: &dyn WorldView,
        cache: &mut ExpiringCache,
    ) -> bool {
        let assigned = self.assigned_workers(room);
        let others = assigned.iter().filter(|&&id| id != worker.id).count();
        if others >= self.config.allowed_pavers_per_room {
            return false;
        }
        if assigned.contains(&worker.id) {
            // Already paving here: keep going until every road is acceptable
            !self.repairable_roads(room, world, cache).is_empty()
        } else {
            !self.critical_roads(room, world, cache).is_empty()
                || self.energy_to_repave(room, world, cache) >= worker.carry_capacity() as f64
        }
    }

    /// Room `worker` should repave, if any
    pub fn worker_should_repave(
        &self,
        worker: &Agent,
        world: &dyn WorldView,
        cache: &mut ExpiringCache,
    ) -> Option<RoomCoord> {
        if let Some(task) = worker.task.as_ref().filter(|t| t.kind == TaskKind::Repair) {
            let room = task.target_pos.room();
            if self.assigned_workers(room).contains(&worker.id)
                && self.worker_should_repave_room(worker, room, world, cache)
            {
                return Some(room);
            }
        }
        self.rooms
            .iter()
            .copied()
            .find(|&room| self.worker_should_repave_room(worker, room, world, cache))
    }

    /// Next road to send a paver to: critical roads first, then repairable ones
    pub fn next_road(
        &self,
        room: RoomCoord,
        world: &dyn WorldView,
        cache: &mut ExpiringCache,
    ) -> Option<Entity> {
        self.critical_roads(room, world, cache)
            .into_iter()
            .next()
            .or_else(|| self.repairable_roads(room, world, cache).into_iter().next())
    }

    /// Record that `worker` paves `room` this tick; repeated calls are no-ops
    pub fn register_worker_assignment(&mut self, worker: AgentId, room: RoomCoord) {
        let workers = self.assigned.entry(room).or_default();
        if !workers.contains(&worker) {
            workers.push(worker);
        }
    }

    pub fn assigned_workers(&self, room: RoomCoord) -> &[AgentId] {
        self.assigned.get(&room).map(Vec::as_slice).unwrap_or(&[])
    }
}
