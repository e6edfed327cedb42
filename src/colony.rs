//! Colony driver - runs every subsystem once per tick
//!
//! Order within a tick:
//! cache -> transport requests -> production init -> production run ->
//! boosts -> road logistics -> idle agents
//!
//! The pipeline's requests are registered before any agent is assigned, so
//! whatever consumes the request group sees the post-advance pipeline state.

use crate::agents::AgentRegistry;
use crate::cache::ExpiringCache;
use crate::core::config::CoreConfig;
use crate::core::types::{AgentId, ObjectId, Position, Role, RoomCoord, Tick};
use crate::events::ColonyEvent;
use crate::logistics::network::ResourceNetwork;
use crate::logistics::requests::TransportRequestGroup;
use crate::logistics::roads::RoadLogistics;
use crate::production::boosts::can_boost;
use crate::production::layout::LabLayout;
use crate::production::memory::{ChamberMemory, MemoryStore};
use crate::production::pipeline::{PipelineContext, ProductionPipeline};
use crate::production::planner::ReactionPlanner;
use crate::stats::Stats;
use crate::tasks::{resolve_recharge, RechargeContext, Task};
use crate::world::entity::{Entity, EntityKind};
use crate::world::resources::ResourceType;
use crate::world::store::Store;
use crate::world::{WorldActions, WorldView};
use tracing::{debug, info};

pub struct Colony {
    name: String,
    owner: String,
    rooms: Vec<RoomCoord>,
    config: CoreConfig,
    cache: ExpiringCache,
    requests: TransportRequestGroup,
    roads: RoadLogistics,
    pipeline: ProductionPipeline,
    planner: Box<dyn ReactionPlanner>,
    /// Storage, terminal and lab contents as of the last tick
    holdings: Store,
}

impl Colony {
    /// `rooms[0]` is the owned room; roads are maintained in all of them
    pub fn new(
        name: &str,
        rooms: Vec<RoomCoord>,
        anchor: Position,
        config: CoreConfig,
        planner: Box<dyn ReactionPlanner>,
    ) -> Self {
        Self {
            name: name.to_string(),
            owner: format!("{}:colony", name),
            cache: ExpiringCache::new(config.cache.clone(), config.seed),
            requests: TransportRequestGroup::new(),
            roads: RoadLogistics::new(name, rooms.clone(), anchor, config.roads.clone()),
            pipeline: ProductionPipeline::new(name, None, LabLayout::default(), config.pipeline.clone()),
            rooms,
            config,
            planner,
            holdings: Store::unbounded(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Transport requests registered this tick
    pub fn requests(&self) -> &TransportRequestGroup {
        &self.requests
    }

    pub fn pipeline(&self) -> &ProductionPipeline {
        &self.pipeline
    }

    pub fn holdings(&self) -> &Store {
        &self.holdings
    }

    pub fn cache(&self) -> &ExpiringCache {
        &self.cache
    }

    /// Queue `agent` for a boost if the colony can source the compound
    pub fn request_boost(
        &self,
        memory: &mut MemoryStore,
        lab: ObjectId,
        resource: ResourceType,
        agent: AgentId,
        agents: &AgentRegistry,
        network: &dyn ResourceNetwork,
    ) -> bool {
        let Some(agent) = agents.get(agent) else {
            return false;
        };
        if !can_boost(agent, resource, &self.holdings, network.assets(resource)) {
            debug!("{}: can't source {} to boost {}", self.name, resource, agent.id);
            return false;
        }
        let chamber = &mut memory.colony_mut(&self.name).evolution_chamber;
        self.pipeline.request_boost(chamber, lab, resource, agent)
    }

    pub fn boost_queue_position(
        &self,
        memory: &MemoryStore,
        agent: AgentId,
        lab: ObjectId,
    ) -> Option<usize> {
        let chamber = &memory.colony(&self.name).ok()?.evolution_chamber;
        chamber.boost_queues.position(agent, lab)
    }

    // Discovery

    fn find_objects<W>(&mut self, world: &W, query: &str, ttl: Option<Tick>, keep: fn(&Entity) -> bool) -> Vec<Entity>
    where
        W: WorldView,
    {
        let rooms = &self.rooms;
        self.cache.objects(
            &self.owner,
            query,
            ttl,
            |id| world.object(id).filter(keep),
            || {
                rooms
                    .iter()
                    .flat_map(|&room| world.objects_in_room(room))
                    .filter(keep)
                    .collect()
            },
        )
    }

    fn update_holdings(&mut self, depots: &[Entity], labs: &[Entity]) {
        let mut holdings = Store::unbounded();
        for store in depots.iter().filter_map(Entity::store) {
            holdings.absorb(store);
        }
        for lab in labs.iter().filter_map(Entity::as_lab) {
            if let Some(mineral) = lab.mineral {
                holdings.add(mineral, lab.mineral_amount);
            }
        }
        self.holdings = holdings;
    }

    fn update_layout(&mut self, labs: &[Entity], terminal: Option<&Entity>) {
        let ids: Vec<ObjectId> = labs.iter().map(|lab| lab.id).collect();
        let terminal_id = terminal.map(|t| t.id);
        if self.pipeline.layout().labs == ids && self.pipeline.terminal() == terminal_id {
            return;
        }
        let layout = LabLayout::from_labs(labs, terminal.map(|t| t.pos));
        info!(
            "{}: lab layout rebuilt with {} labs (reagent {:?}, boosting {:?})",
            self.name,
            layout.labs.len(),
            layout.reagent_labs,
            layout.boosting_labs
        );
        self.pipeline = ProductionPipeline::new(&self.name, terminal_id, layout, self.config.pipeline.clone());
    }

    // Tick

    pub fn run_tick<W: WorldActions>(
        &mut self,
        memory: &mut MemoryStore,
        world: &mut W,
        agents: &mut AgentRegistry,
        network: &mut dyn ResourceNetwork,
        stats: &mut Stats,
    ) -> Vec<ColonyEvent> {
        let now = world.time();
        let mut events = Vec::new();
        self.cache.begin_tick(now);
        self.requests.clear();

        let labs = self.find_objects(&*world, "labs", None, Entity::is_lab);
        let depots = self.find_objects(&*world, "depots", None, |e| {
            matches!(e.kind, EntityKind::Storage { .. } | EntityKind::Terminal { .. })
        });
        let terminal = depots
            .iter()
            .find(|e| matches!(e.kind, EntityKind::Terminal { .. }));
        self.update_layout(&labs, terminal);
        self.update_holdings(&depots, &labs);

        let chamber = &mut memory.colony_mut(&self.name).evolution_chamber;
        {
            let mut ctx = PipelineContext {
                world: &mut *world,
                agents: &*agents,
                holdings: &self.holdings,
                requests: &mut self.requests,
                network: &mut *network,
                stats: &mut *stats,
                events: &mut events,
            };
            self.pipeline.init(chamber, self.planner.as_ref(), &mut ctx);
            self.pipeline.run(chamber, &mut ctx);
        }
        self.apply_boosts(chamber, world, agents, &mut events);

        self.roads.init(agents);
        self.assign_idle_agents(now, &*world, agents, &mut events);

        stats.log(
            format!("colonies.{}.cache.recomputes", self.name),
            self.cache.recomputes() as f64,
        );
        events
    }

    /// Boost every reserved requester standing next to its lab
    fn apply_boosts<W: WorldActions>(
        &self,
        chamber: &mut ChamberMemory,
        world: &mut W,
        agents: &mut AgentRegistry,
        events: &mut Vec<ColonyEvent>,
    ) {
        let reservations: Vec<_> = self.pipeline.reservations().copied().collect();
        for reservation in reservations {
            let (Some(agent), Some(lab)) = (agents.get(reservation.requester), world.object(reservation.lab)) else {
                continue;
            };
            if !agent.pos.is_near_to(&lab.pos) {
                continue;
            }
            if reservation.amount > 0 {
                if let Err(error) = world.boost_from_lab(reservation.lab, reservation.resource, reservation.amount) {
                    debug!("{}: {} waiting at lab {}: {}", self.name, agent.id, reservation.lab, error);
                    continue;
                }
            }
            let parts = agents
                .get_mut(reservation.requester)
                .map_or(0, |agent| agent.apply_boost(reservation.resource));
            info!(
                "{}: boosted {} parts of {} with {}",
                self.name, parts, reservation.requester, reservation.resource
            );
            events.push(ColonyEvent::AgentBoosted {
                agent: reservation.requester,
                lab: reservation.lab,
                resource: reservation.resource,
                parts,
            });
            ProductionPipeline::complete_boost(chamber, reservation.lab, agents);
        }
    }

    /// Workers carrying energy repave; everyone with room to spare recharges
    ///
    /// Agents are handled in id order and each assignment is visible to the
    /// next agent's contention check.
    fn assign_idle_agents<W: WorldView>(
        &mut self,
        now: Tick,
        world: &W,
        agents: &mut AgentRegistry,
        events: &mut Vec<ColonyEvent>,
    ) {
        let short = Some(self.config.cache.short_timeout);
        let rechargeables = self.find_objects(world, "rechargeables", short, Entity::is_rechargeable);
        let sources = self.find_objects(world, "sources", None, |e| matches!(e.kind, EntityKind::Source { .. }));

        for id in agents.idle() {
            let Some(agent) = agents.get(id) else {
                continue;
            };

            let mut task = None;
            if agent.role == Role::Worker && agent.carry.get(ResourceType::Energy) > 0 {
                let room = self.roads.worker_should_repave(agent, world, &mut self.cache);
                if let Some(room) = room {
                    if let Some(road) = self.roads.next_road(room, world, &mut self.cache) {
                        self.roads.register_worker_assignment(id, room);
                        events.push(ColonyEvent::RepaveAssigned { agent: id, room });
                        task = Some(Task::repair(&road, now));
                    }
                }
            }
            if task.is_none() && agent.free_carry() > 0 {
                let ctx = RechargeContext {
                    tick: now,
                    rechargeables: &rechargeables,
                    sources: &sources,
                    agents: &*agents,
                    world,
                    config: &self.config.dispenser,
                };
                task = resolve_recharge(agent, &ctx, self.config.dispenser.min_energy);
            }

            if let Some(task) = task {
                events.push(ColonyEvent::TaskAssigned {
                    agent: id,
                    kind: task.kind,
                    target: task.target,
                });
                if let Some(agent) = agents.get_mut(id) {
                    agent.task = Some(task);
                }
            }
        }
    }
}
