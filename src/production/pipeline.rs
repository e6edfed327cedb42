//! Production pipeline - the lab state machine
//!
//! One order at a time moves through five stages:
//!
//! ```text
//! Idle -> AcquiringInputs -> Loading -> Processing -> Unloading -> Idle
//! ```
//!
//! Every tick `init` repairs inconsistent persisted state, refills the queue,
//! reserves labs for boosts, applies the stage timeout, advances at most one
//! stage and registers the transport requests of the new stage. `run` then
//! acquires missing resources, runs reactions and records stats.
//!
//! Nothing here fails. Stalls and corrupt memory are reset to Idle and
//! logged; a reaction that cannot run this tick is logged and retried.

use crate::agents::{Agent, AgentRegistry};
use crate::core::config::PipelineConfig;
use crate::core::constants::LAB_REACTION_AMOUNT;
use crate::core::types::{ObjectId, Tick};
use crate::events::ColonyEvent;
use crate::logistics::network::ResourceNetwork;
use crate::logistics::requests::{RequestSpec, TransportRequestGroup};
use crate::priorities::Priority;
use crate::production::boosts::{boost_amount, LabReservation, QueuedBoost};
use crate::production::layout::LabLayout;
use crate::production::memory::{ChamberMemory, Reaction};
use crate::production::planner::{missing_basic_minerals, missing_reagents, ReactionPlanner};
use crate::production::status::PipelineStatus;
use crate::stats::{rolling_average, Stats};
use crate::world::entity::Entity;
use crate::world::resources::ResourceType;
use crate::world::store::Store;
use crate::world::{WorldActions, WorldView};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// What the pipeline reads and writes during one tick
pub struct PipelineContext<'a> {
    pub world: &'a mut dyn WorldActions,
    pub agents: &'a AgentRegistry,
    /// Colony holdings: storage, terminal and labs
    pub holdings: &'a Store,
    pub requests: &'a mut TransportRequestGroup,
    pub network: &'a mut dyn ResourceNetwork,
    pub stats: &'a mut Stats,
    pub events: &'a mut Vec<ColonyEvent>,
}

#[derive(Debug, Clone)]
pub struct ProductionPipeline {
    colony: String,
    terminal: Option<ObjectId>,
    layout: LabLayout,
    config: PipelineConfig,
    /// Product labs left after this tick's boost reservations
    product_labs: Vec<ObjectId>,
    reservations: BTreeMap<ObjectId, LabReservation>,
    needed_boosts: BTreeMap<ResourceType, u32>,
}

fn lab_entity<W: WorldView + ?Sized>(world: &W, id: ObjectId) -> Option<Entity> {
    world.object(id).filter(Entity::is_lab)
}

fn mineral_amount(lab: Option<&Entity>) -> u32 {
    lab.and_then(Entity::as_lab).map_or(0, |state| state.mineral_amount)
}

impl ProductionPipeline {
    pub fn new(
        colony: &str,
        terminal: Option<ObjectId>,
        layout: LabLayout,
        config: PipelineConfig,
    ) -> Self {
        let product_labs = layout.product_labs.clone();
        Self {
            colony: colony.to_string(),
            terminal,
            layout,
            config,
            product_labs,
            reservations: BTreeMap::new(),
            needed_boosts: BTreeMap::new(),
        }
    }

    pub fn layout(&self) -> &LabLayout {
        &self.layout
    }

    pub fn terminal(&self) -> Option<ObjectId> {
        self.terminal
    }

    /// Labs available for production this tick
    pub fn product_labs(&self) -> &[ObjectId] {
        &self.product_labs
    }

    pub fn reservation(&self, lab: ObjectId) -> Option<&LabReservation> {
        self.reservations.get(&lab)
    }

    pub fn reservations(&self) -> impl Iterator<Item = &LabReservation> {
        self.reservations.values()
    }

    /// Boost compounds needed by every queue head this tick
    pub fn needed_boosts(&self) -> &BTreeMap<ResourceType, u32> {
        &self.needed_boosts
    }

    // Boost requests

    /// Queue `agent` for a `resource` boost at `lab`
    ///
    /// Reagent labs never serve boosts and repeated requests are ignored;
    /// both return false.
    pub fn request_boost(
        &self,
        memory: &mut ChamberMemory,
        lab: ObjectId,
        resource: ResourceType,
        agent: &Agent,
    ) -> bool {
        if !self.layout.labs.contains(&lab)
            || self.layout.is_reagent_lab(lab)
            || resource.boosted_part().is_none()
        {
            return false;
        }
        memory.boost_queues.request(lab, resource, agent)
    }

    pub fn queue_position(memory: &ChamberMemory, agent: &Agent, lab: ObjectId) -> Option<usize> {
        memory.boost_queues.position(agent.id, lab)
    }

    /// The head of `lab`'s queue has been boosted; serve the next request
    pub fn complete_boost(
        memory: &mut ChamberMemory,
        lab: ObjectId,
        agents: &AgentRegistry,
    ) -> Option<QueuedBoost> {
        memory.boost_queues.complete(lab, agents)
    }

    // Initialization

    pub fn init(
        &mut self,
        memory: &mut ChamberMemory,
        planner: &dyn ReactionPlanner,
        ctx: &mut PipelineContext<'_>,
    ) {
        let now = ctx.world.time();
        self.product_labs = self.layout.product_labs.clone();
        self.needed_boosts.clear();

        self.repair_state(memory, now, ctx.events);

        let operational = self.layout.is_operational();
        if operational {
            if memory.reaction_queue.is_empty() {
                memory.reaction_queue = planner.reaction_queue(ctx.holdings).into();
            }
            if memory.status() == Some(PipelineStatus::Idle) {
                memory.active_reaction = self.next_order(memory);
            }
        } else {
            debug!("{}: lab layout incomplete, production paused", self.colony);
        }

        self.reserve_boost_labs(memory, ctx);

        if operational {
            self.check_timeout(memory, now, ctx.events);
            self.advance(memory, now, ctx);
        }
        self.register_requests(memory, ctx);
    }

    /// Pop the next order that is actually a reaction
    fn next_order(&self, memory: &mut ChamberMemory) -> Option<Reaction> {
        while let Some(order) = memory.reaction_queue.pop_front() {
            if order.product.reagents().is_some() && order.amount > 0 {
                return Some(order);
            }
            warn!("{}: dropping invalid order {:?}", self.colony, order);
        }
        None
    }

    /// Reset to Idle when the stored status is unknown or has no order
    fn repair_state(&self, memory: &mut ChamberMemory, now: Tick, events: &mut Vec<ColonyEvent>) {
        let valid = match memory.status() {
            None => false,
            Some(PipelineStatus::Idle) => true,
            Some(_) => memory
                .active_reaction
                .is_some_and(|r| r.product.reagents().is_some()),
        };
        if valid {
            return;
        }
        warn!(
            "{}: bad lab state (status {}, active {:?}), reverting to idle",
            self.colony, memory.status, memory.active_reaction
        );
        events.push(ColonyEvent::StateRepaired {
            raw_status: memory.status,
        });
        memory.set_status(PipelineStatus::Idle, now);
        memory.active_reaction = None;
        memory.reaction_queue.clear();
    }

    fn check_timeout(&self, memory: &mut ChamberMemory, now: Tick, events: &mut Vec<ColonyEvent>) {
        let Some(status) = memory.status() else {
            return;
        };
        let Some(cap) = status.timeout(&self.config.stage_timeouts) else {
            return;
        };
        let ticks = now.saturating_sub(memory.status_tick);
        if ticks <= cap {
            return;
        }
        warn!(
            "{}: stuck in state {} for {} ticks, discarding reaction queue and reverting to idle",
            self.colony, status, ticks
        );
        events.push(ColonyEvent::Stalled { status, ticks });
        memory.set_status(PipelineStatus::Idle, now);
        memory.active_reaction = None;
        memory.reaction_queue.clear();
    }

    fn advance(&self, memory: &mut ChamberMemory, now: Tick, ctx: &mut PipelineContext<'_>) {
        let (Some(status), Some(reaction)) = (memory.status(), memory.active_reaction) else {
            return;
        };
        let Some((reagent_a, reagent_b)) = reaction.product.reagents() else {
            return;
        };
        let world = &*ctx.world;
        let reagent_labs: Vec<Option<Entity>> = self
            .layout
            .reagent_labs
            .iter()
            .map(|&id| lab_entity(world, id))
            .collect();

        let next = match status {
            PipelineStatus::Idle => {
                info!(
                    "{}: starting synthesis of {} + {} -> {}",
                    self.colony, reagent_a, reagent_b, reaction.product
                );
                ctx.events.push(ColonyEvent::ReactionStarted {
                    product: reaction.product,
                    amount: reaction.amount,
                });
                Some(PipelineStatus::AcquiringInputs)
            }
            PipelineStatus::AcquiringInputs => missing_reagents([&reaction], ctx.holdings)
                .is_empty()
                .then_some(PipelineStatus::Loading),
            PipelineStatus::Loading => {
                let loaded = reagent_labs
                    .iter()
                    .zip([reagent_a, reagent_b])
                    .all(|(lab, reagent)| {
                        lab.as_ref()
                            .and_then(Entity::as_lab)
                            .is_some_and(|state| {
                                state.mineral == Some(reagent)
                                    && state.mineral_amount >= reaction.amount
                            })
                    });
                loaded.then_some(PipelineStatus::Processing)
            }
            PipelineStatus::Processing => reagent_labs
                .iter()
                .any(|lab| mineral_amount(lab.as_ref()) < LAB_REACTION_AMOUNT)
                .then_some(PipelineStatus::Unloading),
            PipelineStatus::Unloading => {
                let empty = reagent_labs.iter().all(|lab| mineral_amount(lab.as_ref()) == 0)
                    && self
                        .product_labs
                        .iter()
                        .all(|&id| mineral_amount(lab_entity(world, id).as_ref()) == 0);
                empty.then_some(PipelineStatus::Idle)
            }
        };

        if let Some(next) = next {
            debug!("{}: lab status {} -> {}", self.colony, status, next);
            ctx.events.push(ColonyEvent::StageChanged {
                from: status,
                to: next,
            });
            memory.set_status(next, now);
        }
    }

    // Lab reservations

    /// Take labs out of the product pool for the head of their boost queue
    ///
    /// A lab is only reserved once its requester exists or stands next to
    /// it; an agent that may never be spawned does not block production.
    fn reserve_boost_labs(&mut self, memory: &mut ChamberMemory, ctx: &mut PipelineContext<'_>) {
        let previous = std::mem::take(&mut self.reservations);
        memory.boost_queues.retain_labs(&self.layout.labs);
        let labs: Vec<ObjectId> = memory.boost_queues.labs().collect();
        for lab_id in labs {
            if self.layout.is_reagent_lab(lab_id) {
                continue;
            }
            while let Some(head) = memory.boost_queues.head(lab_id) {
                if ctx.agents.get(head.requester).is_some() {
                    break;
                }
                debug!("{}: dropping boost request of missing {}", self.colony, head.requester);
                memory.boost_queues.complete(lab_id, ctx.agents);
            }
            let Some(head) = memory.boost_queues.head(lab_id).cloned() else {
                continue;
            };
            let (Some(agent), Some(lab)) =
                (ctx.agents.get(head.requester), lab_entity(&*ctx.world, lab_id))
            else {
                continue;
            };

            let amount = boost_amount(agent, head.resource);
            *self.needed_boosts.entry(head.resource).or_insert(0) += amount;
            if agent.pos.is_near_to(&lab.pos) || agent.is_spawned() {
                self.product_labs.retain(|&id| id != lab_id);
                if previous.get(&lab_id).map(|r| r.requester) != Some(agent.id) {
                    debug!("{}: reserving lab {} to boost {}", self.colony, lab_id, agent.id);
                    ctx.events.push(ColonyEvent::LabReserved {
                        lab: lab_id,
                        resource: head.resource,
                        amount,
                        requester: agent.id,
                    });
                }
                self.reservations.insert(
                    lab_id,
                    LabReservation {
                        lab: lab_id,
                        resource: head.resource,
                        amount,
                        requester: agent.id,
                    },
                );
            }
        }
    }

    // Transport requests

    fn register_requests(&self, memory: &mut ChamberMemory, ctx: &mut PipelineContext<'_>) {
        let world = &*ctx.world;
        let requests = &mut *ctx.requests;
        let status = memory.status();
        memory.lab_mineral_types.clear();

        // Energy: boosting labs first, everything else when convenient
        for id in self.layout.product_labs_non_boosting() {
            if let Some(lab) = lab_entity(world, id) {
                requests.request_input(&lab, Priority::NormalLow, RequestSpec::new(ResourceType::Energy));
            }
        }
        for &id in &self.layout.boosting_labs {
            if let Some(lab) = lab_entity(world, id) {
                requests.request_input(&lab, Priority::High, RequestSpec::new(ResourceType::Energy));
            }
        }

        match memory.active_reaction {
            Some(reaction) => {
                let unloading = status == Some(PipelineStatus::Unloading);
                let loading = status == Some(PipelineStatus::Loading);
                if let Some((reagent_a, reagent_b)) = reaction.product.reagents() {
                    for (&id, reagent) in self.layout.reagent_labs.iter().zip([reagent_a, reagent_b]) {
                        let Some(lab) = lab_entity(world, id) else {
                            continue;
                        };
                        memory.lab_mineral_types.insert(id, reagent);
                        let Some(state) = lab.as_lab() else {
                            continue;
                        };
                        let wrong = state.holds_other_than(reagent);
                        if unloading || wrong {
                            if let Some(mineral) = state.mineral {
                                requests.request_output(&lab, Priority::Normal, RequestSpec::new(mineral));
                            }
                        } else if loading && state.mineral_amount < reaction.amount {
                            requests.request_input(
                                &lab,
                                Priority::Normal,
                                RequestSpec::new(reagent)
                                    .with_amount(reaction.amount - state.mineral_amount),
                            );
                        }
                    }
                }

                for &id in &self.product_labs {
                    let Some(lab) = lab_entity(world, id) else {
                        continue;
                    };
                    memory.lab_mineral_types.insert(id, reaction.product);
                    let Some(state) = lab.as_lab() else {
                        continue;
                    };
                    let drain = (unloading && state.mineral_amount > 0)
                        || state.holds_other_than(reaction.product)
                        || state.is_full();
                    if let (true, Some(mineral)) = (drain, state.mineral) {
                        requests.request_output(&lab, Priority::NormalLow, RequestSpec::new(mineral));
                    }
                }
            }
            None => {
                // No order: every lab should be empty
                let reagent = self.layout.reagent_labs.iter().map(|&id| (id, Priority::Normal));
                let product = self.product_labs.iter().map(|&id| (id, Priority::NormalLow));
                for (id, priority) in reagent.chain(product) {
                    if let Some(lab) = lab_entity(world, id) {
                        if let Some(mineral) = lab.as_lab().and_then(|state| state.mineral) {
                            requests.request_output(&lab, priority, RequestSpec::new(mineral));
                        }
                    }
                }
            }
        }

        for reservation in self.reservations.values() {
            let Some(lab) = lab_entity(world, reservation.lab) else {
                continue;
            };
            memory
                .lab_mineral_types
                .insert(reservation.lab, reservation.resource);
            let Some(state) = lab.as_lab() else {
                continue;
            };
            match state.mineral {
                Some(mineral) if state.holds_other_than(reservation.resource) => {
                    requests.request_output(&lab, Priority::NormalHigh, RequestSpec::new(mineral));
                }
                _ => {
                    requests.request_input(
                        &lab,
                        Priority::NormalHigh,
                        RequestSpec::new(reservation.resource)
                            .with_amount(reservation.amount.saturating_sub(state.mineral_amount)),
                    );
                }
            }
        }
    }

    // Operation

    pub fn run(&mut self, memory: &mut ChamberMemory, ctx: &mut PipelineContext<'_>) {
        self.acquire_resources(memory, ctx);

        let processing = memory.status() == Some(PipelineStatus::Processing);
        if let (true, true, Some(reaction)) =
            (self.layout.is_operational(), processing, memory.active_reaction)
        {
            self.run_reactions(memory, reaction, ctx);
        }

        self.record_stats(memory, ctx);
    }

    fn acquire_resources(&self, memory: &ChamberMemory, ctx: &mut PipelineContext<'_>) {
        let Some(terminal) = self.terminal else {
            return;
        };

        for (&resource, &needed) in &self.needed_boosts {
            let shortfall = needed.saturating_sub(ctx.holdings.get(resource));
            if shortfall > 0 {
                ctx.network
                    .request_resource(terminal, resource, shortfall, true, Some(0));
                ctx.events.push(ColonyEvent::ResourceRequested {
                    resource,
                    amount: shortfall,
                    urgent: true,
                });
            }
        }

        // The active order still counts while its inputs are being gathered
        let acquiring = memory.status() == Some(PipelineStatus::AcquiringInputs);
        let active = memory.active_reaction.filter(|_| acquiring);
        let missing = missing_basic_minerals(
            active.iter().chain(memory.reaction_queue.iter()),
            ctx.holdings,
        );
        for (resource, amount) in missing {
            ctx.network
                .request_resource(terminal, resource, amount, false, None);
            ctx.events.push(ColonyEvent::ResourceRequested {
                resource,
                amount,
                urgent: false,
            });
        }
    }

    fn run_reactions(
        &self,
        memory: &mut ChamberMemory,
        reaction: Reaction,
        ctx: &mut PipelineContext<'_>,
    ) {
        let (lab_a, lab_b) = (self.layout.reagent_labs[0], self.layout.reagent_labs[1]);
        for &lab in &self.product_labs {
            let ready = lab_entity(&*ctx.world, lab)
                .and_then(|e| e.as_lab().map(|state| state.cooldown == 0))
                .unwrap_or(false);
            if !ready {
                continue;
            }
            match ctx.world.run_reaction(lab, lab_a, lab_b) {
                Ok(_) => {
                    *memory
                        .stats
                        .total_production
                        .entry(reaction.product)
                        .or_insert(0) += LAB_REACTION_AMOUNT;
                    ctx.events.push(ColonyEvent::ReactionRun {
                        lab,
                        product: reaction.product,
                        amount: LAB_REACTION_AMOUNT,
                    });
                }
                Err(error) => {
                    debug!("{}: couldn't run reaction for lab {}: {}", self.colony, lab, error);
                    ctx.events.push(ColonyEvent::ReactionFailed { lab, error });
                }
            }
        }
    }

    fn record_stats(&self, memory: &mut ChamberMemory, ctx: &mut PipelineContext<'_>) {
        let prefix = format!("colonies.{}.production", self.colony);
        ctx.stats.log_map(
            &format!("{}.total_production", prefix),
            memory
                .stats
                .total_production
                .iter()
                .map(|(resource, &amount)| (resource, amount as f64)),
        );

        let busy = self
            .product_labs
            .iter()
            .filter(|&&id| {
                lab_entity(&*ctx.world, id)
                    .and_then(|e| e.as_lab().map(|state| state.cooldown > 0))
                    .unwrap_or(false)
            })
            .count();
        let usage = if self.product_labs.is_empty() {
            0.0
        } else {
            busy as f64 / self.product_labs.len() as f64
        };
        memory.stats.avg_usage =
            rolling_average(usage, memory.stats.avg_usage, self.config.usage_window);
        ctx.stats
            .log(format!("{}.avg_usage", prefix), memory.stats.avg_usage);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{AgentId, Position, Role};
    use crate::logistics::network::RequestLog;
    use crate::logistics::requests::RequestKind;
    use crate::production::planner::StockTargetPlanner;
    use crate::world::entity::{EntityKind, LabState};
    use crate::world::resources::BodyPart;
    use crate::world::sim::SimWorld;
    use ResourceType::*;

    const FLOWER: [(i32, i32); 10] = [
        (10, 10),
        (11, 11),
        (9, 10),
        (10, 9),
        (11, 9),
        (12, 10),
        (12, 11),
        (12, 12),
        (11, 12),
        (10, 11),
    ];

    struct Fixture {
        world: SimWorld,
        agents: AgentRegistry,
        requests: TransportRequestGroup,
        network: RequestLog,
        stats: Stats,
        events: Vec<ColonyEvent>,
        memory: ChamberMemory,
        planner: StockTargetPlanner,
        pipeline: ProductionPipeline,
        terminal: ObjectId,
    }

    impl Fixture {
        /// Ten labs (ids 1 to 10) and a terminal at (7, 10)
        fn new(targets: Vec<(ResourceType, u32)>) -> Self {
            let mut world = SimWorld::new();
            let labs: Vec<Entity> = FLOWER
                .iter()
                .map(|&(x, y)| {
                    let id = world.spawn(Position::new(x, y), EntityKind::Lab(LabState::default()));
                    world.object(id).unwrap()
                })
                .collect();
            let terminal_pos = Position::new(7, 10);
            let terminal = world.spawn(
                terminal_pos,
                EntityKind::Terminal {
                    store: Store::new(300_000),
                },
            );
            let layout = LabLayout::from_labs(&labs, Some(terminal_pos));
            Self {
                world,
                agents: AgentRegistry::new(),
                requests: TransportRequestGroup::new(),
                network: RequestLog::new(),
                stats: Stats::new(),
                events: Vec::new(),
                memory: ChamberMemory::default(),
                planner: StockTargetPlanner::new(targets).with_batch_size(100),
                pipeline: ProductionPipeline::new("W1N1", Some(terminal), layout, PipelineConfig::default()),
                terminal,
            }
        }

        fn holdings(&self) -> Store {
            let mut holdings = Store::unbounded();
            if let Some(store) = self.world.get(self.terminal).and_then(Entity::store) {
                holdings.absorb(store);
            }
            for &id in &self.pipeline.layout().labs {
                if let Some(lab) = self.world.get(id).and_then(Entity::as_lab) {
                    if let Some(mineral) = lab.mineral {
                        holdings.add(mineral, lab.mineral_amount);
                    }
                }
            }
            holdings
        }

        fn tick(&mut self) {
            self.requests.clear();
            self.events.clear();
            let holdings = self.holdings();
            let mut ctx = PipelineContext {
                world: &mut self.world,
                agents: &self.agents,
                holdings: &holdings,
                requests: &mut self.requests,
                network: &mut self.network,
                stats: &mut self.stats,
                events: &mut self.events,
            };
            self.pipeline.init(&mut self.memory, &self.planner, &mut ctx);
            self.pipeline.run(&mut self.memory, &mut ctx);
        }
    }

    #[test]
    fn test_starts_order_then_loads_when_stocked() {
        let mut f = Fixture::new(vec![(UtriumHydride, 100)]);
        f.world.deposit(f.terminal, Utrium, 100);
        f.world.deposit(f.terminal, Hydrogen, 100);

        f.tick();
        assert_eq!(f.memory.status(), Some(PipelineStatus::AcquiringInputs));
        assert_eq!(f.memory.active_reaction, Some(Reaction::new(UtriumHydride, 100)));
        assert!(f.events.contains(&ColonyEvent::ReactionStarted {
            product: UtriumHydride,
            amount: 100
        }));

        f.world.advance();
        f.tick();
        assert_eq!(f.memory.status(), Some(PipelineStatus::Loading));
        let input = f
            .requests
            .get(ObjectId(2), RequestKind::Input, Utrium)
            .unwrap();
        assert_eq!(input.amount, 100);
        assert_eq!(input.priority, Priority::Normal);
        assert!(f.requests.get(ObjectId(1), RequestKind::Input, Hydrogen).is_some());
        assert_eq!(f.memory.lab_mineral_types.get(&ObjectId(5)), Some(&UtriumHydride));
    }

    #[test]
    fn test_missing_minerals_requested_from_network() {
        let mut f = Fixture::new(vec![(UtriumHydride, 100)]);
        f.world.deposit(f.terminal, Utrium, 40);

        f.tick();
        assert_eq!(f.memory.status(), Some(PipelineStatus::AcquiringInputs));
        assert_eq!(f.network.requested(Utrium), 60);
        assert_eq!(f.network.requested(Hydrogen), 100);
        assert!(f.network.requests().iter().all(|r| !r.urgent && r.tolerance.is_none()));
    }

    #[test]
    fn test_stage_timeout_discards_queue() {
        let mut f = Fixture::new(vec![(UtriumHydride, 100)]);
        f.memory.active_reaction = Some(Reaction::new(UtriumHydride, 100));
        f.memory.set_status(PipelineStatus::Loading, 0);
        for _ in 0..51 {
            f.world.advance();
        }

        f.tick();
        assert_eq!(f.memory.status(), Some(PipelineStatus::Idle));
        assert_eq!(f.memory.status_tick, 51);
        assert!(f.memory.active_reaction.is_none());
        assert!(f.memory.reaction_queue.is_empty());
        assert!(f.events.contains(&ColonyEvent::Stalled {
            status: PipelineStatus::Loading,
            ticks: 51
        }));
    }

    #[test]
    fn test_dwell_at_cap_is_not_a_stall() {
        let mut f = Fixture::new(vec![]);
        f.memory.active_reaction = Some(Reaction::new(UtriumHydride, 100));
        f.memory.set_status(PipelineStatus::Loading, 0);
        for _ in 0..50 {
            f.world.advance();
        }

        f.tick();
        assert_eq!(f.memory.status(), Some(PipelineStatus::Loading));
    }

    #[test]
    fn test_corrupt_state_is_repaired() {
        let mut f = Fixture::new(vec![]);
        f.memory.status = 9;
        f.memory.reaction_queue.push_back(Reaction::new(Hydroxide, 50));

        f.tick();
        assert_eq!(f.memory.status(), Some(PipelineStatus::Idle));
        assert!(f.events.contains(&ColonyEvent::StateRepaired { raw_status: 9 }));

        // Processing without an order
        f.memory.set_status(PipelineStatus::Processing, 1);
        f.memory.active_reaction = None;
        f.tick();
        assert_eq!(f.memory.status(), Some(PipelineStatus::Idle));
        assert!(f.memory.reaction_queue.is_empty());
    }

    #[test]
    fn test_processing_runs_reactions_and_logs_stats() {
        let mut f = Fixture::new(vec![]);
        f.world.deposit(ObjectId(2), Utrium, 100);
        f.world.deposit(ObjectId(1), Hydrogen, 100);
        f.memory.active_reaction = Some(Reaction::new(UtriumHydride, 100));
        f.memory.set_status(PipelineStatus::Processing, 0);

        f.tick();
        let runs = f
            .events
            .iter()
            .filter(|e| matches!(e, ColonyEvent::ReactionRun { .. }))
            .count();
        assert_eq!(runs, 8);
        assert_eq!(f.memory.stats.total_production.get(&UtriumHydride), Some(&40));
        assert_eq!(
            f.stats.get("colonies.W1N1.production.total_production.UH"),
            Some(40.0)
        );
        assert_eq!(f.stats.get("colonies.W1N1.production.avg_usage"), Some(1.0));

        // Every lab is cooling down now; nothing runs and nothing fails
        f.tick();
        assert!(!f.events.iter().any(|e| matches!(e, ColonyEvent::ReactionFailed { .. })));
        assert_eq!(f.memory.stats.total_production.get(&UtriumHydride), Some(&40));
    }

    #[test]
    fn test_processing_ends_when_reagents_run_low() {
        let mut f = Fixture::new(vec![]);
        f.world.deposit(ObjectId(2), Utrium, 4);
        f.world.deposit(ObjectId(1), Hydrogen, 100);
        f.memory.active_reaction = Some(Reaction::new(UtriumHydride, 100));
        f.memory.set_status(PipelineStatus::Processing, 0);

        f.tick();
        assert_eq!(f.memory.status(), Some(PipelineStatus::Unloading));
        assert!(f.requests.get(ObjectId(2), RequestKind::Output, Utrium).is_some());
        assert!(f.requests.get(ObjectId(1), RequestKind::Output, Hydrogen).is_some());
    }

    #[test]
    fn test_unloading_waits_for_empty_labs() {
        let mut f = Fixture::new(vec![]);
        f.world.deposit(ObjectId(5), UtriumHydride, 20);
        f.memory.active_reaction = Some(Reaction::new(UtriumHydride, 100));
        f.memory.set_status(PipelineStatus::Unloading, 0);

        f.tick();
        assert_eq!(f.memory.status(), Some(PipelineStatus::Unloading));
        let output = f
            .requests
            .get(ObjectId(5), RequestKind::Output, UtriumHydride)
            .unwrap();
        assert_eq!(output.priority, Priority::NormalLow);

        f.world.transfer(ObjectId(5), f.terminal, UtriumHydride, 20);
        f.tick();
        assert_eq!(f.memory.status(), Some(PipelineStatus::Idle));
    }

    #[test]
    fn test_boost_reserves_lab_and_requests_compound() {
        let mut f = Fixture::new(vec![]);
        let agent = Agent::new(AgentId(1), Role::Upgrader, Position::new(20, 20))
            .with_body(&[BodyPart::Work, BodyPart::Work, BodyPart::Move]);
        f.agents.add(agent.clone());

        assert!(!f
            .pipeline
            .request_boost(&mut f.memory, ObjectId(2), LemergiumHydride, &agent));
        assert!(!f
            .pipeline
            .request_boost(&mut f.memory, ObjectId(3), Utrium, &agent));
        assert!(f
            .pipeline
            .request_boost(&mut f.memory, ObjectId(3), LemergiumHydride, &agent));
        assert!(!f
            .pipeline
            .request_boost(&mut f.memory, ObjectId(3), LemergiumHydride, &agent));

        f.tick();
        assert!(!f.pipeline.product_labs().contains(&ObjectId(3)));
        let reservation = f.pipeline.reservation(ObjectId(3)).unwrap();
        assert_eq!(reservation.amount, 60);
        assert_eq!(reservation.requester, AgentId(1));
        let input = f
            .requests
            .get(ObjectId(3), RequestKind::Input, LemergiumHydride)
            .unwrap();
        assert_eq!((input.amount, input.priority), (60, Priority::NormalHigh));
        assert_eq!(f.memory.lab_mineral_types.get(&ObjectId(3)), Some(&LemergiumHydride));

        let urgent = &f.network.requests()[0];
        assert_eq!((urgent.resource, urgent.amount), (LemergiumHydride, 60));
        assert!(urgent.urgent);
        assert_eq!(urgent.tolerance, Some(0));
        assert_eq!(
            f.events
                .iter()
                .filter(|e| matches!(e, ColonyEvent::LabReserved { .. }))
                .count(),
            1
        );

        // Still reserved next tick, but not announced again
        f.tick();
        assert!(f.pipeline.reservation(ObjectId(3)).is_some());
        assert!(!f.events.iter().any(|e| matches!(e, ColonyEvent::LabReserved { .. })));
    }

    #[test]
    fn test_unspawned_requester_far_away_does_not_reserve() {
        let mut f = Fixture::new(vec![]);
        let agent = Agent::new(AgentId(1), Role::Upgrader, Position::new(20, 20))
            .with_body(&[BodyPart::Work])
            .spawning(30);
        f.agents.add(agent.clone());
        f.pipeline
            .request_boost(&mut f.memory, ObjectId(3), LemergiumHydride, &agent);

        f.tick();
        assert!(f.pipeline.reservation(ObjectId(3)).is_none());
        assert!(f.pipeline.product_labs().contains(&ObjectId(3)));
        // The compound is still stocked ahead of time
        assert_eq!(f.pipeline.needed_boosts().get(&LemergiumHydride), Some(&30));
    }

    #[test]
    fn test_vanished_requester_is_dropped() {
        let mut f = Fixture::new(vec![]);
        let agent = Agent::new(AgentId(7), Role::Upgrader, Position::new(8, 10))
            .with_body(&[BodyPart::Work]);
        f.pipeline
            .request_boost(&mut f.memory, ObjectId(3), LemergiumHydride, &agent);

        f.tick();
        assert!(f.pipeline.reservation(ObjectId(3)).is_none());
        assert!(f.memory.boost_queues.head(ObjectId(3)).is_none());
    }

    #[test]
    fn test_idle_labs_are_drained_and_energised() {
        let mut f = Fixture::new(vec![]);
        f.world.deposit(ObjectId(1), Oxygen, 10);
        f.world.deposit(ObjectId(6), Hydroxide, 10);

        f.tick();
        assert_eq!(f.memory.status(), Some(PipelineStatus::Idle));
        assert!(f.requests.get(ObjectId(1), RequestKind::Output, Oxygen).is_some());
        assert!(f.requests.get(ObjectId(6), RequestKind::Output, Hydroxide).is_some());
        let boosting = f.requests.get(ObjectId(3), RequestKind::Input, Energy).unwrap();
        assert_eq!(boosting.priority, Priority::High);
        let product = f.requests.get(ObjectId(6), RequestKind::Input, Energy).unwrap();
        assert_eq!(product.priority, Priority::NormalLow);
    }
}
