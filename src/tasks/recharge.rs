//! Recharge resolution - turn "I need energy" into a concrete task
//!
//! Every candidate is scored by how much energy the agent can realistically
//! get from it, discounted by distance:
//!
//! ```text
//! effective = clamp(amount - outflux, 0, carry_capacity) / (range + 1)
//! ```
//!
//! `outflux` is the free carry of every other agent already withdrawing from
//! or picking up at the same target, so two agents are not sent to drain an
//! object only one of them can empty.

use crate::agents::{Agent, AgentRegistry};
use crate::core::config::DispenserConfig;
use crate::core::types::Tick;
use crate::tasks::Task;
use crate::world::entity::Entity;
use crate::world::resources::ResourceType;
use crate::world::WorldView;
use ordered_float::OrderedFloat;
use tracing::debug;

/// Everything the resolver reads; nothing here is mutated
pub struct RechargeContext<'a> {
    pub tick: Tick,
    /// Energy-bearing objects the agent may draw from
    pub rechargeables: &'a [Entity],
    /// Harvestable sources for the fallback
    pub sources: &'a [Entity],
    pub agents: &'a AgentRegistry,
    pub world: &'a dyn WorldView,
    pub config: &'a DispenserConfig,
}

/// Energy `agent` can expect per tick of travel from `target`, or `None` if
/// the target is not worth considering
pub fn recharge_score(
    agent: &Agent,
    target: &Entity,
    agents: &AgentRegistry,
    min_energy: u32,
) -> Option<f64> {
    let amount = target.amount_of(ResourceType::Energy);
    if amount < min_energy {
        return None;
    }
    let outflux: u32 = agents
        .targeting(target.id)
        .filter(|other| other.id != agent.id)
        .filter(|other| other.task.as_ref().is_some_and(Task::is_resource_outflux))
        .map(Agent::free_carry)
        .sum();
    let available = amount.saturating_sub(outflux).min(agent.carry_capacity());
    let effective = available as f64 / (agent.pos.range_to(&target.pos) + 1) as f64;
    (effective > 0.0).then_some(effective)
}

/// Pick the best recharge action for `agent`
///
/// Returns `None` when nothing qualifies; the caller decides what an idle
/// agent does.
pub fn resolve_recharge(agent: &Agent, ctx: &RechargeContext<'_>, min_energy: u32) -> Option<Task> {
    // Ties keep the first candidate in listing order
    let best = ctx
        .rechargeables
        .iter()
        .filter(|target| target.is_rechargeable())
        .filter_map(|target| {
            recharge_score(agent, target, ctx.agents, min_energy)
                .map(|score| (target, OrderedFloat(score)))
        })
        .rev()
        .max_by_key(|(_, score)| *score)
        .map(|(target, _)| target);

    let too_far = best.map_or(true, |target| {
        agent.pos.range_to(&target.pos) > ctx.config.max_recharge_range
    });
    if too_far && agent.can_harvest() && agent.role != ctx.config.non_harvesting_role {
        if let Some(source) = closest_available_source(agent, ctx) {
            return Some(Task::harvest(source, ctx.tick));
        }
    }

    match best {
        Some(target) if target.is_dropped() => Some(Task::pickup(target, ctx.tick)),
        Some(target) => Some(Task::withdraw(target, ctx.tick)),
        None => {
            debug!("No valid recharge target for {} ({:?})", agent.id, agent.role);
            None
        }
    }
}

/// Closest source with at least one free tile next to it; agents block tiles
fn closest_available_source<'a>(agent: &Agent, ctx: &RechargeContext<'a>) -> Option<&'a Entity> {
    ctx.sources
        .iter()
        .filter(|source| {
            source
                .pos
                .neighbors()
                .any(|tile| ctx.world.is_walkable(tile) && !ctx.agents.occupied(tile))
        })
        .min_by_key(|source| agent.pos.range_to(&source.pos))
}
