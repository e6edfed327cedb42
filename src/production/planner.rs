//! Reaction planning
//!
//! A planner turns colony holdings into an ordered reaction queue. Queues are
//! dependency-first: any compound reagent an order needs is produced by an
//! earlier entry, so only base minerals ever have to be bought in.

use crate::core::constants::{LAB_MINERAL_CAPACITY, LAB_REACTION_AMOUNT};
use crate::production::memory::Reaction;
use crate::world::resources::ResourceType;
use crate::world::store::Store;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub trait ReactionPlanner {
    /// Reactions to run next, in order; empty when nothing is needed
    fn reaction_queue(&self, holdings: &Store) -> Vec<Reaction>;
}

/// Every reagent the queue consumes, by amount
pub fn required_reagents<'a>(
    queue: impl IntoIterator<Item = &'a Reaction>,
) -> BTreeMap<ResourceType, u32> {
    let mut required = BTreeMap::new();
    for reaction in queue {
        if let Some((a, b)) = reaction.product.reagents() {
            *required.entry(a).or_insert(0) += reaction.amount;
            *required.entry(b).or_insert(0) += reaction.amount;
        }
    }
    required
}

/// Reagents of the queue not covered by `holdings`; only shortfalls are listed
pub fn missing_reagents<'a>(
    queue: impl IntoIterator<Item = &'a Reaction>,
    holdings: &Store,
) -> BTreeMap<ResourceType, u32> {
    required_reagents(queue)
        .into_iter()
        .filter_map(|(resource, amount)| {
            let missing = amount.saturating_sub(holdings.get(resource));
            (missing > 0).then_some((resource, missing))
        })
        .collect()
}

/// Base minerals the queue still needs bought in
pub fn missing_basic_minerals<'a>(
    queue: impl IntoIterator<Item = &'a Reaction>,
    holdings: &Store,
) -> BTreeMap<ResourceType, u32> {
    missing_reagents(queue, holdings)
        .into_iter()
        .filter(|(resource, _)| resource.is_base_mineral())
        .collect()
}

/// Round up to whole reactions
fn whole_reactions(amount: u32) -> u32 {
    amount.div_ceil(LAB_REACTION_AMOUNT) * LAB_REACTION_AMOUNT
}

/// Keeps configured stock levels of compounds topped up
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockTargetPlanner {
    /// Compounds and the amount the colony should hold of each, in priority order
    pub targets: Vec<(ResourceType, u32)>,
    /// Largest single order
    pub batch_size: u32,
}

impl StockTargetPlanner {
    pub fn new(targets: Vec<(ResourceType, u32)>) -> Self {
        Self {
            targets,
            batch_size: LAB_MINERAL_CAPACITY,
        }
    }

    pub fn with_batch_size(mut self, batch_size: u32) -> Self {
        self.batch_size = batch_size;
        self
    }

    fn plan(&self, product: ResourceType, amount: u32, holdings: &Store, queue: &mut Vec<Reaction>, depth: u32) {
        let Some((a, b)) = product.reagents() else {
            return;
        };
        if depth > 4 {
            return;
        }
        for reagent in [a, b] {
            if reagent.reagents().is_some() {
                let missing = amount.saturating_sub(holdings.get(reagent));
                if missing > 0 {
                    self.plan(reagent, whole_reactions(missing), holdings, queue, depth + 1);
                }
            }
        }
        queue.push(Reaction::new(product, amount));
    }
}

impl ReactionPlanner for StockTargetPlanner {
    fn reaction_queue(&self, holdings: &Store) -> Vec<Reaction> {
        let mut queue = Vec::new();
        for &(product, target) in &self.targets {
            let missing = target.saturating_sub(holdings.get(product));
            if missing == 0 {
                continue;
            }
            let amount = whole_reactions(missing.min(self.batch_size));
            self.plan(product, amount, holdings, &mut queue, 0);
            break;
        }
        queue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ResourceType::*;

    #[test]
    fn test_missing_basic_minerals_ignores_compounds() {
        let queue = vec![
            Reaction::new(Hydroxide, 100),
            Reaction::new(UtriumHydride, 100),
            Reaction::new(UtriumAcid, 100),
        ];
        let holdings = Store::unbounded().with(Hydrogen, 150).with(Utrium, 20);

        let missing = missing_basic_minerals(&queue, &holdings);
        // H: 200 needed, 150 held; O: 100; U: 80 short. UH and OH are produced in-queue
        assert_eq!(missing.get(&Hydrogen), Some(&50));
        assert_eq!(missing.get(&Oxygen), Some(&100));
        assert_eq!(missing.get(&Utrium), Some(&80));
        assert!(!missing.contains_key(&UtriumHydride));
        assert!(!missing.contains_key(&Hydroxide));
    }

    #[test]
    fn test_nothing_missing_when_stocked() {
        let queue = [Reaction::new(UtriumHydride, 50)];
        let holdings = Store::unbounded().with(Hydrogen, 50).with(Utrium, 60);
        assert!(missing_reagents(&queue, &holdings).is_empty());
    }

    #[test]
    fn test_planner_builds_dependencies_first() {
        let planner = StockTargetPlanner::new(vec![(UtriumAcid, 300)]).with_batch_size(300);
        let holdings = Store::unbounded().with(UtriumHydride, 100);

        let queue = planner.reaction_queue(&holdings);
        let products: Vec<ResourceType> = queue.iter().map(|r| r.product).collect();
        assert_eq!(products, vec![UtriumHydride, Hydroxide, UtriumAcid]);
        assert_eq!(queue[0].amount, 200);
        assert_eq!(queue[1].amount, 300);
        assert_eq!(queue[2].amount, 300);
    }

    #[test]
    fn test_planner_skips_satisfied_targets_and_rounds() {
        let planner = StockTargetPlanner::new(vec![(Hydroxide, 100), (UtriumHydride, 503)]);
        let holdings = Store::unbounded().with(Hydroxide, 150);

        let queue = planner.reaction_queue(&holdings);
        assert_eq!(queue, vec![Reaction::new(UtriumHydride, 505)]);
        assert!(StockTargetPlanner::new(vec![]).reaction_queue(&holdings).is_empty());
    }
}
