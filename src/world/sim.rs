//! In-memory world used by the demo runner and the test suites
//!
//! `SimWorld` implements just enough of the external simulation for the core
//! to be driven end to end: object lookup, lab reactions, and an instant
//! hauler that services a transport request group from a depot.

use crate::core::constants::{
    LAB_BOOST_ENERGY, LAB_BOOST_MINERAL, LAB_REACTION_AMOUNT, LAB_REACTION_COOLDOWN,
    LAB_REACTION_RANGE,
};
use crate::core::types::{ObjectId, Position, RoomCoord, Tick};
use crate::logistics::requests::{RequestKind, TransportRequestGroup};
use crate::world::entity::{Entity, EntityKind};
use crate::world::resources::{reaction_product, ResourceType};
use crate::world::{ReactionError, WorldActions, WorldView};
use ahash::{AHashMap, AHashSet};

#[derive(Debug, Clone, Default)]
pub struct SimWorld {
    time: Tick,
    next_id: u32,
    objects: AHashMap<ObjectId, Entity>,
    walls: AHashSet<Position>,
}

impl SimWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a new object and return its id
    pub fn spawn(&mut self, pos: Position, kind: EntityKind) -> ObjectId {
        self.next_id += 1;
        let id = ObjectId(self.next_id);
        self.objects.insert(id, Entity::new(id, pos, kind));
        id
    }

    pub fn destroy(&mut self, id: ObjectId) -> Option<Entity> {
        self.objects.remove(&id)
    }

    pub fn get(&self, id: ObjectId) -> Option<&Entity> {
        self.objects.get(&id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut Entity> {
        self.objects.get_mut(&id)
    }

    pub fn add_wall(&mut self, pos: Position) {
        self.walls.insert(pos);
    }

    /// Move to the next tick: cooldowns tick down
    pub fn advance(&mut self) {
        self.time += 1;
        for entity in self.objects.values_mut() {
            if let EntityKind::Lab(lab) = &mut entity.kind {
                lab.cooldown = lab.cooldown.saturating_sub(1);
            }
        }
    }

    /// Move up to `amount` of `resource` between two objects, returns amount moved
    pub fn transfer(&mut self, from: ObjectId, to: ObjectId, resource: ResourceType, amount: u32) -> u32 {
        let (Some(source), Some(target)) = (self.objects.get(&from), self.objects.get(&to)) else {
            return 0;
        };
        let movable = amount
            .min(source.amount_of(resource))
            .min(target.free_capacity(resource));
        if movable == 0 {
            return 0;
        }
        let taken = self.take(from, resource, movable);
        self.give(to, resource, taken)
    }

    fn take(&mut self, id: ObjectId, resource: ResourceType, amount: u32) -> u32 {
        let Some(entity) = self.objects.get_mut(&id) else {
            return 0;
        };
        match &mut entity.kind {
            EntityKind::Container { store }
            | EntityKind::Storage { store }
            | EntityKind::Terminal { store } => store.remove(resource, amount),
            EntityKind::Link { energy, .. } | EntityKind::Source { energy, .. }
                if resource == ResourceType::Energy =>
            {
                let taken = amount.min(*energy);
                *energy -= taken;
                taken
            }
            EntityKind::Dropped {
                resource: dropped,
                amount: held,
            } if *dropped == resource => {
                let taken = amount.min(*held);
                *held -= taken;
                taken
            }
            EntityKind::Lab(lab) => {
                if resource == ResourceType::Energy {
                    let taken = amount.min(lab.energy);
                    lab.energy -= taken;
                    taken
                } else if lab.mineral == Some(resource) {
                    let taken = amount.min(lab.mineral_amount);
                    lab.mineral_amount -= taken;
                    if lab.mineral_amount == 0 {
                        lab.mineral = None;
                    }
                    taken
                } else {
                    0
                }
            }
            _ => 0,
        }
    }

    fn give(&mut self, id: ObjectId, resource: ResourceType, amount: u32) -> u32 {
        let Some(entity) = self.objects.get_mut(&id) else {
            return 0;
        };
        match &mut entity.kind {
            EntityKind::Container { store }
            | EntityKind::Storage { store }
            | EntityKind::Terminal { store } => store.add(resource, amount),
            EntityKind::Link { energy, capacity } if resource == ResourceType::Energy => {
                let given = amount.min(capacity.saturating_sub(*energy));
                *energy += given;
                given
            }
            EntityKind::Lab(lab) => {
                if resource == ResourceType::Energy {
                    let given = amount.min(lab.energy_capacity.saturating_sub(lab.energy));
                    lab.energy += given;
                    given
                } else if lab.mineral.is_none() || lab.mineral == Some(resource) {
                    let given = amount.min(lab.mineral_capacity.saturating_sub(lab.mineral_amount));
                    if given > 0 {
                        lab.mineral = Some(resource);
                        lab.mineral_amount += given;
                    }
                    given
                } else {
                    0
                }
            }
            _ => 0,
        }
    }

    /// Remove resources from an object to outside the colony, returns amount removed
    pub fn withdraw(&mut self, id: ObjectId, resource: ResourceType, amount: u32) -> u32 {
        self.take(id, resource, amount)
    }

    /// Add resources to an object from outside the colony, returns amount stored
    pub fn deposit(&mut self, id: ObjectId, resource: ResourceType, amount: u32) -> u32 {
        self.give(id, resource, amount)
    }

    /// Service every request in the group against `depot` in one step
    ///
    /// Outputs are drained before inputs are filled, so a lab holding the
    /// wrong mineral is emptied before the right one arrives.
    pub fn instant_haul(&mut self, requests: &TransportRequestGroup, depot: ObjectId) -> u32 {
        let mut moved = 0;
        for request in requests.outputs() {
            debug_assert_eq!(request.kind, RequestKind::Output);
            moved += self.transfer(request.target, depot, request.resource, request.amount);
        }
        for request in requests.inputs() {
            moved += self.transfer(depot, request.target, request.resource, request.amount);
        }
        moved
    }

    fn lab_mineral(&self, id: ObjectId) -> Option<(Position, Option<ResourceType>, u32)> {
        self.objects
            .get(&id)
            .and_then(|e| e.as_lab().map(|lab| (e.pos, lab.mineral, lab.mineral_amount)))
    }
}

impl WorldView for SimWorld {
    fn time(&self) -> Tick {
        self.time
    }

    fn object(&self, id: ObjectId) -> Option<Entity> {
        self.objects.get(&id).cloned()
    }

    fn objects_in_room(&self, room: RoomCoord) -> Vec<Entity> {
        let mut found: Vec<Entity> = self
            .objects
            .values()
            .filter(|e| e.pos.room() == room)
            .cloned()
            .collect();
        found.sort_by_key(|e| e.id);
        found
    }

    fn is_walkable(&self, pos: Position) -> bool {
        !self.walls.contains(&pos)
    }
}

impl WorldActions for SimWorld {
    fn run_reaction(
        &mut self,
        lab: ObjectId,
        reagent_a: ObjectId,
        reagent_b: ObjectId,
    ) -> Result<u32, ReactionError> {
        let target = self
            .objects
            .get(&lab)
            .and_then(|e| e.as_lab().map(|state| (e.pos, state.clone())))
            .ok_or(ReactionError::InvalidTarget(lab))?;
        let (lab_pos, state) = target;
        if state.cooldown > 0 {
            return Err(ReactionError::Cooldown(state.cooldown));
        }

        let (pos_a, mineral_a, amount_a) = self
            .lab_mineral(reagent_a)
            .ok_or(ReactionError::InvalidTarget(reagent_a))?;
        let (pos_b, mineral_b, amount_b) = self
            .lab_mineral(reagent_b)
            .ok_or(ReactionError::InvalidTarget(reagent_b))?;
        if !lab_pos.in_range_to(&pos_a, LAB_REACTION_RANGE)
            || !lab_pos.in_range_to(&pos_b, LAB_REACTION_RANGE)
        {
            return Err(ReactionError::NotInRange);
        }
        if amount_a < LAB_REACTION_AMOUNT || amount_b < LAB_REACTION_AMOUNT {
            return Err(ReactionError::NotEnoughReagents);
        }
        let (Some(a), Some(b)) = (mineral_a, mineral_b) else {
            return Err(ReactionError::NotEnoughReagents);
        };
        let product = reaction_product(a, b).ok_or(ReactionError::InvalidReagents)?;
        if state.holds_other_than(product)
            || state.mineral_amount + LAB_REACTION_AMOUNT > state.mineral_capacity
        {
            return Err(ReactionError::Full);
        }

        self.take(reagent_a, a, LAB_REACTION_AMOUNT);
        self.take(reagent_b, b, LAB_REACTION_AMOUNT);
        self.give(lab, product, LAB_REACTION_AMOUNT);
        if let Some(EntityKind::Lab(state)) = self.objects.get_mut(&lab).map(|e| &mut e.kind) {
            state.cooldown = LAB_REACTION_COOLDOWN;
        }
        Ok(LAB_REACTION_AMOUNT)
    }

    fn boost_from_lab(
        &mut self,
        lab: ObjectId,
        compound: ResourceType,
        amount: u32,
    ) -> Result<u32, ReactionError> {
        let state = self
            .objects
            .get(&lab)
            .and_then(|e| e.as_lab().cloned())
            .ok_or(ReactionError::InvalidTarget(lab))?;
        let energy = amount / LAB_BOOST_MINERAL * LAB_BOOST_ENERGY;
        if state.mineral != Some(compound) || state.mineral_amount < amount || state.energy < energy {
            return Err(ReactionError::NotEnoughBoost(compound));
        }
        self.take(lab, compound, amount);
        self.take(lab, ResourceType::Energy, energy);
        Ok(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::entity::LabState;
    use crate::world::store::Store;

    fn reaction_setup() -> (SimWorld, ObjectId, ObjectId, ObjectId) {
        let mut world = SimWorld::new();
        let a = world.spawn(
            Position::new(10, 10),
            EntityKind::Lab(LabState::default().with_mineral(ResourceType::Utrium, 10)),
        );
        let b = world.spawn(
            Position::new(11, 10),
            EntityKind::Lab(LabState::default().with_mineral(ResourceType::Hydrogen, 10)),
        );
        let product = world.spawn(Position::new(12, 11), EntityKind::Lab(LabState::default()));
        (world, a, b, product)
    }

    #[test]
    fn test_run_reaction_moves_minerals() {
        let (mut world, a, b, product) = reaction_setup();

        assert_eq!(world.run_reaction(product, a, b), Ok(LAB_REACTION_AMOUNT));
        let lab = world.get(product).and_then(|e| e.as_lab()).unwrap();
        assert_eq!(lab.mineral, Some(ResourceType::UtriumHydride));
        assert_eq!(lab.mineral_amount, 5);
        assert_eq!(lab.cooldown, LAB_REACTION_COOLDOWN);
        assert_eq!(world.get(a).unwrap().amount_of(ResourceType::Utrium), 5);
    }

    #[test]
    fn test_run_reaction_respects_cooldown() {
        let (mut world, a, b, product) = reaction_setup();
        world.run_reaction(product, a, b).unwrap();
        assert_eq!(
            world.run_reaction(product, a, b),
            Err(ReactionError::Cooldown(LAB_REACTION_COOLDOWN))
        );
        for _ in 0..LAB_REACTION_COOLDOWN {
            world.advance();
        }
        assert!(world.run_reaction(product, a, b).is_ok());
        // Both reagent labs are now empty
        assert_eq!(world.get(a).and_then(|e| e.as_lab()).unwrap().mineral, None);
    }

    #[test]
    fn test_boost_spends_compound_and_energy() {
        let mut world = SimWorld::new();
        let lab = world.spawn(
            Position::new(5, 5),
            EntityKind::Lab(
                LabState::default()
                    .with_mineral(ResourceType::GhodiumHydride, 100)
                    .with_energy(100),
            ),
        );
        assert_eq!(world.boost_from_lab(lab, ResourceType::GhodiumHydride, 90), Ok(90));
        let state = world.get(lab).and_then(|e| e.as_lab()).unwrap();
        assert_eq!(state.mineral_amount, 10);
        assert_eq!(state.energy, 40);
        assert_eq!(
            world.boost_from_lab(lab, ResourceType::GhodiumHydride, 30),
            Err(ReactionError::NotEnoughBoost(ResourceType::GhodiumHydride))
        );
    }

    #[test]
    fn test_transfer_limited_by_target_space() {
        let mut world = SimWorld::new();
        let storage = world.spawn(
            Position::new(0, 0),
            EntityKind::Storage {
                store: Store::new(10_000).with(ResourceType::Energy, 5_000),
            },
        );
        let link = world.spawn(
            Position::new(1, 0),
            EntityKind::Link {
                energy: 700,
                capacity: 800,
            },
        );
        assert_eq!(world.transfer(storage, link, ResourceType::Energy, 500), 100);
        assert_eq!(world.get(storage).unwrap().amount_of(ResourceType::Energy), 4_900);
    }

    #[test]
    fn test_objects_in_room_filters_by_room() {
        let mut world = SimWorld::new();
        world.spawn(Position::new(5, 5), EntityKind::Road { hits: 10, hits_max: 100 });
        world.spawn(Position::new(55, 5), EntityKind::Road { hits: 10, hits_max: 100 });
        assert_eq!(world.objects_in_room(RoomCoord::new(0, 0)).len(), 1);
        assert_eq!(world.objects_in_room(RoomCoord::new(1, 0)).len(), 1);
        assert!(world.objects_in_room(RoomCoord::new(2, 0)).is_empty());
    }
}
