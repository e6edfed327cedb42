//! Lab roles inside a colony
//!
//! - boosting lab: the lab closest to the terminal, quickest to refill
//! - reagent labs: the two labs that reach every other lab, most central first
//! - product labs: everything that is not a reagent lab (the boosting lab
//!   included, until a boost reserves it)

use crate::core::constants::LAB_REACTION_RANGE;
use crate::core::types::{ObjectId, Position};
use crate::world::entity::Entity;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabLayout {
    pub labs: Vec<ObjectId>,
    pub reagent_labs: Vec<ObjectId>,
    pub product_labs: Vec<ObjectId>,
    pub boosting_labs: Vec<ObjectId>,
}

impl LabLayout {
    pub fn from_labs(labs: &[Entity], terminal: Option<Position>) -> Self {
        let labs: Vec<&Entity> = labs.iter().filter(|e| e.is_lab()).collect();

        let boosting_labs: Vec<ObjectId> = terminal
            .and_then(|terminal| labs.iter().min_by_key(|lab| lab.pos.range_to(&terminal)))
            .map(|lab| vec![lab.id])
            .unwrap_or_default();

        let mut candidates: Vec<&Entity> = labs
            .iter()
            .copied()
            .filter(|lab| {
                labs.iter()
                    .all(|other| lab.pos.in_range_to(&other.pos, LAB_REACTION_RANGE))
            })
            .filter(|lab| !boosting_labs.contains(&lab.id))
            .collect();
        candidates.sort_by_key(|lab| std::cmp::Reverse(neighboring_labs(lab, &labs)));
        let reagent_labs: Vec<ObjectId> = candidates.iter().take(2).map(|lab| lab.id).collect();

        let product_labs = labs
            .iter()
            .map(|lab| lab.id)
            .filter(|id| !reagent_labs.contains(id))
            .collect();

        Self {
            labs: labs.iter().map(|lab| lab.id).collect(),
            reagent_labs,
            product_labs,
            boosting_labs,
        }
    }

    /// Both reagent labs exist, so reactions can run
    pub fn is_operational(&self) -> bool {
        self.reagent_labs.len() == 2 && !self.product_labs.is_empty()
    }

    pub fn is_boosting_lab(&self, lab: ObjectId) -> bool {
        self.boosting_labs.contains(&lab)
    }

    pub fn is_reagent_lab(&self, lab: ObjectId) -> bool {
        self.reagent_labs.contains(&lab)
    }

    /// Product labs that never serve boosts
    pub fn product_labs_non_boosting(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.product_labs
            .iter()
            .copied()
            .filter(|&id| !self.is_boosting_lab(id))
    }
}

fn neighboring_labs(lab: &Entity, labs: &[&Entity]) -> usize {
    labs.iter()
        .filter(|other| other.id != lab.id && lab.pos.is_near_to(&other.pos))
        .count()
}
