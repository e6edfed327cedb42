//! Resource types and the reaction/boost tables
//!
//! Reactions combine two reagents into one product. Boosts apply a compound
//! to a specific body part of an agent.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Every resource the core schedules
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    #[serde(rename = "energy")]
    Energy,

    // Base minerals
    #[serde(rename = "H")]
    Hydrogen,
    #[serde(rename = "O")]
    Oxygen,
    #[serde(rename = "U")]
    Utrium,
    #[serde(rename = "L")]
    Lemergium,
    #[serde(rename = "K")]
    Keanium,
    #[serde(rename = "Z")]
    Zynthium,
    #[serde(rename = "X")]
    Catalyst,

    // Base compounds
    #[serde(rename = "OH")]
    Hydroxide,
    #[serde(rename = "ZK")]
    ZynthiumKeanite,
    #[serde(rename = "UL")]
    UtriumLemergite,
    #[serde(rename = "G")]
    Ghodium,

    // Tier 1
    #[serde(rename = "UH")]
    UtriumHydride,
    #[serde(rename = "UO")]
    UtriumOxide,
    #[serde(rename = "KH")]
    KeaniumHydride,
    #[serde(rename = "KO")]
    KeaniumOxide,
    #[serde(rename = "LH")]
    LemergiumHydride,
    #[serde(rename = "LO")]
    LemergiumOxide,
    #[serde(rename = "ZH")]
    ZynthiumHydride,
    #[serde(rename = "ZO")]
    ZynthiumOxide,
    #[serde(rename = "GH")]
    GhodiumHydride,
    #[serde(rename = "GO")]
    GhodiumOxide,

    // Tier 2
    #[serde(rename = "UH2O")]
    UtriumAcid,
    #[serde(rename = "UHO2")]
    UtriumAlkalide,
    #[serde(rename = "KH2O")]
    KeaniumAcid,
    #[serde(rename = "KHO2")]
    KeaniumAlkalide,
    #[serde(rename = "LH2O")]
    LemergiumAcid,
    #[serde(rename = "LHO2")]
    LemergiumAlkalide,
    #[serde(rename = "ZH2O")]
    ZynthiumAcid,
    #[serde(rename = "ZHO2")]
    ZynthiumAlkalide,
    #[serde(rename = "GH2O")]
    GhodiumAcid,
    #[serde(rename = "GHO2")]
    GhodiumAlkalide,

    // Tier 3
    #[serde(rename = "XUH2O")]
    CatalyzedUtriumAcid,
    #[serde(rename = "XUHO2")]
    CatalyzedUtriumAlkalide,
    #[serde(rename = "XKH2O")]
    CatalyzedKeaniumAcid,
    #[serde(rename = "XKHO2")]
    CatalyzedKeaniumAlkalide,
    #[serde(rename = "XLH2O")]
    CatalyzedLemergiumAcid,
    #[serde(rename = "XLHO2")]
    CatalyzedLemergiumAlkalide,
    #[serde(rename = "XZH2O")]
    CatalyzedZynthiumAcid,
    #[serde(rename = "XZHO2")]
    CatalyzedZynthiumAlkalide,
    #[serde(rename = "XGH2O")]
    CatalyzedGhodiumAcid,
    #[serde(rename = "XGHO2")]
    CatalyzedGhodiumAlkalide,
}

/// Agent body parts that boosts can apply to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyPart {
    Move,
    Work,
    Carry,
    Attack,
    RangedAttack,
    Heal,
    Claim,
    Tough,
}

impl ResourceType {
    pub const BASE_MINERALS: [ResourceType; 7] = [
        ResourceType::Hydrogen,
        ResourceType::Oxygen,
        ResourceType::Utrium,
        ResourceType::Lemergium,
        ResourceType::Keanium,
        ResourceType::Zynthium,
        ResourceType::Catalyst,
    ];

    /// Short symbol as used by the world API
    pub fn symbol(&self) -> &'static str {
        use ResourceType::*;
        match self {
            Energy => "energy",
            Hydrogen => "H",
            Oxygen => "O",
            Utrium => "U",
            Lemergium => "L",
            Keanium => "K",
            Zynthium => "Z",
            Catalyst => "X",
            Hydroxide => "OH",
            ZynthiumKeanite => "ZK",
            UtriumLemergite => "UL",
            Ghodium => "G",
            UtriumHydride => "UH",
            UtriumOxide => "UO",
            KeaniumHydride => "KH",
            KeaniumOxide => "KO",
            LemergiumHydride => "LH",
            LemergiumOxide => "LO",
            ZynthiumHydride => "ZH",
            ZynthiumOxide => "ZO",
            GhodiumHydride => "GH",
            GhodiumOxide => "GO",
            UtriumAcid => "UH2O",
            UtriumAlkalide => "UHO2",
            KeaniumAcid => "KH2O",
            KeaniumAlkalide => "KHO2",
            LemergiumAcid => "LH2O",
            LemergiumAlkalide => "LHO2",
            ZynthiumAcid => "ZH2O",
            ZynthiumAlkalide => "ZHO2",
            GhodiumAcid => "GH2O",
            GhodiumAlkalide => "GHO2",
            CatalyzedUtriumAcid => "XUH2O",
            CatalyzedUtriumAlkalide => "XUHO2",
            CatalyzedKeaniumAcid => "XKH2O",
            CatalyzedKeaniumAlkalide => "XKHO2",
            CatalyzedLemergiumAcid => "XLH2O",
            CatalyzedLemergiumAlkalide => "XLHO2",
            CatalyzedZynthiumAcid => "XZH2O",
            CatalyzedZynthiumAlkalide => "XZHO2",
            CatalyzedGhodiumAcid => "XGH2O",
            CatalyzedGhodiumAlkalide => "XGHO2",
        }
    }

    pub fn is_base_mineral(&self) -> bool {
        Self::BASE_MINERALS.contains(self)
    }

    /// The two reagents that react into this compound, if it is one
    pub fn reagents(&self) -> Option<(ResourceType, ResourceType)> {
        use ResourceType::*;
        let pair = match self {
            Hydroxide => (Oxygen, Hydrogen),
            ZynthiumKeanite => (Zynthium, Keanium),
            UtriumLemergite => (Utrium, Lemergium),
            Ghodium => (ZynthiumKeanite, UtriumLemergite),
            UtriumHydride => (Utrium, Hydrogen),
            UtriumOxide => (Utrium, Oxygen),
            KeaniumHydride => (Keanium, Hydrogen),
            KeaniumOxide => (Keanium, Oxygen),
            LemergiumHydride => (Lemergium, Hydrogen),
            LemergiumOxide => (Lemergium, Oxygen),
            ZynthiumHydride => (Zynthium, Hydrogen),
            ZynthiumOxide => (Zynthium, Oxygen),
            GhodiumHydride => (Ghodium, Hydrogen),
            GhodiumOxide => (Ghodium, Oxygen),
            UtriumAcid => (UtriumHydride, Hydroxide),
            UtriumAlkalide => (UtriumOxide, Hydroxide),
            KeaniumAcid => (KeaniumHydride, Hydroxide),
            KeaniumAlkalide => (KeaniumOxide, Hydroxide),
            LemergiumAcid => (LemergiumHydride, Hydroxide),
            LemergiumAlkalide => (LemergiumOxide, Hydroxide),
            ZynthiumAcid => (ZynthiumHydride, Hydroxide),
            ZynthiumAlkalide => (ZynthiumOxide, Hydroxide),
            GhodiumAcid => (GhodiumHydride, Hydroxide),
            GhodiumAlkalide => (GhodiumOxide, Hydroxide),
            CatalyzedUtriumAcid => (UtriumAcid, Catalyst),
            CatalyzedUtriumAlkalide => (UtriumAlkalide, Catalyst),
            CatalyzedKeaniumAcid => (KeaniumAcid, Catalyst),
            CatalyzedKeaniumAlkalide => (KeaniumAlkalide, Catalyst),
            CatalyzedLemergiumAcid => (LemergiumAcid, Catalyst),
            CatalyzedLemergiumAlkalide => (LemergiumAlkalide, Catalyst),
            CatalyzedZynthiumAcid => (ZynthiumAcid, Catalyst),
            CatalyzedZynthiumAlkalide => (ZynthiumAlkalide, Catalyst),
            CatalyzedGhodiumAcid => (GhodiumAcid, Catalyst),
            CatalyzedGhodiumAlkalide => (GhodiumAlkalide, Catalyst),
            _ => return None,
        };
        Some(pair)
    }

    /// Body part this compound boosts, if it is a boost
    pub fn boosted_part(&self) -> Option<BodyPart> {
        use ResourceType::*;
        let part = match self {
            UtriumHydride | UtriumAcid | CatalyzedUtriumAcid => BodyPart::Attack,
            UtriumOxide | UtriumAlkalide | CatalyzedUtriumAlkalide => BodyPart::Work,
            KeaniumHydride | KeaniumAcid | CatalyzedKeaniumAcid => BodyPart::Carry,
            KeaniumOxide | KeaniumAlkalide | CatalyzedKeaniumAlkalide => BodyPart::RangedAttack,
            LemergiumHydride | LemergiumAcid | CatalyzedLemergiumAcid => BodyPart::Work,
            LemergiumOxide | LemergiumAlkalide | CatalyzedLemergiumAlkalide => BodyPart::Heal,
            ZynthiumHydride | ZynthiumAcid | CatalyzedZynthiumAcid => BodyPart::Work,
            ZynthiumOxide | ZynthiumAlkalide | CatalyzedZynthiumAlkalide => BodyPart::Move,
            GhodiumHydride | GhodiumAcid | CatalyzedGhodiumAcid => BodyPart::Work,
            GhodiumOxide | GhodiumAlkalide | CatalyzedGhodiumAlkalide => BodyPart::Tough,
            _ => return None,
        };
        Some(part)
    }
}

/// Product of reacting two reagents, in either order
pub fn reaction_product(a: ResourceType, b: ResourceType) -> Option<ResourceType> {
    use ResourceType::*;
    const COMPOUNDS: [ResourceType; 34] = [
        Hydroxide,
        ZynthiumKeanite,
        UtriumLemergite,
        Ghodium,
        UtriumHydride,
        UtriumOxide,
        KeaniumHydride,
        KeaniumOxide,
        LemergiumHydride,
        LemergiumOxide,
        ZynthiumHydride,
        ZynthiumOxide,
        GhodiumHydride,
        GhodiumOxide,
        UtriumAcid,
        UtriumAlkalide,
        KeaniumAcid,
        KeaniumAlkalide,
        LemergiumAcid,
        LemergiumAlkalide,
        ZynthiumAcid,
        ZynthiumAlkalide,
        GhodiumAcid,
        GhodiumAlkalide,
        CatalyzedUtriumAcid,
        CatalyzedUtriumAlkalide,
        CatalyzedKeaniumAcid,
        CatalyzedKeaniumAlkalide,
        CatalyzedLemergiumAcid,
        CatalyzedLemergiumAlkalide,
        CatalyzedZynthiumAcid,
        CatalyzedZynthiumAlkalide,
        CatalyzedGhodiumAcid,
        CatalyzedGhodiumAlkalide,
    ];
    COMPOUNDS.iter().copied().find(|product| {
        product
            .reagents()
            .map(|(x, y)| (x == a && y == b) || (x == b && y == a))
            .unwrap_or(false)
    })
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reagents_of_tier_three() {
        assert_eq!(
            ResourceType::CatalyzedGhodiumAlkalide.reagents(),
            Some((ResourceType::GhodiumAlkalide, ResourceType::Catalyst))
        );
        assert_eq!(ResourceType::Oxygen.reagents(), None);
    }

    #[test]
    fn test_reaction_product_is_symmetric() {
        use ResourceType::*;
        assert_eq!(reaction_product(Utrium, Hydrogen), Some(UtriumHydride));
        assert_eq!(reaction_product(Hydrogen, Utrium), Some(UtriumHydride));
        assert_eq!(reaction_product(Utrium, Utrium), None);
    }

    #[test]
    fn test_boosted_parts() {
        assert_eq!(ResourceType::CatalyzedGhodiumAcid.boosted_part(), Some(BodyPart::Work));
        assert_eq!(ResourceType::ZynthiumOxide.boosted_part(), Some(BodyPart::Move));
        assert_eq!(ResourceType::Hydroxide.boosted_part(), None);
    }

    #[test]
    fn test_symbols_match_serde_names() {
        let json = serde_json::to_string(&ResourceType::CatalyzedUtriumAcid).unwrap();
        assert_eq!(json, "\"XUH2O\"");
        let parsed: ResourceType = serde_json::from_str("\"ZK\"").unwrap();
        assert_eq!(parsed, ResourceType::ZynthiumKeanite);
        assert_eq!(ResourceType::ZynthiumKeanite.to_string(), "ZK");
    }

    #[test]
    fn test_base_minerals() {
        assert!(ResourceType::Catalyst.is_base_mineral());
        assert!(!ResourceType::Ghodium.is_base_mineral());
        assert!(!ResourceType::Energy.is_base_mineral());
    }
}
