//! Priority ordering for transport requests and colony operations
//!
//! Two tables live here. `Priority` tiers order transport requests inside a
//! single colony. `overlord` is the total order an external spawn scheduler
//! uses across every kind of colony operation; lower numbers run first.

use serde::{Deserialize, Serialize};

/// Transport request tier; lower numeric value = more urgent
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Priority {
    Critical = 0,
    High = 1,
    NormalHigh = 2,
    Normal = 3,
    NormalLow = 4,
    Low = 5,
}

impl Priority {
    pub const ALL: [Priority; 6] = [
        Priority::Critical,
        Priority::High,
        Priority::NormalHigh,
        Priority::Normal,
        Priority::NormalLow,
        Priority::Low,
    ];

    pub fn value(self) -> u8 {
        self as u8
    }
}

/// Overlord priority table
pub mod overlord {
    pub mod emergency {
        /// Recovery from a colony-wide crash
        pub const BOOTSTRAP: u32 = 0;
    }

    pub mod core {
        pub const QUEEN: u32 = 100;
        pub const MANAGER: u32 = 101;
    }

    pub mod defense {
        pub const MELEE_DEFENSE: u32 = 200;
        pub const RANGED_DEFENSE: u32 = 201;
        pub const GUARD: u32 = 202;
        pub const REPAIR: u32 = 203;
    }

    /// Everything numbered above this is skipped during an emergency
    pub const WAR_SPAWN_CUTOFF: u32 = 299;

    /// Operations a player is usually waiting on in real time
    pub mod real_time {
        pub const CLAIM: u32 = 300;
        pub const PIONEER: u32 = 301;
        pub const CONTROLLER_ATTACK: u32 = 399;
    }

    pub mod owned_room {
        pub const FIRST_TRANSPORT: u32 = 400;
        pub const MINE: u32 = 401;
        pub const WORK: u32 = 402;
        pub const MINERAL: u32 = 403;
        pub const TRANSPORT: u32 = 404;
    }

    pub mod offense {
        pub const DESTROY: u32 = 500;
        pub const HEAL_POINT: u32 = 501;
        pub const SIEGE: u32 = 502;
    }

    pub mod upgrading {
        pub const UPGRADE: u32 = 600;
    }

    /// Time-sensitive collection such as decaying resources on the ground
    pub mod collection_urgent {
        pub const HAUL: u32 = 700;
    }

    pub mod scouting {
        pub const STATIONARY: u32 = 800;
        pub const RANDOM_WALKER: u32 = 801;
    }

    pub mod remote_room {
        pub const RESERVE: u32 = 900;
        pub const MINE: u32 = 901;
        pub const ROOM_INCREMENT: u32 = 5;
    }

    pub mod remote_sk_room {
        pub const SOURCE_REAPER: u32 = 1000;
        pub const MINERAL: u32 = 1001;
        pub const MINE: u32 = 1002;
        pub const ROOM_INCREMENT: u32 = 5;
    }

    pub mod collection {
        pub const HAUL: u32 = 1100;
    }

    /// Runs after everything else
    pub const DEFAULT: u32 = 99_999;
}

/// Named band of the overlord table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PriorityBand {
    Emergency,
    Core,
    Defense,
    RealTime,
    OwnedRoom,
    Offense,
    Upgrading,
    CollectionUrgent,
    Scouting,
    RemoteRoom,
    RemoteSkRoom,
    Collection,
    Default,
}

/// Priority of the `index`-th outpost running a remote operation
///
/// Each outpost shifts by `increment` so instances of one category keep
/// a stable relative order.
pub fn outpost_priority(base: u32, increment: u32, index: u32) -> u32 {
    base.saturating_add(increment.saturating_mul(index))
}

/// Whether a request at this priority is still serviced during an emergency
pub fn survives_emergency(priority: u32) -> bool {
    priority <= overlord::WAR_SPAWN_CUTOFF
}

/// Band a numeric priority falls in
///
/// Bands are fixed ranges, so a large enough outpost increment carries a
/// priority into the next band.
pub fn band_of(priority: u32) -> PriorityBand {
    match priority {
        0..=99 => PriorityBand::Emergency,
        100..=199 => PriorityBand::Core,
        200..=299 => PriorityBand::Defense,
        300..=399 => PriorityBand::RealTime,
        400..=499 => PriorityBand::OwnedRoom,
        500..=599 => PriorityBand::Offense,
        600..=699 => PriorityBand::Upgrading,
        700..=799 => PriorityBand::CollectionUrgent,
        800..=899 => PriorityBand::Scouting,
        900..=999 => PriorityBand::RemoteRoom,
        1000..=1099 => PriorityBand::RemoteSkRoom,
        1100..=1199 => PriorityBand::Collection,
        _ => PriorityBand::Default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_tiers_ordered_by_value() {
        for pair in Priority::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].value() < pair[1].value());
        }
        assert_eq!(Priority::Critical.value(), 0);
        assert_eq!(Priority::Low.value(), 5);
    }

    #[test]
    fn test_emergency_cutoff() {
        assert!(survives_emergency(overlord::emergency::BOOTSTRAP));
        assert!(survives_emergency(overlord::defense::REPAIR));
        assert!(!survives_emergency(overlord::real_time::CLAIM));
        assert!(!survives_emergency(overlord::DEFAULT));
    }

    #[test]
    fn test_outpost_increment_keeps_relative_order() {
        use overlord::remote_room::{MINE, RESERVE, ROOM_INCREMENT};

        let first_mine = outpost_priority(MINE, ROOM_INCREMENT, 0);
        let second_reserve = outpost_priority(RESERVE, ROOM_INCREMENT, 1);
        let second_mine = outpost_priority(MINE, ROOM_INCREMENT, 1);
        assert_eq!(second_reserve, 905);
        assert!(first_mine < second_reserve);
        assert!(second_reserve < second_mine);
        assert_eq!(band_of(second_mine), PriorityBand::RemoteRoom);
    }

    #[test]
    fn test_outpost_increment_can_cross_band() {
        use overlord::remote_room::{MINE, ROOM_INCREMENT};

        assert_eq!(outpost_priority(900, ROOM_INCREMENT, 19), 995);
        assert_eq!(band_of(outpost_priority(900, ROOM_INCREMENT, 19)), PriorityBand::RemoteRoom);
        assert_eq!(outpost_priority(900, ROOM_INCREMENT, 20), 1000);
        assert_eq!(band_of(outpost_priority(900, ROOM_INCREMENT, 20)), PriorityBand::RemoteSkRoom);
        assert_eq!(band_of(outpost_priority(MINE, ROOM_INCREMENT, 20)), PriorityBand::RemoteSkRoom);
    }

    #[test]
    fn test_bands() {
        assert_eq!(band_of(overlord::core::QUEEN), PriorityBand::Core);
        assert_eq!(band_of(overlord::WAR_SPAWN_CUTOFF), PriorityBand::Defense);
        assert_eq!(band_of(overlord::remote_sk_room::MINE), PriorityBand::RemoteSkRoom);
        assert_eq!(band_of(overlord::collection::HAUL), PriorityBand::Collection);
        assert_eq!(band_of(overlord::DEFAULT), PriorityBand::Default);
        assert!(band_of(overlord::upgrading::UPGRADE) < band_of(overlord::scouting::STATIONARY));
    }
}
