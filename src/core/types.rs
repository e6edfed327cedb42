//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;

/// World tick counter (scheduling time unit)
pub type Tick = u64;

/// Width and height of a room in tiles
pub const ROOM_SIZE: i32 = 50;

/// Stable identity of a world object
///
/// Handles returned by the world are only valid for the tick they were
/// fetched on; the id is what survives across ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Unique identifier for agents
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(pub u32);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent-{}", self.0)
    }
}

/// Room coordinate on the world map
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoomCoord {
    pub x: i32,
    pub y: i32,
}

impl RoomCoord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for RoomCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", self.x, self.y)
    }
}

/// Tile position in world coordinates
///
/// World coordinates span rooms, so ranges between positions in different
/// rooms are meaningful without a separate room lookup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chebyshev distance, the number of moves between two tiles
    pub fn range_to(&self, other: &Self) -> u32 {
        let dx = (self.x - other.x).unsigned_abs();
        let dy = (self.y - other.y).unsigned_abs();
        dx.max(dy)
    }

    pub fn in_range_to(&self, other: &Self, range: u32) -> bool {
        self.range_to(other) <= range
    }

    pub fn is_near_to(&self, other: &Self) -> bool {
        self.in_range_to(other, 1)
    }

    pub fn room(&self) -> RoomCoord {
        RoomCoord {
            x: self.x.div_euclid(ROOM_SIZE),
            y: self.y.div_euclid(ROOM_SIZE),
        }
    }

    /// The eight surrounding tiles
    pub fn neighbors(&self) -> impl Iterator<Item = Position> + '_ {
        (-1..=1).flat_map(move |dx| {
            (-1..=1).filter_map(move |dy| {
                if dx == 0 && dy == 0 {
                    None
                } else {
                    Some(Position::new(self.x + dx, self.y + dy))
                }
            })
        })
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Agent role, used by scheduling decisions that depend on what an agent is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Queen,
    Manager,
    Worker,
    Drone,
    Miner,
    Upgrader,
    Transporter,
    Pioneer,
}
