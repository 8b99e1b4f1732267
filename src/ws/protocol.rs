//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Movement intent: absolute coordinates, not a delta
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct MoveIntent {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    /// Marks an intentional (0,0) move, which would otherwise read as "no action"
    #[serde(default)]
    pub explicit: bool,
}

impl MoveIntent {
    /// Whether this move should be applied to the player
    pub fn is_action(&self) -> bool {
        self.explicit || self.x != 0.0 || self.y != 0.0
    }
}

/// Fire intent: unnormalized direction vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct ShootIntent {
    #[serde(default)]
    pub dx: f64,
    #[serde(default)]
    pub dy: f64,
}

impl ShootIntent {
    /// A zero direction never fires, there is no presence flag for shots
    pub fn is_action(&self) -> bool {
        self.dx != 0.0 || self.dy != 0.0
    }
}

/// Message sent from client to server
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ClientAction {
    #[serde(default, rename = "move")]
    pub movement: Option<MoveIntent>,
    #[serde(default)]
    pub shoot: Option<ShootIntent>,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ServerMsg {
    /// World state, sent every broadcast tick
    Snapshot(WorldSnapshot),

    /// First message after connect: the assigned player id
    Welcome { id: Uuid },
}

/// Point-in-time copy of the world
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorldSnapshot {
    pub players: BTreeMap<Uuid, PlayerSnapshot>,
    pub projectiles: BTreeMap<Uuid, ProjectileSnapshot>,
    pub round: RoundSnapshot,
}

/// Player state in a snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSnapshot {
    pub id: Uuid,
    pub x: f64,
    pub y: f64,
    pub dead: bool,
}

/// Projectile state in a snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectileSnapshot {
    pub id: Uuid,
    pub owner: Uuid,
    pub x: f64,
    pub y: f64,
    pub dx: f64,
    pub dy: f64,
    pub speed: f64,
}

/// Round phase as seen by clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RoundSnapshot {
    Active,
    RoundEnding { reset_in_ms: u64 },
}
