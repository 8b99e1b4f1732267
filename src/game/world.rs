//! Shared world state and its lock

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

use super::round::RoundState;
use super::GameError;

/// Outbound queue of pre-serialized frames for one session.
/// The session task owns the socket; the world only keeps this handle.
pub type OutboundTx = mpsc::Sender<Arc<str>>;

/// Connected player (authoritative)
#[derive(Debug, Clone)]
pub struct Player {
    pub id: Uuid,
    pub x: f64,
    pub y: f64,
    pub alive: bool,
    pub outbound: OutboundTx,
}

impl Player {
    pub fn new(id: Uuid, x: f64, y: f64, outbound: OutboundTx) -> Self {
        Self {
            id,
            x,
            y,
            alive: true,
            outbound,
        }
    }
}

/// Projectile in flight
#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: Uuid,
    /// Firing player. Lookup only, the owner may already be gone.
    pub owner: Uuid,
    pub x: f64,
    pub y: f64,
    pub dx: f64,
    pub dy: f64,
    pub speed: f64,
    pub expiry: Instant,
}

impl Projectile {
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expiry
    }

    /// Move one physics step along the direction vector
    pub fn advance(&mut self) {
        self.x += self.dx * self.speed;
        self.y += self.dy * self.speed;
    }
}

/// Everything guarded by the world lock
#[derive(Debug, Default)]
pub struct WorldState {
    pub players: HashMap<Uuid, Player>,
    pub projectiles: HashMap<Uuid, Projectile>,
    pub round: RoundState,
}

impl WorldState {
    pub fn insert_player(&mut self, player: Player) -> Result<(), GameError> {
        if self.players.contains_key(&player.id) {
            return Err(GameError::DuplicatePlayer(player.id));
        }
        self.players.insert(player.id, player);
        Ok(())
    }

    pub fn alive_count(&self) -> usize {
        self.players.values().filter(|p| p.alive).count()
    }
}

/// The single shared registry of players and projectiles
#[derive(Debug, Default)]
pub struct World {
    state: Mutex<WorldState>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` with exclusive access to the whole world.
    /// Never await or sleep inside `f`.
    pub fn with_lock<R>(&self, f: impl FnOnce(&mut WorldState) -> R) -> R {
        let mut state = self.state.lock();
        f(&mut state)
    }

    /// Forget a player. Every removal path (disconnect, read failure,
    /// failed broadcast delivery) goes through here. Idempotent.
    pub fn remove_player(&self, player_id: Uuid) -> bool {
        let removed = self.with_lock(|state| state.players.remove(&player_id).is_some());
        if removed {
            debug!(player_id = %player_id, "Player removed from world");
        }
        removed
    }
}
