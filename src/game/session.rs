//! Session lifecycle: player creation, intent application and removal

use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::GameConfig;
use crate::ws::protocol::ClientAction;

use super::world::{OutboundTx, Player, Projectile, World};
use super::GameError;

/// Result of applying one client action
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionOutcome {
    pub moved: bool,
    pub fired: Option<Uuid>,
}

/// Entry point for per-connection tasks into the world
#[derive(Clone)]
pub struct SessionManager {
    world: Arc<World>,
    config: GameConfig,
}

impl SessionManager {
    pub fn new(world: Arc<World>, config: GameConfig) -> Self {
        Self { world, config }
    }

    pub fn world(&self) -> &Arc<World> {
        &self.world
    }

    /// Register a new player at the spawn point
    pub fn on_connect(&self, outbound: OutboundTx) -> Result<Uuid, GameError> {
        let player_id = Uuid::new_v4();
        let player = Player::new(player_id, self.config.spawn_x, self.config.spawn_y, outbound);
        let player_count = self.world.with_lock(|state| {
            state.insert_player(player)?;
            Ok::<_, GameError>(state.players.len())
        })?;

        info!(player_id = %player_id, player_count, "Player connected");
        Ok(player_id)
    }

    pub fn on_message(&self, player_id: Uuid, action: &ClientAction) -> ActionOutcome {
        self.on_message_at(player_id, action, Instant::now())
    }

    /// Apply a decoded action.
    ///
    /// The move sets the position outright. The shot spawns from the position
    /// after the move. Liveness is not checked here: dead players keep moving and
    /// firing until the round resets. Actions for a player that is no longer
    /// registered are dropped.
    pub fn on_message_at(&self, player_id: Uuid, action: &ClientAction, now: Instant) -> ActionOutcome {
        let config = &self.config;
        self.world.with_lock(|state| {
            let mut outcome = ActionOutcome::default();
            let Some(player) = state.players.get_mut(&player_id) else {
                debug!(player_id = %player_id, "Action for unknown player dropped");
                return outcome;
            };

            if let Some(movement) = action.movement.filter(|m| m.is_action()) {
                player.x = movement.x;
                player.y = movement.y;
                outcome.moved = true;
            }

            if let Some(shoot) = action.shoot.filter(|s| s.is_action()) {
                let projectile = Projectile {
                    id: Uuid::new_v4(),
                    owner: player.id,
                    x: player.x,
                    y: player.y,
                    dx: shoot.dx,
                    dy: shoot.dy,
                    speed: config.projectile_speed,
                    expiry: now + config.projectile_ttl,
                };
                outcome.fired = Some(projectile.id);
                state.projectiles.insert(projectile.id, projectile);
            }

            outcome
        })
    }

    /// Forget the player. Safe to call more than once.
    pub fn on_disconnect(&self, player_id: Uuid) {
        if self.world.remove_player(player_id) {
            info!(player_id = %player_id, "Player disconnected");
        }
    }
}
