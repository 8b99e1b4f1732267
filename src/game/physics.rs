//! Projectile physics: movement, expiry and hit resolution on a fixed tick

use std::sync::Arc;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{info, trace};

use crate::config::GameConfig;

use super::combat::{find_target, HitResult};
use super::world::{World, WorldState};

/// What happened during one physics tick
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PhysicsReport {
    pub advanced: usize,
    pub expired: usize,
    pub hits: Vec<HitResult>,
}

/// Advance every projectile one step.
///
/// Each projectile is either expired (removed untouched), or moved once and
/// tested against the living non-owner players. A hit kills the chosen
/// player and consumes the projectile, so it can only be removed once.
pub fn step_projectiles(state: &mut WorldState, config: &GameConfig, now: Instant) -> PhysicsReport {
    let mut report = PhysicsReport::default();
    let WorldState {
        players,
        projectiles,
        ..
    } = state;

    projectiles.retain(|_, projectile| {
        if projectile.is_expired(now) {
            report.expired += 1;
            return false;
        }

        projectile.advance();
        report.advanced += 1;

        match find_target(players, projectile, config.hitbox_half_extent) {
            Some(target_id) => {
                if let Some(target) = players.get_mut(&target_id) {
                    target.alive = false;
                }
                report.hits.push(HitResult {
                    projectile_id: projectile.id,
                    shooter_id: projectile.owner,
                    target_id,
                    x: projectile.x,
                    y: projectile.y,
                });
                false
            }
            None => true,
        }
    });

    report
}

/// Background task driving [`step_projectiles`]
pub struct PhysicsLoop {
    world: Arc<World>,
    config: GameConfig,
}

impl PhysicsLoop {
    pub fn new(world: Arc<World>, config: GameConfig) -> Self {
        Self { world, config }
    }

    /// Run a single tick under the world lock
    pub fn tick(&self, now: Instant) -> PhysicsReport {
        let report = self
            .world
            .with_lock(|state| step_projectiles(state, &self.config, now));

        for hit in &report.hits {
            info!(
                shooter_id = %hit.shooter_id,
                target_id = %hit.target_id,
                projectile_id = %hit.projectile_id,
                x = hit.x,
                y = hit.y,
                "Player hit"
            );
        }
        trace!(
            advanced = report.advanced,
            expired = report.expired,
            "Physics tick"
        );

        report
    }

    /// Tick forever. Never returns; errors inside a tick are not possible.
    pub async fn run(self) {
        info!(
            tick_ms = self.config.tick_interval.as_millis() as u64,
            "Physics loop started"
        );

        let mut tick_interval = interval(self.config.tick_interval);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tick_interval.tick().await;
            self.tick(Instant::now());
        }
    }
}
